//! Single-flight deploy guard.
//!
//! Two deploys racing on the same record's `version`/`code` fields is the
//! primary correctness hazard of the shared-record design, so a second
//! deploy for the same server is rejected while one is in flight. The permit
//! releases on drop, including on error paths.

use crate::error::{PipelineError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Default)]
pub struct FlightGuard {
    in_flight: Mutex<HashSet<Uuid>>,
}

/// Exclusive right to deploy one server; releases on drop.
pub struct FlightPermit<'a> {
    guard: &'a FlightGuard,
    id: Uuid,
}

impl FlightGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the deploy slot for `id`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DeployInFlight`] when a deploy for `id` is already
    /// running.
    pub fn begin(&self, id: Uuid) -> Result<FlightPermit<'_>> {
        if !self.in_flight.lock().insert(id) {
            return Err(PipelineError::DeployInFlight(id));
        }
        Ok(FlightPermit { guard: self, id })
    }
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.lock().remove(&self.id);
    }
}
