//! In-process server record store.
//!
//! Each stage performs one atomic replace through [`ServerStore::update`];
//! partial, interleaved writes across stages cannot happen because the whole
//! closure runs under the write lock.

use crate::error::{PipelineError, Result};
use crate::server::GeneratedServer;
use crate::status::ServerStatus;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct ServerStore {
    inner: RwLock<HashMap<Uuid, GeneratedServer>>,
}

impl ServerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, server: GeneratedServer) -> Uuid {
        let id = server.id;
        self.inner.write().insert(id, server);
        id
    }

    /// Snapshot of one record.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] for unknown ids.
    pub fn get(&self, id: Uuid) -> Result<GeneratedServer> {
        self.inner
            .read()
            .get(&id)
            .cloned()
            .ok_or(PipelineError::NotFound(id))
    }

    /// Applies one atomic mutation and returns the updated snapshot.
    ///
    /// The closure may fail (illegal transition, gate violation); failing
    /// closures must not mutate before erroring, and every caller in this
    /// crate validates first.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] for unknown ids, or whatever the closure
    /// returns.
    pub fn update<F>(&self, id: Uuid, mutate: F) -> Result<GeneratedServer>
    where
        F: FnOnce(&mut GeneratedServer) -> Result<()>,
    {
        let mut inner = self.inner.write();
        let server = inner.get_mut(&id).ok_or(PipelineError::NotFound(id))?;
        mutate(server)?;
        Ok(server.clone())
    }

    /// Status-only update through the transition table.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] or [`PipelineError::InvalidTransition`].
    pub fn transition(&self, id: Uuid, to: ServerStatus) -> Result<GeneratedServer> {
        self.update(id, |server| server.transition(to))
    }

    #[must_use]
    pub fn list(&self) -> Vec<GeneratedServer> {
        let mut servers: Vec<_> = self.inner.read().values().cloned().collect();
        servers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        servers
    }
}
