//! The stage-ordered pipeline runner.
//!
//! One [`Pipeline`] owns every stage and the record store. Stages run
//! sequentially per attempt; each drives exactly one status transition. A
//! failing stage transitions the record to `failed` and surfaces the error
//! unchanged; nothing in here retries silently.

use crate::docs;
use crate::error::{PipelineError, Result};
use crate::flight::FlightGuard;
use crate::server::GeneratedServer;
use crate::status::ServerStatus;
use crate::store::ServerStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolforge_codegen::CodeGenerator;
use toolforge_deploy::Deployer;
use toolforge_scanner::{AuditAction, AuditTrail, ScanPolicy, ScanResult, sanitize_project, scan_project};
use toolforge_source::SourceNormalizer;
use toolforge_types::SourceDescriptor;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct Pipeline {
    store: Arc<ServerStore>,
    normalizer: SourceNormalizer,
    generator: Arc<CodeGenerator>,
    deployer: Deployer,
    audit: AuditTrail,
    flight: FlightGuard,
    scan_policy: ScanPolicy,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        normalizer: SourceNormalizer,
        generator: Arc<CodeGenerator>,
        deployer: Deployer,
        scan_policy: ScanPolicy,
    ) -> Self {
        Self {
            store: Arc::new(ServerStore::new()),
            normalizer,
            generator,
            deployer,
            audit: AuditTrail::new(),
            flight: FlightGuard::new(),
            scan_policy,
        }
    }

    #[must_use]
    pub fn store(&self) -> &ServerStore {
        &self.store
    }

    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Creates a record in `analyzing` and returns it.
    pub fn create(
        &self,
        owner: &str,
        name: &str,
        source: SourceDescriptor,
    ) -> GeneratedServer {
        let server = GeneratedServer::new(owner, name, source);
        info!(id = %server.id, slug = server.slug, kind = %server.source_kind(), "server created");
        let snapshot = server.clone();
        self.store.insert(server);
        snapshot
    }

    /// Runs normalization and generation for one attempt:
    /// `analyzing → generating → draft` (or `draft`/`deployed`/`failed` →
    /// `generating → draft` for a fresh attempt).
    ///
    /// # Errors
    ///
    /// Stage errors propagate unchanged after transitioning the record to
    /// `failed`.
    pub async fn generate(&self, id: Uuid) -> Result<GeneratedServer> {
        let server = self.store.get(id)?;
        let kind = server.source_kind();

        let normalized = match self.normalizer.normalize(&server.source).await {
            Ok(normalized) => normalized,
            Err(e) => return Err(self.fail(id, e.into())),
        };

        self.store.update(id, |s| {
            s.transition(ServerStatus::Generating)?;
            if s.name.is_empty() || s.name == s.slug {
                s.name = normalized.name.clone();
                s.slug = toolforge_types::slugify(&normalized.name);
            }
            if s.description.is_empty() {
                s.description = normalized.description.clone();
            }
            s.source_content = serde_json::to_string(&normalized).ok();
            Ok(())
        })?;

        let output = match self.generator.generate(&normalized, kind).await {
            Ok(output) => output,
            Err(e) => return Err(self.fail(id, e.into())),
        };

        let server = self.store.update(id, |s| {
            s.replace_code(output.files, output.tools);
            s.transition(ServerStatus::Draft)
        })?;
        info!(id = %id, version = server.version, files = server.code.len(), "draft generated");
        Ok(server)
    }

    /// Scans the current draft, stores the verdict, and records an audit
    /// entry. Scanning never changes status.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] for unknown ids.
    pub fn scan(&self, id: Uuid, actor: &str) -> Result<ScanResult> {
        let server = self.store.get(id)?;
        let result = scan_project(&server.code, &self.scan_policy);
        self.audit
            .record(&server.slug, actor, AuditAction::Scan, result.clone(), None);
        self.store.update(id, |s| {
            s.last_scan = Some(result.clone());
            Ok(())
        })?;
        Ok(result)
    }

    /// Redacts critical lines in place and re-scans.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`], or [`PipelineError::SecurityGate`] when
    /// no scan exists to sanitize against.
    pub fn sanitize(&self, id: Uuid, actor: &str) -> Result<ScanResult> {
        let server = self.store.get(id)?;
        let Some(last) = server.last_scan else {
            return Err(PipelineError::SecurityGate {
                reason: "nothing to sanitize: no scan result on record".to_string(),
            });
        };

        let sanitized = sanitize_project(&server.code, &last);
        self.audit.record(
            &server.slug,
            actor,
            AuditAction::Sanitize,
            last,
            Some(serde_json::json!({"files": sanitized.len()})),
        );

        let rescan = scan_project(&sanitized, &self.scan_policy);
        self.store.update(id, |s| {
            s.code = sanitized;
            s.last_scan = Some(rescan.clone());
            Ok(())
        })?;
        Ok(rescan)
    }

    /// Records a reviewer's approval of the latest scan.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`], or [`PipelineError::SecurityGate`] when
    /// there is no scan to approve.
    pub fn approve(&self, id: Uuid, actor: &str) -> Result<()> {
        self.review(id, actor, AuditAction::Approve)
    }

    /// Records a reviewer's rejection of the latest scan.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::approve`].
    pub fn reject(&self, id: Uuid, actor: &str) -> Result<()> {
        self.review(id, actor, AuditAction::Reject)
    }

    fn review(&self, id: Uuid, actor: &str, action: AuditAction) -> Result<()> {
        let server = self.store.get(id)?;
        let Some(scan) = server.last_scan else {
            return Err(PipelineError::SecurityGate {
                reason: "no scan result on record".to_string(),
            });
        };
        self.audit.record(&server.slug, actor, action, scan, None);
        Ok(())
    }

    /// Deploys the current draft: `draft → deploying → deployed`.
    ///
    /// Single-flight per server; requires the latest scan to have passed. A
    /// gate refusal leaves the record in `draft`; a deployment failure
    /// transitions it to `failed`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DeployInFlight`], [`PipelineError::SecurityGate`],
    /// or the deployment error after the `failed` transition.
    pub async fn deploy(
        &self,
        id: Uuid,
        env: &BTreeMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<GeneratedServer> {
        let _permit = self.flight.begin(id)?;

        let server = self.store.get(id)?;
        match &server.last_scan {
            Some(scan) if scan.passed => {}
            Some(scan) => {
                return Err(PipelineError::SecurityGate {
                    reason: format!(
                        "latest scan failed with score {} ({} issues); re-scan or sanitize first",
                        scan.score,
                        scan.issues.len()
                    ),
                });
            }
            None => {
                return Err(PipelineError::SecurityGate {
                    reason: "no scan result on record; scan the draft first".to_string(),
                });
            }
        }

        self.store.transition(id, ServerStatus::Deploying)?;

        let record = match self
            .deployer
            .deploy(&server.slug, &server.code, env, cancel)
            .await
        {
            Ok(record) => record,
            Err(e) => return Err(self.fail(id, e.into())),
        };

        self.store.update(id, |s| {
            s.deployment_url = Some(record.url.clone());
            s.transition(ServerStatus::Deployed)
        })?;
        info!(id = %id, url = record.url, "server deployed");

        // Best-effort; never reverts a deployed status.
        docs::write_docs_best_effort(&self.generator, &self.store, id).await;

        self.store.get(id)
    }

    /// Transitions to `failed` and hands the stage error back.
    fn fail(&self, id: Uuid, e: PipelineError) -> PipelineError {
        error!(id = %id, error = %e, "pipeline stage failed");
        if let Err(transition_err) = self.store.transition(id, ServerStatus::Failed) {
            warn!(id = %id, error = %transition_err, "could not mark server failed");
        }
        e
    }
}
