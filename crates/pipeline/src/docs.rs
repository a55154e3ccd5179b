//! Best-effort documentation generation after a successful deployment.

use crate::store::ServerStore;
use toolforge_codegen::CodeGenerator;
use tracing::{debug, warn};
use uuid::Uuid;

/// Asks the model for user-facing documentation and stores it on the record.
/// Failures are logged and swallowed; the record stays `deployed`.
pub(crate) async fn write_docs_best_effort(
    generator: &CodeGenerator,
    store: &ServerStore,
    id: Uuid,
) {
    let Ok(server) = store.get(id) else {
        return;
    };

    match generator
        .write_server_docs(&server.name, &server.description, &server.tools)
        .await
    {
        Ok(markdown) => {
            let stored = store.update(id, |s| {
                s.documentation = Some(markdown);
                Ok(())
            });
            if let Err(e) = stored {
                warn!(id = %id, error = %e, "documentation written but not stored");
            } else {
                debug!(id = %id, "documentation generated");
            }
        }
        Err(e) => {
            warn!(id = %id, error = %e, "documentation generation failed; continuing");
        }
    }
}
