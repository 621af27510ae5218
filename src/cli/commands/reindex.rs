//! Reindex command implementation.
//!
//! Unlike completion-triggered indexing, a manual reindex surfaces failures
//! directly so the operator can see them.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use anyhow::Result;

/// Run the reindex command.
pub async fn run_reindex(session_id: &str, settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;

    match context.indexer.index_session(session_id).await {
        Ok(count) => {
            Output::success(&format!(
                "Indexed {} chunks for session {}",
                count, session_id
            ));
        }
        Err(e) => {
            Output::error(&format!("Reindex failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
