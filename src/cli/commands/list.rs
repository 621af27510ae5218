//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;

    match context.sessions.list().await {
        Ok(mut sessions) => {
            if sessions.is_empty() {
                Output::info("No sessions yet. Create one via POST /sessions.");
            } else {
                sessions.sort_by(|a, b| b.1.upvotes.cmp(&a.1.upvotes));

                Output::header(&format!("Tracked Sessions ({})", sessions.len()));
                println!();

                for (id, record) in &sessions {
                    Output::session_info(
                        &record.title,
                        id,
                        &record.status.to_string(),
                        record.upvotes,
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sessions: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
