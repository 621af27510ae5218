//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, category: Option<&str>, settings: Settings) -> Result<()> {
    let context = AppContext::new(settings).await?;

    match context.ranker.search(query, category).await {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for hit in &results {
                    Output::search_result(&hit.title, hit.upvotes, &hit.excerpt, &hit.link);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
