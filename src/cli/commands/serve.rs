//! Serve command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use crate::server;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let context = Arc::new(AppContext::new(settings).await?);

    Output::header("Finna API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET   /health");
    Output::kv("Create Session", "POST  /sessions");
    Output::kv("List Sessions", "GET   /sessions");
    Output::kv("Get Session", "GET   /sessions/:id");
    Output::kv("Append Transcript", "PATCH /sessions/:id/transcript");
    Output::kv("Complete Session", "POST  /sessions/:id/complete");
    Output::kv("Upvote", "POST  /sessions/:id/upvote");
    Output::kv("Search", "POST  /search");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(host, port, context).await
}
