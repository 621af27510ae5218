//! Init command - first-run setup and connectivity checks.

use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub async fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Finna Setup");
    println!();
    println!("Welcome to Finna! Let's make sure everything is configured correctly.\n");

    // Step 1: API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Finna requires an OpenAI API key for embeddings and query expansion.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'finna init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: vector store connectivity
    println!("{}", style("Step 2: Checking vector store").bold().cyan());
    println!();

    match AppContext::new(settings.clone()).await {
        Ok(_) => {
            Output::success(&format!(
                "Vector store is reachable ({} provider), collections are ready.",
                settings.vector_store.provider
            ));
        }
        Err(e) => {
            Output::warning(&format!("Could not reach the vector store: {}", e));
            println!();
            println!(
                "  Check the [vector_store] section of your config. For a local Qdrant:"
            );
            println!(
                "  {}",
                style("docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant").green()
            );
        }
    }

    println!();

    // Step 3: config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("finna config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Start the API server", style("finna serve").cyan());
    println!("  {} Search your sessions", style("finna search \"<query>\"").cyan());
    println!("  {} See what's tracked", style("finna list").cyan());
    println!();
    println!("For more help: {}", style("finna --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
