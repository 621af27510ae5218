//! CLI output formatting utilities.

use console::style;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a session line.
    pub fn session_info(title: &str, id: &str, status: &str, upvotes: u64) {
        println!(
            "  {} {} ({}, {}, {} upvotes)",
            style("*").cyan(),
            style(title).bold(),
            style(id).dim(),
            status,
            upvotes
        );
    }

    /// Print a search result.
    pub fn search_result(title: &str, upvotes: u64, excerpt: &str, link: &str) {
        println!(
            "\n{} {} ({} upvotes)",
            style(">>").green(),
            style(title).bold(),
            upvotes
        );
        println!("   {}", excerpt.replace('\n', " "));
        println!("   {}", style(link).dim());
    }
}
