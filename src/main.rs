//! valet-ticket - Valet parking ticketing
//!
//! This is the main entry point for the valet-ticket CLI application.
//! It parses the command line and dispatches to the command handlers.

use clap::Parser;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;
use valet_ticket::cli::handlers::{
    handle_advance, handle_delete, handle_generate, handle_init, handle_list, handle_pay,
    handle_queue, handle_request, handle_revenue, handle_show,
};
use valet_ticket::cli::{Cli, Commands, OutputFormatter};
use valet_ticket::core::RequestStatus;
use valet_ticket::error::{Result, ValetError};

/// Main entry point for the valet-ticket CLI
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configure output formatter based on flags
    let formatter = OutputFormatter::new(cli.json, cli.no_color);
    init_tracing(cli.verbose);

    if let Err(e) = dispatch_command(cli.command, cli.data_dir.as_deref(), &formatter).await {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Install the log subscriber; logs go to stderr so JSON output stays clean
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch_command(
    command: Commands,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    match command {
        Commands::Init { force } => handle_init(data_dir, force, formatter).await,
        Commands::Generate {
            ticket_type,
            instructions,
        } => handle_generate(&ticket_type, instructions, data_dir, formatter).await,
        Commands::Request { ticket_number } => {
            handle_request(&ticket_number, data_dir, formatter).await
        },
        Commands::Queue => handle_queue(data_dir, formatter).await,
        Commands::Accept { ticket_number } => {
            handle_advance(&ticket_number, RequestStatus::Accepted, data_dir, formatter).await
        },
        Commands::Complete { ticket_number } => {
            handle_advance(&ticket_number, RequestStatus::Completed, data_dir, formatter).await
        },
        Commands::Pay {
            ticket_number,
            method,
            unpaid,
        } => handle_pay(&ticket_number, method, unpaid, data_dir, formatter).await,
        Commands::Delete { ticket_number } => {
            handle_delete(&ticket_number, data_dir, formatter).await
        },
        Commands::List { pending, unpaid } => {
            handle_list(pending, unpaid, data_dir, formatter).await
        },
        Commands::Show { ticket_number } => handle_show(&ticket_number, data_dir, formatter).await,
        Commands::Revenue { period } => handle_revenue(period, data_dir, formatter).await,
    }
}

/// Handle errors and display them to the user
///
/// Prints the user-facing message and any suggestions, the error as JSON in
/// JSON mode, and the debug representation when debug logging is on.
fn handle_error(error: &ValetError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        let _ = formatter.json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "error_kind": format!("{:?}", error.kind()),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let _cli = Cli::parse_from(["valet-ticket", "init"]);
        let _cli = Cli::parse_from(["valet-ticket", "list", "--pending"]);
        let _cli = Cli::parse_from(["valet-ticket", "request", "00001"]);
    }
}
