//! Command-line interface
//!
//! Argument definitions live here; each command is implemented by a
//! handler in [`handlers`].

pub mod handlers;
pub mod output;

pub use output::OutputFormatter;

use crate::core::{DEFAULT_TICKET_TYPE, PaymentMethod};
use crate::revenue::Period;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Valet parking tickets and car retrieval requests
#[derive(Parser, Debug)]
#[command(name = "valet-ticket", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the table files and valet.toml
    #[arg(short = 'd', long, global = true, env = "VALET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default configuration
    Init {
        /// Reset the table files even if they already exist
        #[arg(short, long)]
        force: bool,
    },

    /// Issue a new ticket with the next number
    Generate {
        /// Ticket type; sets the price
        #[arg(short = 't', long = "type", default_value = DEFAULT_TICKET_TYPE)]
        ticket_type: String,

        /// Notes for the valet, e.g. where the keys are
        #[arg(short, long)]
        instructions: Option<String>,
    },

    /// Ask for the car parked under a ticket
    Request {
        /// Ticket number, e.g. 00042
        ticket_number: String,
    },

    /// Pending car requests, oldest first
    Queue,

    /// Accept the open request for a ticket
    Accept { ticket_number: String },

    /// Mark the car for a ticket as handed over
    Complete { ticket_number: String },

    /// Record payment for a ticket
    Pay {
        ticket_number: String,

        /// Payment method (cash or visa)
        #[arg(short, long, default_value = "cash")]
        method: PaymentMethod,

        /// Mark the ticket unpaid again
        #[arg(long)]
        unpaid: bool,
    },

    /// Delete a ticket and its car requests
    Delete { ticket_number: String },

    /// List tickets
    List {
        /// Only tickets with a pending car request
        #[arg(short, long)]
        pending: bool,

        /// Only unpaid tickets
        #[arg(short, long)]
        unpaid: bool,
    },

    /// Show a ticket and its car request
    Show { ticket_number: String },

    /// Revenue over paid tickets
    Revenue {
        #[arg(short, long, value_enum, default_value_t = Period::Today)]
        period: Period,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["valet-ticket", "generate", "--type", "vip"]);
        assert!(matches!(
            cli.command,
            Commands::Generate { ref ticket_type, instructions: None } if ticket_type == "vip"
        ));

        let cli = Cli::parse_from(["valet-ticket", "queue"]);
        assert!(matches!(cli.command, Commands::Queue));

        let cli = Cli::parse_from(["valet-ticket", "--json", "pay", "00001", "-m", "visa"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Pay {
                method: PaymentMethod::Visa,
                unpaid: false,
                ..
            }
        ));

        let cli = Cli::parse_from(["valet-ticket", "revenue", "--period", "month"]);
        assert!(matches!(cli.command, Commands::Revenue { period: Period::Month }));
    }

    #[test]
    fn test_cli_rejects_unknown_payment_method() {
        let result = Cli::try_parse_from(["valet-ticket", "pay", "00001", "--method", "cheque"]);
        assert!(result.is_err());
    }
}
