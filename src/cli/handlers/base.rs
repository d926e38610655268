//! Base handler utilities for common operations
//!
//! Every command that touches tickets goes through [`HandlerContext`], which
//! loads configuration, opens the data directory and fills the state core.

use crate::cli::output::OutputFormatter;
use crate::config::Config;
use crate::core::{CarRequest, Ticket, TicketNumber};
use crate::error::{Result, ValetError};
use crate::state::ValetCore;
use crate::storage::FileGateway;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Context for handler operations
pub struct HandlerContext {
    pub data_dir: PathBuf,
    pub core: ValetCore,
    pub formatter: OutputFormatter,
}

impl HandlerContext {
    /// Open an initialized data directory and load its tickets and requests
    pub async fn new(data_dir: Option<&Path>, formatter: OutputFormatter) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let data_dir = config.data_dir(data_dir);
        let gateway = FileGateway::open(&data_dir).await?;

        let core = ValetCore::new(Arc::new(gateway), config.core_options());
        core.load().await?;
        tracing::debug!("Opened valet data at {}", data_dir.display());

        Ok(Self {
            data_dir,
            core,
            formatter,
        })
    }

    /// Look up a ticket by its number
    pub async fn ticket(&self, ticket_number: &str) -> Result<Ticket> {
        let number = TicketNumber::parse(ticket_number)?;
        self.core
            .get_ticket_by_number(number.as_str())
            .await
            .ok_or_else(|| ValetError::TicketNotFound {
                number: number.to_string(),
            })
    }

    /// The pending or accepted request for a ticket
    pub async fn open_request(&self, ticket: &Ticket) -> Result<CarRequest> {
        self.core
            .get_request_by_ticket_id(&ticket.id)
            .await
            .ok_or_else(|| ValetError::RequestNotFound {
                reference: format!("open request for ticket {}", ticket.ticket_number),
            })
    }

    pub fn success(&self, message: &str) {
        self.formatter.success(message);
    }

    pub fn info(&self, message: &str) {
        self.formatter.info(message);
    }

    pub fn warning(&self, message: &str) {
        self.formatter.warning(message);
    }
}
