//! Error types for valet-ticket
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`ValetError`] carries the four categories the presentation layer cares
//! about (see [`ErrorKind`]) plus the ambient I/O and configuration failures.

use crate::core::RequestStatus;
use std::fmt;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ValetError>;

/// Why a car request for a ticket was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestConflict {
    /// A request exists and is waiting for a valet
    AlreadyPending,
    /// A valet has accepted the request and is fetching the car
    BeingRetrieved,
    /// The car was already handed back; the ticket is spent
    AlreadyCompleted,
}

impl RequestConflict {
    /// Conflict that corresponds to an existing request in `status`
    #[must_use]
    pub const fn from_status(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => Self::AlreadyPending,
            RequestStatus::Accepted => Self::BeingRetrieved,
            RequestStatus::Completed => Self::AlreadyCompleted,
        }
    }
}

impl fmt::Display for RequestConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadyPending => "the car has already been requested and is waiting for a valet",
            Self::BeingRetrieved => "the car is currently being retrieved",
            Self::AlreadyCompleted => {
                "the car has already been retrieved and cannot be requested again"
            },
        };
        f.write_str(text)
    }
}

/// Coarse error category used by callers to pick a user-facing reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Persistence,
    Validation,
    Config,
}

/// Main error type
#[derive(Error, Debug)]
pub enum ValetError {
    /// No ticket with this number exists in the local snapshot or store
    #[error("Ticket not found: {number}")]
    TicketNotFound { number: String },

    /// No car request matches the given reference
    #[error("Car request not found: {reference}")]
    RequestNotFound { reference: String },

    /// A car request already exists for the ticket
    #[error("Cannot request car for ticket {ticket_number}: {conflict}")]
    RequestConflict {
        ticket_number: String,
        conflict: RequestConflict,
    },

    /// A conditional write found the row in a different state than expected
    #[error("Car request {id} was changed by another session (expected {expected})")]
    StaleRequest { id: String, expected: RequestStatus },

    /// A status change that skips or reverses the pending/accepted/completed order
    #[error("Invalid status transition for request {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: RequestStatus,
        to: RequestStatus,
    },

    /// Malformed input or a persisted row that cannot be interpreted
    #[error("Validation error: {0}")]
    Validation(String),

    /// The persistence gateway failed (transport, constraint, missing table)
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The data directory has not been set up with `valet-ticket init`
    #[error("Valet data directory not initialized")]
    NotInitialized,
}

impl ValetError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TicketNotFound { .. } | Self::RequestNotFound { .. } => ErrorKind::NotFound,
            Self::RequestConflict { .. } | Self::StaleRequest { .. } => ErrorKind::Conflict,
            Self::InvalidTransition { .. } | Self::Validation(_) => ErrorKind::Validation,
            Self::Persistence(_) | Self::Io(_) | Self::Yaml(_) | Self::Json(_) => {
                ErrorKind::Persistence
            },
            Self::Config(_) | Self::NotInitialized => ErrorKind::Config,
        }
    }

    /// Whether re-reading state and trying again may succeed
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StaleRequest { .. } | Self::Persistence(_) | Self::Io(_)
        )
    }

    /// Whether this is a configuration problem
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config)
    }

    /// Message suitable for showing to staff or customers
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::TicketNotFound { number } => {
                format!("Ticket number {number} does not exist.")
            },
            Self::RequestConflict { conflict, .. } => {
                let mut message = conflict.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("{message}.")
            },
            Self::StaleRequest { .. } => {
                "This request was updated by another valet. Refresh and try again.".to_string()
            },
            Self::Persistence(_) | Self::Io(_) | Self::Yaml(_) | Self::Json(_) => {
                format!("The operation failed, please try again. ({self})")
            },
            _ => self.to_string(),
        }
    }

    /// Hints for resolving the error
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TicketNotFound { .. } => vec![
                "Check the ticket number printed on the ticket".to_string(),
                "Run 'valet-ticket list' to see existing tickets".to_string(),
            ],
            Self::NotInitialized => {
                vec!["Run 'valet-ticket init' to create the data directory".to_string()]
            },
            Self::InvalidTransition { .. } => vec![
                "Requests move pending -> accepted -> completed".to_string(),
                "Disable valet.enforce_status_order to allow manual corrections".to_string(),
            ],
            Self::Validation(_) => {
                vec!["Ticket numbers are exactly 5 digits, e.g. 00042".to_string()]
            },
            _ => Vec::new(),
        }
    }
}
