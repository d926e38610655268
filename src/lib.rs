//! valet-ticket - Valet parking tickets and car retrieval requests
//!
//! This crate provides the state core of a valet parking service:
//! - Ticket issuing with sequential zero-padded numbers and a price table
//! - Car retrieval requests moving pending, accepted, completed
//! - Payment tracking and revenue reports
//! - Several sessions sharing one store, kept in sync by change events
//!
//! # Synchronisation
//!
//! Each session owns a [`state::ValetCore`] holding a local snapshot of both
//! tables. Local actions write to the store first and update the snapshot on
//! success. Every change event from the store triggers a full refetch of the
//! affected table, so all sessions converge on the store's contents.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use valet_ticket::state::{CoreOptions, ValetCore, ValetSession};
//! use valet_ticket::storage::InMemoryGateway;
//!
//! let gateway = Arc::new(InMemoryGateway::new());
//! let session = ValetSession::open(Arc::new(ValetCore::new(gateway, CoreOptions::default()))).await?;
//!
//! let ticket = session.core().generate_ticket("STANDARD", None).await?;
//! session.core().request_car(ticket.ticket_number.as_str()).await?;
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod notifications;
pub mod revenue;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{Result, ValetError};
