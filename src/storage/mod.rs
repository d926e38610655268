//! Storage layer
//!
//! - [`gateway`]: the row-store trait the rest of the crate talks to
//! - [`memory`] and [`file`]: local gateway implementations
//! - [`rows`] and [`format`]: persisted row shapes and their mapping to entities
//! - [`repository`]: typed ticket and car-request repositories

pub mod file;
pub mod format;
pub mod gateway;
pub mod memory;
pub mod repository;
pub mod rows;

pub use file::FileGateway;
pub use gateway::{ChangeEvent, EventType, Filter, PersistenceGateway, Record, Table};
pub use memory::{InMemoryGateway, Tables};
pub use repository::{CarRequestRepository, DEFAULT_COMPANY_NAME, TicketRepository, TicketSummary};
