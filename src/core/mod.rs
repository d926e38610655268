//! Domain types for valet parking
//!
//! Tickets represent parked vehicles, car requests track their retrieval.
//! These types are what the rest of the crate passes around; the persisted
//! row shapes live in [`crate::storage::rows`].

mod builders;
mod id;
mod pricing;
mod request;
mod ticket;

pub use builders::{CarRequestBuilder, TicketBuilder};
pub use id::{RequestId, TicketId};
pub use pricing::{DEFAULT_TICKET_TYPE, PriceTable};
pub use request::{CarRequest, RequestStatus};
pub use ticket::{NewTicket, PaymentMethod, Ticket, TicketNumber};
