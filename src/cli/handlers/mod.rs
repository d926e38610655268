//! Command handlers

mod base;
mod init;
mod requests;
mod revenue;
mod tickets;

pub use base::HandlerContext;
pub use init::handle_init;
pub use requests::{handle_advance, handle_queue, handle_request};
pub use revenue::handle_revenue;
pub use tickets::{handle_delete, handle_generate, handle_list, handle_pay, handle_show};
