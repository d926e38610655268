//! Local valet state and its synchronisation with the shared store

pub mod core;
pub mod reconcile;
pub mod session;
pub mod snapshot;

pub use self::core::{CoreOptions, QueuedRequest, ValetCore};
pub use self::reconcile::{Followup, Generation, RefetchSequencer};
pub use self::session::ValetSession;
pub use self::snapshot::{StateChange, ValetState};
