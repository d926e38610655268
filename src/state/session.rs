//! Live subscription loop for one [`ValetCore`]

use super::core::ValetCore;
use crate::error::Result;
use crate::storage::{ChangeEvent, Table};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// A running session: the core plus the task that feeds it change events
///
/// Dropping the session stops the task.
pub struct ValetSession {
    core: Arc<ValetCore>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ValetSession {
    /// Subscribe to both tables, then load the initial snapshot
    ///
    /// Subscribing first means no change between the load and the first
    /// event can be missed.
    pub async fn open(core: Arc<ValetCore>) -> Result<Self> {
        let session = Self::start(core);
        session.core.load().await?;
        Ok(session)
    }

    /// Start consuming change events without an initial load
    pub fn start(core: Arc<ValetCore>) -> Self {
        let tickets = core.gateway().subscribe(Table::Tickets);
        let requests = core.gateway().subscribe(Table::CarRequests);
        let (shutdown, stop) = oneshot::channel();
        let task = tokio::spawn(run(core.clone(), tickets, requests, stop));

        Self {
            core,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    pub const fn core(&self) -> &Arc<ValetCore> {
        &self.core
    }

    /// Stop the subscription task and wait for it to finish
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Session task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ValetSession {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn run(
    core: Arc<ValetCore>,
    mut tickets: broadcast::Receiver<ChangeEvent>,
    mut requests: broadcast::Receiver<ChangeEvent>,
    mut stop: oneshot::Receiver<()>,
) {
    tracing::debug!("Session subscribed to change feeds");
    loop {
        let keep_going = tokio::select! {
            biased;
            _ = &mut stop => false,
            received = tickets.recv() => dispatch(&core, Table::Tickets, received).await,
            received = requests.recv() => dispatch(&core, Table::CarRequests, received).await,
        };
        if !keep_going {
            break;
        }
    }
    tracing::debug!("Session stopped");
}

/// Feed one received item to the core; `false` once the feed is gone
async fn dispatch(
    core: &ValetCore,
    table: Table,
    received: std::result::Result<ChangeEvent, RecvError>,
) -> bool {
    match received {
        Ok(event) => {
            // Failures are logged by the core; the next event refetches again
            let _ = core.handle_change(&event).await;
            true
        },
        Err(RecvError::Lagged(missed)) => {
            tracing::warn!("Missed {} {} events, refetching", missed, table);
            let _ = core.refresh(table).await;
            true
        },
        Err(RecvError::Closed) => {
            tracing::debug!("{} change feed closed", table);
            false
        },
    }
}
