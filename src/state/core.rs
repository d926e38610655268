//! The valet state core
//!
//! [`ValetCore`] owns the local snapshot and is the only thing that changes
//! it. Local actions write through the repositories first and touch the
//! snapshot only on success. Change events from other sessions are folded in
//! by [`ValetCore::handle_change`].

use super::reconcile::{AppliedGenerations, Followup, Generation, RefetchSequencer, followup_for};
use super::snapshot::{StateChange, ValetState};
use crate::core::{
    CarRequest, NewTicket, PaymentMethod, PriceTable, RequestId, RequestStatus, Ticket, TicketId,
    TicketNumber, DEFAULT_TICKET_TYPE,
};
use crate::error::{RequestConflict, Result, ValetError};
use crate::notifications::{Notification, NotificationOptions, Notifier};
use crate::storage::{
    CarRequestRepository, ChangeEvent, PersistenceGateway, Table, TicketRepository, TicketSummary,
    DEFAULT_COMPANY_NAME,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

/// Behaviour switches for a [`ValetCore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreOptions {
    /// Printed on generated tickets
    pub company_name: String,
    pub prices: PriceTable,
    /// Only allow pending -> accepted -> completed, with conditional writes
    pub enforce_status_order: bool,
    pub notifications: NotificationOptions,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            prices: PriceTable::default(),
            enforce_status_order: false,
            notifications: NotificationOptions::default(),
        }
    }
}

/// A pending request with the number and price of its ticket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedRequest {
    #[serde(flatten)]
    pub request: CarRequest,
    /// `None` once the ticket row is gone
    pub ticket: Option<TicketSummary>,
}

#[derive(Debug, Default)]
struct Shared {
    state: ValetState,
    applied: AppliedGenerations,
}

/// Snapshot owner and action entry point for one session
pub struct ValetCore {
    gateway: Arc<dyn PersistenceGateway>,
    tickets: TicketRepository,
    requests: CarRequestRepository,
    shared: Arc<RwLock<Shared>>,
    actions: Mutex<()>,
    sequencer: RefetchSequencer,
    notifier: Notifier,
    options: CoreOptions,
}

impl std::fmt::Debug for ValetCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValetCore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ValetCore {
    /// Create a core with an empty snapshot; call [`Self::load`] to fill it
    pub fn new(gateway: Arc<dyn PersistenceGateway>, options: CoreOptions) -> Self {
        Self {
            tickets: TicketRepository::new(gateway.clone()),
            requests: CarRequestRepository::new(gateway.clone()),
            gateway,
            shared: Arc::new(RwLock::new(Shared::default())),
            actions: Mutex::new(()),
            sequencer: RefetchSequencer::default(),
            notifier: Notifier::new(options.notifications),
            options,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }

    pub const fn ticket_repository(&self) -> &TicketRepository {
        &self.tickets
    }

    /// Receive notifications raised by reconciliation
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Owned copy of the current snapshot
    pub async fn snapshot(&self) -> ValetState {
        self.shared.read().await.state.clone()
    }

    /// Fetch both tables
    ///
    /// Each table is tried even if the other fails; the first error is returned.
    pub async fn load(&self) -> Result<()> {
        let tickets = self.refresh(Table::Tickets).await;
        let requests = self.refresh(Table::CarRequests).await;
        tickets.and(requests).map(|_| ())
    }

    /// Issue the next ticket number at the configured price for `ticket_type`
    ///
    /// The type is stored as given; only a blank type becomes
    /// [`DEFAULT_TICKET_TYPE`]. Price lookup ignores case.
    pub async fn generate_ticket(
        &self,
        ticket_type: &str,
        instructions: Option<String>,
    ) -> Result<Ticket> {
        let _guard = self.actions.lock().await;

        let ticket_type = match ticket_type.trim() {
            "" => DEFAULT_TICKET_TYPE.to_string(),
            given => given.to_string(),
        };
        let ticket_number = self.shared.read().await.state.next_ticket_number();
        let new_ticket = NewTicket {
            price: self.options.prices.price_for(&ticket_type),
            ticket_number,
            ticket_type,
            instructions: instructions.filter(|text| !text.trim().is_empty()),
            company_name: Some(self.options.company_name.clone()),
        };

        let ticket = self
            .tickets
            .create(new_ticket)
            .await
            .inspect_err(|e| tracing::error!("Failed to create ticket: {}", e))?;

        self.apply(StateChange::AddTicket(ticket.clone())).await;
        tracing::info!(
            "Generated ticket {} ({}, {})",
            ticket.ticket_number,
            ticket.ticket_type.as_deref().unwrap_or(DEFAULT_TICKET_TYPE),
            ticket.price
        );
        Ok(ticket)
    }

    /// Ask for the car parked under `ticket_number`
    ///
    /// A ticket can be requested once. Any existing request, even a completed
    /// one, is a conflict.
    pub async fn request_car(&self, ticket_number: &str) -> Result<CarRequest> {
        let number = TicketNumber::parse(ticket_number)
            .inspect_err(|e| tracing::warn!("Rejected car request: {}", e))?;
        let _guard = self.actions.lock().await;

        let ticket_id = {
            let shared = self.shared.read().await;
            let ticket = shared
                .state
                .ticket_by_number(number.as_str())
                .ok_or_else(|| ValetError::TicketNotFound {
                    number: number.to_string(),
                })?;
            if let Some(existing) = shared.state.request_for_ticket(&ticket.id) {
                tracing::warn!(
                    "Ticket {} already has a {} request",
                    number,
                    existing.status
                );
                return Err(ValetError::RequestConflict {
                    ticket_number: number.to_string(),
                    conflict: RequestConflict::from_status(existing.status),
                });
            }
            ticket.id
        };

        let request = self
            .requests
            .create(&ticket_id)
            .await
            .inspect_err(|e| tracing::error!("Failed to create car request: {}", e))?;

        self.apply(StateChange::AddRequest(request.clone())).await;
        tracing::info!("Car requested for ticket {}", number);
        Ok(request)
    }

    /// Ask for a car, checking the shared store instead of the snapshot
    ///
    /// For callers whose snapshot may be behind other sessions. The ticket is
    /// looked up by number and rechecked by id. Any stored request for it is a
    /// conflict; the most active one decides which.
    pub async fn submit_request(&self, ticket_number: &str) -> Result<CarRequest> {
        let number = TicketNumber::parse(ticket_number)
            .inspect_err(|e| tracing::warn!("Rejected car request: {}", e))?;
        let _guard = self.actions.lock().await;
        let not_found = || ValetError::TicketNotFound {
            number: number.to_string(),
        };

        let ticket = self
            .tickets
            .fetch_by_number(&number)
            .await?
            .ok_or_else(not_found)?;

        if !self.tickets.exists(&ticket.id).await? {
            tracing::warn!("Ticket {} was deleted during lookup", number);
            return Err(not_found());
        }

        let existing = self.requests.fetch_by_ticket(&ticket.id).await?;
        if let Some(status) = existing.iter().map(|r| r.status).min() {
            tracing::warn!("Ticket {} already has a {} request", number, status);
            return Err(ValetError::RequestConflict {
                ticket_number: number.to_string(),
                conflict: RequestConflict::from_status(status),
            });
        }

        let request = self
            .requests
            .create(&ticket.id)
            .await
            .inspect_err(|e| tracing::error!("Failed to create car request: {}", e))?;

        {
            let mut shared = self.shared.write().await;
            if shared.state.ticket_by_id(&ticket.id).is_none() {
                shared.state.apply(StateChange::AddTicket(ticket));
            }
            shared.state.apply(StateChange::AddRequest(request.clone()));
        }
        tracing::info!("Car requested for ticket {}", number);
        Ok(request)
    }

    /// Move a request to `status`
    pub async fn update_request_status(&self, id: &RequestId, status: RequestStatus) -> Result<()> {
        let _guard = self.actions.lock().await;

        let written = if self.options.enforce_status_order {
            let current = self
                .shared
                .read()
                .await
                .state
                .request_by_id(id)
                .map(|r| r.status)
                .ok_or_else(|| ValetError::RequestNotFound {
                    reference: id.to_string(),
                })?;
            if !current.can_advance_to(status) {
                return Err(ValetError::InvalidTransition {
                    id: id.to_string(),
                    from: current,
                    to: status,
                });
            }
            self.requests.update_status_from(id, current, status).await
        } else {
            self.requests.update_status(id, status).await
        };
        written.inspect_err(|e| tracing::error!("Failed to update request {}: {}", id, e))?;

        self.apply(StateChange::UpdateRequestStatus { id: *id, status })
            .await;
        tracing::info!("Request {} is now {}", id.short(), status);
        Ok(())
    }

    /// A valet takes the request
    pub async fn accept_request(&self, id: &RequestId) -> Result<()> {
        self.update_request_status(id, RequestStatus::Accepted).await
    }

    /// The car has been handed over
    pub async fn complete_request(&self, id: &RequestId) -> Result<()> {
        self.update_request_status(id, RequestStatus::Completed).await
    }

    /// Record payment for a ticket
    pub async fn update_payment_status(
        &self,
        ticket_id: &TicketId,
        is_paid: bool,
        method: Option<PaymentMethod>,
    ) -> Result<()> {
        let _guard = self.actions.lock().await;

        self.tickets
            .update_payment(ticket_id, is_paid, method)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to update payment for ticket {}: {}", ticket_id, e);
            })?;

        self.apply(StateChange::UpdatePayment {
            ticket_id: *ticket_id,
            is_paid,
            method,
        })
        .await;
        tracing::info!(
            "Ticket {} marked {}",
            ticket_id.short(),
            if is_paid { "paid" } else { "unpaid" }
        );
        Ok(())
    }

    /// Delete a ticket and its requests
    pub async fn delete_ticket(&self, ticket_id: &TicketId) -> Result<()> {
        let _guard = self.actions.lock().await;
        tracing::debug!("Deleting ticket {}", ticket_id);

        self.tickets
            .delete(ticket_id)
            .await
            .inspect_err(|e| tracing::error!("Failed to delete ticket {}: {}", ticket_id, e))?;

        self.apply(StateChange::RemoveTicket(*ticket_id)).await;
        tracing::info!("Deleted ticket {}", ticket_id.short());
        Ok(())
    }

    pub async fn get_ticket_by_number(&self, ticket_number: &str) -> Option<Ticket> {
        self.shared
            .read()
            .await
            .state
            .ticket_by_number(ticket_number)
            .cloned()
    }

    /// The pending or accepted request for a ticket
    pub async fn get_request_by_ticket_id(&self, ticket_id: &TicketId) -> Option<CarRequest> {
        self.shared
            .read()
            .await
            .state
            .active_request_for_ticket(ticket_id)
            .cloned()
    }

    pub async fn get_pending_requests(&self) -> Vec<CarRequest> {
        self.shared
            .read()
            .await
            .state
            .pending_requests()
            .cloned()
            .collect()
    }

    /// Pending requests, oldest first, with ticket number and price from storage
    pub async fn pending_queue(&self) -> Result<Vec<QueuedRequest>> {
        let mut pending = self.get_pending_requests().await;
        pending.sort_by_key(|r| r.request_time);

        let ids: Vec<TicketId> = pending.iter().map(|r| r.ticket_id).collect();
        let summaries = self.tickets.fetch_summaries(&ids).await?;
        Ok(pending
            .into_iter()
            .map(|request| QueuedRequest {
                ticket: summaries.get(&request.ticket_id).cloned(),
                request,
            })
            .collect())
    }

    /// Fold a change event from the gateway into the snapshot
    ///
    /// The event's table is refetched in full. Notifications are raised once
    /// the refetch succeeded; a failed refetch is logged and raises nothing.
    pub async fn handle_change(&self, event: &ChangeEvent) -> Result<()> {
        tracing::debug!("{:?} on {} received", event.event_type, event.table);
        self.refresh(event.table).await?;

        if let Some(followup) = followup_for(event) {
            self.notify(followup).await;
        }
        Ok(())
    }

    /// Refetch a table and replace its slice of the snapshot
    ///
    /// Returns `false` if a newer refetch of the table was applied first.
    pub async fn refresh(&self, table: Table) -> Result<bool> {
        let generation = self.begin_refetch(table);
        let change = match table {
            Table::Tickets => self.tickets.fetch_all().await.map(StateChange::SetTickets),
            Table::CarRequests => self
                .requests
                .fetch_all()
                .await
                .map(StateChange::SetCarRequests),
        }
        .inspect_err(|e| tracing::error!("Failed to refresh {}: {}", table, e))?;

        Ok(self.apply_refetch(generation, change).await)
    }

    pub(crate) async fn apply_refetch(&self, generation: Generation, change: StateChange) -> bool {
        let mut shared = self.shared.write().await;
        if shared.applied.accept(generation) {
            shared.state.apply(change);
            tracing::debug!("Applied {} refetch {:?}", generation.table(), generation);
            true
        } else {
            tracing::warn!(
                "Discarding stale {} refetch {:?}",
                generation.table(),
                generation
            );
            false
        }
    }

    pub(crate) fn begin_refetch(&self, table: Table) -> Generation {
        self.sequencer.begin(table)
    }

    async fn apply(&self, change: StateChange) {
        self.shared.write().await.state.apply(change);
    }

    async fn notify(&self, followup: Followup) {
        match followup {
            Followup::NewRequest {
                request_id,
                ticket_id,
            } => self.notifier.notify_new_request(request_id, ticket_id),
            Followup::Accepted(ticket_id) | Followup::Completed(ticket_id) => {
                let number = self
                    .shared
                    .read()
                    .await
                    .state
                    .ticket_by_id(&ticket_id)
                    .map(|t| t.ticket_number.clone());
                let Some(number) = number else {
                    tracing::debug!("No local ticket {} to notify about", ticket_id);
                    return;
                };
                match followup {
                    Followup::Accepted(_) => self.notifier.notify_accepted(number),
                    _ => self.notifier.notify_ready(number),
                }
            },
        }
    }
}
