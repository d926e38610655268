//! In-memory snapshot of both tables
//!
//! The snapshot is only ever changed through [`StateChange`], so every
//! mutation the core performs is a single, named step.

use crate::core::{CarRequest, PaymentMethod, RequestId, RequestStatus, Ticket, TicketId, TicketNumber};

/// Local copy of tickets and car requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValetState {
    pub tickets: Vec<Ticket>,
    pub car_requests: Vec<CarRequest>,
}

/// One mutation of the snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Replace the ticket slice with a fresh fetch
    SetTickets(Vec<Ticket>),
    /// Replace the request slice with a fresh fetch
    SetCarRequests(Vec<CarRequest>),
    AddTicket(Ticket),
    AddRequest(CarRequest),
    UpdateRequestStatus {
        id: RequestId,
        status: RequestStatus,
    },
    UpdatePayment {
        ticket_id: TicketId,
        is_paid: bool,
        method: Option<PaymentMethod>,
    },
    /// Remove a ticket and every request that references it
    RemoveTicket(TicketId),
}

impl ValetState {
    pub fn apply(&mut self, change: StateChange) {
        match change {
            StateChange::SetTickets(tickets) => self.tickets = tickets,
            StateChange::SetCarRequests(requests) => self.car_requests = requests,
            StateChange::AddTicket(ticket) => self.tickets.push(ticket),
            StateChange::AddRequest(request) => self.car_requests.push(request),
            StateChange::UpdateRequestStatus { id, status } => {
                for request in self.car_requests.iter_mut().filter(|r| r.id == id) {
                    request.status = status;
                }
            },
            StateChange::UpdatePayment {
                ticket_id,
                is_paid,
                method,
            } => {
                for ticket in self.tickets.iter_mut().filter(|t| t.id == ticket_id) {
                    ticket.set_payment(is_paid, method);
                }
            },
            StateChange::RemoveTicket(ticket_id) => {
                self.tickets.retain(|t| t.id != ticket_id);
                self.car_requests.retain(|r| r.ticket_id != ticket_id);
            },
        }
    }

    /// Ticket with this number; the newest one if the number is duplicated
    #[must_use]
    pub fn ticket_by_number(&self, number: &str) -> Option<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| t.ticket_number == number)
            .max_by_key(|t| t.issue_date)
    }

    #[must_use]
    pub fn ticket_by_id(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn request_by_id(&self, id: &RequestId) -> Option<&CarRequest> {
        self.car_requests.iter().find(|r| &r.id == id)
    }

    /// Any request for the ticket, completed ones included
    #[must_use]
    pub fn request_for_ticket(&self, ticket_id: &TicketId) -> Option<&CarRequest> {
        self.car_requests.iter().find(|r| &r.ticket_id == ticket_id)
    }

    /// The request for the ticket that is still pending or accepted
    #[must_use]
    pub fn active_request_for_ticket(&self, ticket_id: &TicketId) -> Option<&CarRequest> {
        self.car_requests
            .iter()
            .find(|r| &r.ticket_id == ticket_id && r.status.is_active())
    }

    /// Requests waiting for a valet, in snapshot order
    pub fn pending_requests(&self) -> impl Iterator<Item = &CarRequest> {
        self.car_requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
    }

    /// One past the highest numeric ticket number, `00001` when there is none
    #[must_use]
    pub fn next_ticket_number(&self) -> TicketNumber {
        let highest = self
            .tickets
            .iter()
            .filter_map(|t| t.ticket_number.sequence())
            .fold(0, i64::max);
        TicketNumber::from_sequence(highest.unsigned_abs() + 1)
    }
}
