//! Ticket and car-request repositories
//!
//! Thin typed layers over a [`PersistenceGateway`]. They map rows to entities
//! and back, and surface gateway failures unchanged. Business rules (ticket
//! numbering, one request per ticket) are enforced by the state core before
//! these are called.

use super::format::{format_car_request, format_ticket, price_value};
use super::gateway::{Filter, PersistenceGateway, Record, Table};
use super::rows::{
    CarRequestRow, NewCarRequestRow, NewTicketRow, PaymentPatch, StatusPatch, TicketRow,
    from_record, to_record,
};
use crate::core::{
    CarRequest, NewTicket, PaymentMethod, RequestId, RequestStatus, Ticket, TicketId, TicketNumber,
};
use crate::error::{Result, ValetError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Company name written on tickets when none is configured
pub const DEFAULT_COMPANY_NAME: &str = "Valet Parking Pro";

/// Ticket number and price, as shown next to a car request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub ticket_number: TicketNumber,
    pub price: Decimal,
}

fn ticket_from_record(record: Record) -> Result<Ticket> {
    format_ticket(from_record::<TicketRow>(record)?)
}

fn request_from_record(record: Record) -> Result<CarRequest> {
    format_car_request(from_record::<CarRequestRow>(record)?)
}

/// Format every row, skipping the ones that cannot be interpreted
fn format_rows<T>(
    table: Table,
    records: Vec<Record>,
    format: impl Fn(Record) -> Result<T>,
) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match format(record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!("Skipping malformed {} row: {}", table, e);
                None
            },
        })
        .collect()
}

/// CRUD over the `tickets` table
#[derive(Clone)]
pub struct TicketRepository {
    gateway: Arc<dyn PersistenceGateway>,
}

impl TicketRepository {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Every ticket, in storage order
    pub async fn fetch_all(&self) -> Result<Vec<Ticket>> {
        let records = self.gateway.select(Table::Tickets, &Filter::all()).await?;
        Ok(format_rows(Table::Tickets, records, ticket_from_record))
    }

    /// The ticket with this exact number, if any
    ///
    /// Numbering is best-effort, so duplicates can exist; the most recently
    /// issued one wins.
    pub async fn fetch_by_number(&self, number: &TicketNumber) -> Result<Option<Ticket>> {
        let filter = Filter::all().eq("ticket_number", number.as_str());
        let records = self.gateway.select(Table::Tickets, &filter).await?;
        let mut tickets = format_rows(Table::Tickets, records, ticket_from_record);
        if tickets.len() > 1 {
            tracing::warn!(
                "{} tickets share number {}; using the newest",
                tickets.len(),
                number
            );
        }
        tickets.sort_by_key(|t| t.issue_date);
        Ok(tickets.pop())
    }

    /// Tickets issued at or after `start`, optionally filtered by paid flag
    pub async fn fetch_by_date_range(
        &self,
        start: DateTime<Utc>,
        paid: Option<bool>,
    ) -> Result<Vec<Ticket>> {
        let mut filter =
            Filter::all().gte("issue_date", super::format::format_timestamp(&start));
        if let Some(is_paid) = paid {
            filter = filter.eq("is_paid", is_paid);
        }
        let records = self.gateway.select(Table::Tickets, &filter).await?;
        Ok(format_rows(Table::Tickets, records, ticket_from_record))
    }

    /// Number and price for each of the given tickets that still exists
    pub async fn fetch_summaries(
        &self,
        ids: &[TicketId],
    ) -> Result<HashMap<TicketId, TicketSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let filter = Filter::all().is_in("id", ids.iter().map(ToString::to_string));
        let records = self.gateway.select(Table::Tickets, &filter).await?;
        Ok(format_rows(Table::Tickets, records, ticket_from_record)
            .into_iter()
            .map(|t| {
                let summary = TicketSummary {
                    ticket_number: t.ticket_number,
                    price: t.price,
                };
                (t.id, summary)
            })
            .collect())
    }

    /// Whether a ticket row with this id still exists
    pub async fn exists(&self, id: &TicketId) -> Result<bool> {
        let filter = Filter::all().eq("id", id.to_string());
        Ok(self.gateway.count(Table::Tickets, &filter).await? > 0)
    }

    /// Insert an unpaid ticket
    ///
    /// Performs no uniqueness check on the number.
    pub async fn create(&self, ticket: NewTicket) -> Result<Ticket> {
        let row = NewTicketRow {
            ticket_number: ticket.ticket_number.as_str().to_string(),
            price: price_value(ticket.price),
            company_name: ticket
                .company_name
                .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            is_paid: false,
            instructions: ticket.instructions,
            ticket_type: Some(ticket.ticket_type),
        };
        let stored = self.gateway.insert(Table::Tickets, to_record(&row)?).await?;
        ticket_from_record(stored)
    }

    /// Set the paid flag and payment method
    pub async fn update_payment(
        &self,
        id: &TicketId,
        is_paid: bool,
        method: Option<PaymentMethod>,
    ) -> Result<()> {
        let patch = PaymentPatch {
            is_paid,
            payment_method: method.map(|m| m.as_str().to_string()),
        };
        let filter = Filter::all().eq("id", id.to_string());
        self.gateway
            .update(Table::Tickets, &filter, to_record(&patch)?)
            .await?;
        Ok(())
    }

    /// Delete a ticket together with its car requests
    ///
    /// Requests go first; if that fails the ticket is left alone. If the
    /// ticket deletion fails afterwards the requests are already gone.
    pub async fn delete(&self, id: &TicketId) -> Result<()> {
        let requests = CarRequestRepository::new(self.gateway.clone());
        match requests.delete_by_ticket(id).await {
            Ok(removed) => tracing::debug!("Removed {} car request(s) for ticket {}", removed, id),
            Err(e) => {
                tracing::error!("Failed to delete car requests for ticket {}: {}", id, e);
                return Err(e);
            },
        }

        let by_id = Filter::all().eq("id", id.to_string());
        if let Err(e) = self.gateway.delete(Table::Tickets, &by_id).await {
            tracing::error!("Failed to delete ticket {}: {}", id, e);
            return Err(e);
        }
        Ok(())
    }
}

/// CRUD over the `car_requests` table
#[derive(Clone)]
pub struct CarRequestRepository {
    gateway: Arc<dyn PersistenceGateway>,
}

impl CarRequestRepository {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Every request, in storage order
    pub async fn fetch_all(&self) -> Result<Vec<CarRequest>> {
        let records = self
            .gateway
            .select(Table::CarRequests, &Filter::all())
            .await?;
        Ok(format_rows(Table::CarRequests, records, request_from_record))
    }

    /// Requests referencing a ticket, any status
    pub async fn fetch_by_ticket(&self, ticket_id: &TicketId) -> Result<Vec<CarRequest>> {
        let filter = Filter::all().eq("ticket_id", ticket_id.to_string());
        let records = self.gateway.select(Table::CarRequests, &filter).await?;
        Ok(format_rows(Table::CarRequests, records, request_from_record))
    }

    /// Insert a pending request for a ticket
    pub async fn create(&self, ticket_id: &TicketId) -> Result<CarRequest> {
        let row = NewCarRequestRow {
            ticket_id: ticket_id.to_string(),
            status: RequestStatus::Pending.as_str().to_string(),
        };
        let stored = self
            .gateway
            .insert(Table::CarRequests, to_record(&row)?)
            .await?;
        request_from_record(stored)
    }

    /// Write a new status without looking at the current one
    pub async fn update_status(&self, id: &RequestId, status: RequestStatus) -> Result<()> {
        let filter = Filter::all().eq("id", id.to_string());
        self.write_status(&filter, status).await?;
        Ok(())
    }

    /// Write a new status only while the row still holds `expected`
    pub async fn update_status_from(
        &self,
        id: &RequestId,
        expected: RequestStatus,
        status: RequestStatus,
    ) -> Result<()> {
        let filter = Filter::all()
            .eq("id", id.to_string())
            .eq("status", expected.as_str());
        match self.write_status(&filter, status).await? {
            0 => Err(ValetError::StaleRequest {
                id: id.to_string(),
                expected,
            }),
            _ => Ok(()),
        }
    }

    /// Delete every request for a ticket; returns how many were removed
    pub async fn delete_by_ticket(&self, ticket_id: &TicketId) -> Result<usize> {
        let filter = Filter::all().eq("ticket_id", ticket_id.to_string());
        self.gateway.delete(Table::CarRequests, &filter).await
    }

    async fn write_status(&self, filter: &Filter, status: RequestStatus) -> Result<usize> {
        let patch = StatusPatch {
            status: status.as_str().to_string(),
        };
        self.gateway
            .update(Table::CarRequests, filter, to_record(&patch)?)
            .await
    }
}
