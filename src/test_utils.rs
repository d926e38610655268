//! Test utilities for valet-ticket
//!
//! Common fixtures shared by the unit tests across the crate.

#![cfg(test)]

use crate::core::{
    CarRequest, CarRequestBuilder, PaymentMethod, RequestStatus, Ticket, TicketBuilder,
};
use crate::storage::format::{car_request_to_row, ticket_to_row};
use crate::storage::rows::to_record;
use crate::storage::{FileGateway, InMemoryGateway, Tables};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test fixture for an initialized data directory
pub struct TestSite {
    pub temp_dir: TempDir,
    pub gateway: Arc<FileGateway>,
}

impl TestSite {
    /// Create a temporary data directory with empty table files
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let gateway = FileGateway::init(temp_dir.path(), false)
            .await
            .expect("Failed to initialize data directory");
        Self {
            temp_dir,
            gateway: Arc::new(gateway),
        }
    }
}

/// Builder for pre-populated gateway contents
#[derive(Default)]
pub struct TestDataBuilder {
    tickets: Vec<Ticket>,
    requests: Vec<CarRequest>,
}

impl TestDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unpaid ticket
    pub fn with_ticket(mut self, number: &str, price: Decimal) -> Self {
        self.tickets
            .push(TicketBuilder::new().number(number).price(price).build());
        self
    }

    /// Add a paid ticket issued at `issue_date`
    pub fn with_paid_ticket(
        mut self,
        number: &str,
        price: Decimal,
        method: PaymentMethod,
        issue_date: DateTime<Utc>,
    ) -> Self {
        self.tickets.push(
            TicketBuilder::new()
                .number(number)
                .price(price)
                .paid(method)
                .issue_date(issue_date)
                .build(),
        );
        self
    }

    /// Add a request for the most recently added ticket
    pub fn with_request(mut self, status: RequestStatus) -> Self {
        let ticket = self.tickets.last().expect("Add a ticket before a request");
        self.requests.push(
            CarRequestBuilder::new()
                .ticket(ticket.id)
                .status(status)
                .build(),
        );
        self
    }

    /// Row storage holding the built entities
    pub fn build_tables(self) -> Tables {
        Tables {
            tickets: self
                .tickets
                .iter()
                .map(|t| to_record(&ticket_to_row(t)).expect("Failed to encode ticket"))
                .collect(),
            car_requests: self
                .requests
                .iter()
                .map(|r| to_record(&car_request_to_row(r)).expect("Failed to encode request"))
                .collect(),
        }
    }

    /// In-memory gateway holding the built entities
    pub fn build_gateway(self) -> Arc<InMemoryGateway> {
        Arc::new(InMemoryGateway::with_tables(self.build_tables()))
    }
}

/// Poll `check` until it holds, panicking after about two seconds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Condition not met in time");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Filter, PersistenceGateway, Table};

    #[tokio::test]
    async fn test_site_creation() {
        let site = TestSite::new().await;
        assert!(site.temp_dir.path().join("tickets.yaml").exists());
        assert!(site.gateway.select(Table::Tickets, &Filter::all()).await.unwrap().is_empty());
    }

    #[test]
    fn test_data_builder() {
        let tables = TestDataBuilder::new()
            .with_ticket("00001", Decimal::new(2, 0))
            .with_request(RequestStatus::Pending)
            .with_ticket("00002", Decimal::new(5, 0))
            .build_tables();

        assert_eq!(tables.tickets.len(), 2);
        assert_eq!(tables.car_requests.len(), 1);
        assert_eq!(tables.car_requests[0]["ticket_id"], tables.tickets[0]["id"]);
    }
}
