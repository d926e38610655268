//! In-process persistence gateway
//!
//! [`Tables`] holds the rows and implements the row semantics shared by every
//! local gateway: generated ids and timestamps, required columns and the
//! `car_requests.ticket_id -> tickets.id` foreign key. [`InMemoryGateway`]
//! wraps it behind a lock and publishes change events, so several
//! [`crate::state::ValetCore`] sessions can share one store.

use super::format::format_timestamp;
use super::gateway::{ChangeEvent, ChangeFeed, Filter, PersistenceGateway, Record, Table};
use crate::error::{Result, ValetError};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Row storage for both tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub tickets: Vec<Record>,
    #[serde(default)]
    pub car_requests: Vec<Record>,
}

fn is_missing(record: &Record, column: &str) -> bool {
    record.get(column).is_none_or(Value::is_null)
}

impl Tables {
    #[must_use]
    pub fn rows(&self, table: Table) -> &[Record] {
        match table {
            Table::Tickets => &self.tickets,
            Table::CarRequests => &self.car_requests,
        }
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Record> {
        match table {
            Table::Tickets => &mut self.tickets,
            Table::CarRequests => &mut self.car_requests,
        }
    }

    fn ticket_exists(&self, id: &Value) -> bool {
        self.tickets.iter().any(|row| row.get("id") == Some(id))
    }

    /// Insert a row, filling generated columns; returns the stored row
    pub fn insert(&mut self, table: Table, mut record: Record) -> Result<(Record, ChangeEvent)> {
        for column in table.required_columns() {
            if is_missing(&record, column) {
                return Err(ValetError::persistence(format!(
                    "null value in column \"{column}\" of relation \"{table}\" violates not-null constraint"
                )));
            }
        }

        if is_missing(&record, "id") {
            record.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if is_missing(&record, table.timestamp_column()) {
            record.insert(
                table.timestamp_column().to_string(),
                Value::String(format_timestamp(&Utc::now())),
            );
        }
        if table == Table::Tickets && is_missing(&record, "is_paid") {
            record.insert("is_paid".to_string(), Value::Bool(false));
        }

        if table == Table::CarRequests {
            if let Some(ticket_id) = record.get("ticket_id").filter(|v| !v.is_null()) {
                if !self.ticket_exists(ticket_id) {
                    return Err(ValetError::persistence(format!(
                        "insert on \"car_requests\" violates foreign key constraint: ticket {ticket_id} does not exist"
                    )));
                }
            }
        }

        let id = record.get("id").cloned();
        if self.rows(table).iter().any(|row| row.get("id") == id.as_ref()) {
            return Err(ValetError::persistence(format!(
                "duplicate key value violates unique constraint \"{table}_pkey\""
            )));
        }

        self.rows_mut(table).push(record.clone());
        let event = ChangeEvent::inserted(table, record.clone());
        Ok((record, event))
    }

    /// Matching rows, cloned
    #[must_use]
    pub fn select(&self, table: Table, filter: &Filter) -> Vec<Record> {
        self.rows(table)
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect()
    }

    /// Merge `patch` into matching rows
    pub fn update(&mut self, table: Table, filter: &Filter, patch: &Record) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for row in self.rows_mut(table).iter_mut().filter(|row| filter.matches(row)) {
            let before = row.clone();
            for (column, value) in patch {
                row.insert(column.clone(), value.clone());
            }
            events.push(ChangeEvent::updated(table, before, row.clone()));
        }
        events
    }

    /// Remove matching rows
    ///
    /// Deleting a ticket that still has car requests violates the foreign key
    /// and removes nothing.
    pub fn delete(&mut self, table: Table, filter: &Filter) -> Result<Vec<ChangeEvent>> {
        if table == Table::Tickets {
            let referenced = self
                .tickets
                .iter()
                .filter(|row| filter.matches(row))
                .filter_map(|row| row.get("id"))
                .any(|id| {
                    self.car_requests
                        .iter()
                        .any(|request| request.get("ticket_id") == Some(id))
                });
            if referenced {
                return Err(ValetError::persistence(
                    "update or delete on \"tickets\" violates foreign key constraint \"car_requests_ticket_id_fkey\"",
                ));
            }
        }

        let rows = self.rows_mut(table);
        let (removed, kept): (Vec<Record>, Vec<Record>) =
            rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;

        Ok(removed
            .into_iter()
            .map(|row| ChangeEvent::deleted(table, row))
            .collect())
    }
}

/// Gateway keeping both tables in memory
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    tables: Mutex<Tables>,
    feed: ChangeFeed,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with rows
    #[must_use]
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
            feed: ChangeFeed::default(),
        }
    }

    /// Empty gateway whose change feeds hold only `capacity` events per table
    #[cfg(test)]
    pub(crate) fn with_feed_capacity(capacity: usize) -> Self {
        Self {
            tables: Mutex::default(),
            feed: ChangeFeed::with_capacity(capacity),
        }
    }

    /// Copy of the current rows
    pub fn tables(&self) -> Result<Tables> {
        self.with_lock(|tables| Ok(tables.clone()))
    }

    fn with_lock<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| ValetError::persistence("in-memory store lock poisoned"))?;
        f(&mut tables)
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn insert(&self, table: Table, record: Record) -> Result<Record> {
        let (stored, event) = self.with_lock(|tables| tables.insert(table, record))?;
        self.feed.publish([event]);
        Ok(stored)
    }

    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Record>> {
        self.with_lock(|tables| Ok(tables.select(table, filter)))
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Record) -> Result<usize> {
        let events = self.with_lock(|tables| Ok(tables.update(table, filter, &patch)))?;
        let changed = events.len();
        self.feed.publish(events);
        Ok(changed)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<usize> {
        let events = self.with_lock(|tables| tables.delete(table, filter))?;
        let removed = events.len();
        self.feed.publish(events);
        Ok(removed)
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize> {
        self.with_lock(|tables| Ok(tables.rows(table).iter().filter(|r| filter.matches(r)).count()))
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe(table)
    }
}
