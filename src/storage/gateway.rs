//! Persistence gateway abstraction
//!
//! The gateway is a row-oriented store with two tables and a per-table
//! change feed. Rows travel as JSON objects keyed by column name so the same
//! trait can front a remote relational store or a local file.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;

/// One persisted row, keyed by column name
pub type Record = serde_json::Map<String, Value>;

/// Buffered change events per subscriber before it starts lagging
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Tables known to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Tickets,
    CarRequests,
}

impl Table {
    pub const ALL: [Self; 2] = [Self::Tickets, Self::CarRequests];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::CarRequests => "car_requests",
        }
    }

    /// Columns an insert must provide
    #[must_use]
    pub const fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Tickets => &["ticket_number", "price", "company_name"],
            Self::CarRequests => &["status"],
        }
    }

    /// Column filled with the insert time when the insert leaves it empty
    #[must_use]
    pub const fn timestamp_column(&self) -> &'static str {
        match self {
            Self::Tickets => "issue_date",
            Self::CarRequests => "request_time",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gte(String, Value),
}

impl Predicate {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq(column, expected) => record.get(column) == Some(expected),
            Self::In(column, options) => record
                .get(column)
                .is_some_and(|value| options.contains(value)),
            Self::Gte(column, bound) => record
                .get(column)
                .and_then(|value| compare_values(value, bound))
                .is_some_and(Ordering::is_ge),
        }
    }
}

/// Conjunction of column predicates; the empty filter matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Filter that matches every row
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `column == value`
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Eq(column.to_string(), value.into()));
        self
    }

    /// Require `column in (values)`
    #[must_use]
    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.predicates.push(Predicate::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Require `column >= value`
    #[must_use]
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Gte(column.to_string(), value.into()));
        self
    }

    /// Whether a row satisfies every predicate
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Order two column values; timestamps compare chronologically
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => match (parse_instant(a), parse_instant(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp, or a zone-less one taken as UTC
pub(crate) fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
                .map(|naive| naive.and_utc())
                .ok()
        })
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Insert,
    Update,
    Delete,
}

/// Row change notification with before/after snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub event_type: EventType,
    pub table: Table,
    pub before: Option<Record>,
    pub after: Option<Record>,
}

impl ChangeEvent {
    #[must_use]
    pub const fn inserted(table: Table, after: Record) -> Self {
        Self {
            event_type: EventType::Insert,
            table,
            before: None,
            after: Some(after),
        }
    }

    #[must_use]
    pub const fn updated(table: Table, before: Record, after: Record) -> Self {
        Self {
            event_type: EventType::Update,
            table,
            before: Some(before),
            after: Some(after),
        }
    }

    #[must_use]
    pub const fn deleted(table: Table, before: Record) -> Self {
        Self {
            event_type: EventType::Delete,
            table,
            before: Some(before),
            after: None,
        }
    }

    /// String column of the `after` row
    #[must_use]
    pub fn after_str(&self, column: &str) -> Option<&str> {
        self.after.as_ref()?.get(column)?.as_str()
    }
}

/// Row store consumed by the repositories
///
/// Implementations must publish a [`ChangeEvent`] for every row they insert,
/// update or delete, to every subscriber of that table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert a row, returning it with generated columns filled in
    async fn insert(&self, table: Table, record: Record) -> Result<Record>;

    /// Rows matching the filter, in storage order
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Record>>;

    /// Merge `patch` into every matching row; returns the number of rows changed
    async fn update(&self, table: Table, filter: &Filter, patch: Record) -> Result<usize>;

    /// Delete matching rows; returns the number of rows removed
    async fn delete(&self, table: Table, filter: &Filter) -> Result<usize>;

    /// Number of matching rows
    async fn count(&self, table: Table, filter: &Filter) -> Result<usize>;

    /// Subscribe to every change on a table
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent>;
}

/// Broadcast fan-out of change events, one channel per table
#[derive(Debug)]
pub struct ChangeFeed {
    senders: HashMap<Table, broadcast::Sender<ChangeEvent>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::with_capacity(CHANGE_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let senders = Table::ALL
            .into_iter()
            .map(|table| (table, broadcast::channel(capacity).0))
            .collect();
        Self { senders }
    }

    #[must_use]
    pub fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        match self.senders.get(&table) {
            Some(sender) => sender.subscribe(),
            // Every table gets a sender in the constructor
            None => broadcast::channel(1).1,
        }
    }

    /// Publish events; having no subscribers is not an error
    pub fn publish(&self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            if let Some(sender) = self.senders.get(&event.table) {
                let _ = sender.send(event);
            }
        }
    }
}
