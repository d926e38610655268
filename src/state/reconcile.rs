//! Reconciliation bookkeeping
//!
//! Every change event triggers a full refetch of its table. Refetches are
//! numbered per table when they start; a result is only applied if no newer
//! refetch of the same table has been applied already.

use crate::core::{RequestId, RequestStatus, TicketId};
use crate::storage::{ChangeEvent, EventType, Table};
use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a refetch in its table's sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    table: Table,
    number: u64,
}

impl Generation {
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }
}

const fn slot(table: Table) -> usize {
    match table {
        Table::Tickets => 0,
        Table::CarRequests => 1,
    }
}

/// Hands out increasing generation numbers per table
#[derive(Debug, Default)]
pub struct RefetchSequencer {
    issued: [AtomicU64; 2],
}

impl RefetchSequencer {
    /// Number a refetch that is about to start
    pub fn begin(&self, table: Table) -> Generation {
        let number = self.issued[slot(table)].fetch_add(1, Ordering::SeqCst) + 1;
        Generation { table, number }
    }
}

/// Newest generation applied to the snapshot, per table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppliedGenerations {
    applied: [u64; 2],
}

impl AppliedGenerations {
    /// Record `generation` as applied unless something newer already was
    pub fn accept(&mut self, generation: Generation) -> bool {
        let current = &mut self.applied[slot(generation.table)];
        if generation.number > *current {
            *current = generation.number;
            true
        } else {
            false
        }
    }
}

/// What a car-request event should tell the user, once state is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    NewRequest {
        request_id: RequestId,
        ticket_id: TicketId,
    },
    Accepted(TicketId),
    Completed(TicketId),
}

/// Inspect a change event for a user-visible followup
///
/// Only car-request inserts of pending rows and updates to accepted or
/// completed produce one. Rows with unreadable ids are ignored.
#[must_use]
pub fn followup_for(event: &ChangeEvent) -> Option<Followup> {
    if event.table != Table::CarRequests {
        return None;
    }
    let status: RequestStatus = event.after_str("status")?.parse().ok()?;
    let ticket_id = TicketId::parse_str(event.after_str("ticket_id")?).ok()?;

    match (event.event_type, status) {
        (EventType::Insert, RequestStatus::Pending) => {
            let request_id = RequestId::parse_str(event.after_str("id")?).ok()?;
            Some(Followup::NewRequest {
                request_id,
                ticket_id,
            })
        },
        (EventType::Update, RequestStatus::Accepted) => Some(Followup::Accepted(ticket_id)),
        (EventType::Update, RequestStatus::Completed) => Some(Followup::Completed(ticket_id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Record;
    use serde_json::json;

    fn request_record(id: RequestId, ticket_id: TicketId, status: &str) -> Record {
        let value = json!({
            "id": id.to_string(),
            "ticket_id": ticket_id.to_string(),
            "status": status,
            "request_time": "2024-05-01T10:00:00Z",
        });
        match value {
            serde_json::Value::Object(record) => record,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let sequencer = RefetchSequencer::default();
        let mut applied = AppliedGenerations::default();

        let first = sequencer.begin(Table::CarRequests);
        let second = sequencer.begin(Table::CarRequests);
        let tickets = sequencer.begin(Table::Tickets);

        assert!(applied.accept(second));
        assert!(!applied.accept(first));
        assert!(!applied.accept(second));
        // Tables are sequenced independently
        assert!(applied.accept(tickets));
    }

    #[test]
    fn test_followups() {
        let id = RequestId::new();
        let ticket_id = TicketId::new();

        let inserted = ChangeEvent::inserted(
            Table::CarRequests,
            request_record(id, ticket_id, "pending"),
        );
        assert_eq!(
            followup_for(&inserted),
            Some(Followup::NewRequest {
                request_id: id,
                ticket_id
            })
        );

        let accepted = ChangeEvent::updated(
            Table::CarRequests,
            request_record(id, ticket_id, "pending"),
            request_record(id, ticket_id, "accepted"),
        );
        assert_eq!(followup_for(&accepted), Some(Followup::Accepted(ticket_id)));

        let completed = ChangeEvent::updated(
            Table::CarRequests,
            request_record(id, ticket_id, "accepted"),
            request_record(id, ticket_id, "completed"),
        );
        assert_eq!(followup_for(&completed), Some(Followup::Completed(ticket_id)));
    }

    #[test]
    fn test_events_without_followup() {
        let id = RequestId::new();
        let ticket_id = TicketId::new();

        let reverted = ChangeEvent::updated(
            Table::CarRequests,
            request_record(id, ticket_id, "accepted"),
            request_record(id, ticket_id, "pending"),
        );
        assert_eq!(followup_for(&reverted), None);

        let deleted =
            ChangeEvent::deleted(Table::CarRequests, request_record(id, ticket_id, "pending"));
        assert_eq!(followup_for(&deleted), None);

        let ticket_event =
            ChangeEvent::inserted(Table::Tickets, request_record(id, ticket_id, "pending"));
        assert_eq!(followup_for(&ticket_event), None);
    }
}
