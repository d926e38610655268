use super::{RequestId, TicketId};
use crate::error::{Result, ValetError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a car retrieval request
///
/// Variants are declared in lifecycle order so `Ord` follows
/// pending < accepted < completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for a valet
    Pending,
    /// A valet is fetching the car
    Accepted,
    /// The car was handed over
    Completed,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
        }
    }

    /// The status a request moves to next, if any
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Accepted),
            Self::Accepted => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Whether `to` is the immediate successor of this status
    #[must_use]
    pub fn can_advance_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Whether the request still needs valet attention
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            other => Err(ValetError::validation(format!(
                "Invalid request status: {other}. Must be one of: pending, accepted, completed"
            ))),
        }
    }
}

/// A request to bring a parked car back to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRequest {
    pub id: RequestId,
    pub ticket_id: TicketId,
    pub status: RequestStatus,
    pub request_time: DateTime<Utc>,
}
