//! Persisted row shapes
//!
//! Columns that the schema allows to be NULL are `Option`s here; the
//! formatters in [`super::format`] decide the defaults.

use super::gateway::Record;
use crate::error::{Result, ValetError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row of the `tickets` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRow {
    pub id: String,
    pub ticket_number: String,
    /// Numeric column; stores hand it back as a JSON number or a numeric string
    pub price: Value,
    #[serde(default)]
    pub company_name: String,
    pub is_paid: Option<bool>,
    pub issue_date: Option<String>,
    pub instructions: Option<String>,
    pub ticket_type: Option<String>,
    pub payment_method: Option<String>,
}

/// Insert payload for the `tickets` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicketRow {
    pub ticket_number: String,
    pub price: Value,
    pub company_name: String,
    pub is_paid: bool,
    pub instructions: Option<String>,
    pub ticket_type: Option<String>,
}

/// Update payload for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPatch {
    pub is_paid: bool,
    pub payment_method: Option<String>,
}

/// Row of the `car_requests` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarRequestRow {
    pub id: String,
    pub ticket_id: Option<String>,
    pub status: String,
    pub request_time: Option<String>,
}

/// Insert payload for the `car_requests` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCarRequestRow {
    pub ticket_id: String,
    pub status: String,
}

/// Update payload for a request status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPatch {
    pub status: String,
}

/// Serialize a payload into a gateway record
pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ValetError::validation(format!(
            "Expected a row object, got {other}"
        ))),
    }
}

/// Deserialize a gateway record into a row shape
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
