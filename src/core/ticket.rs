use super::TicketId;
use crate::error::{Result, ValetError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leading integer, the way a lenient integer parse reads "00042" or " 7abc"
static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid regex"));

/// A complete ticket number: at least [`TicketNumber::WIDTH`] digits, as issued
static COMPLETE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5,}$").expect("valid regex"));

/// Human-facing ticket number, e.g. `00042`
///
/// Numbers generated here are always zero-padded to [`TicketNumber::WIDTH`]
/// digits. Numbers read back from storage are kept verbatim, so a hand-edited
/// row with a non-numeric number still round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    /// Number of digits in a generated ticket number
    pub const WIDTH: usize = 5;

    /// Wrap a stored number without validation
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Format a sequence value as a zero-padded ticket number
    #[must_use]
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{sequence:0width$}", width = Self::WIDTH))
    }

    /// Parse user input
    ///
    /// Accepts anything [`TicketNumber::from_sequence`] can produce: digits
    /// only, at least five of them.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if COMPLETE_NUMBER.is_match(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(ValetError::validation(format!(
                "'{input}' is not a ticket number (at least {} digits)",
                Self::WIDTH
            )))
        }
    }

    /// Integer value of the number, if it has a leading integer
    ///
    /// Non-numeric numbers yield `None` and are skipped by numbering, as are
    /// numbers too large for an `i64` (more than 18 or 19 digits).
    #[must_use]
    pub fn sequence(&self) -> Option<i64> {
        LEADING_INTEGER
            .captures(&self.0)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TicketNumber {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TicketNumber {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How a ticket was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Visa,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Visa => "visa",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "visa" => Ok(Self::Visa),
            other => Err(ValetError::validation(format!(
                "Invalid payment method: {other}. Must be one of: cash, visa"
            ))),
        }
    }
}

/// A parking ticket for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub ticket_number: TicketNumber,
    pub price: Decimal,
    pub issue_date: DateTime<Utc>,
    pub company_name: String,
    pub is_paid: bool,
    pub instructions: Option<String>,
    pub ticket_type: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

impl Ticket {
    /// Record the outcome of a payment
    pub fn set_payment(&mut self, is_paid: bool, method: Option<PaymentMethod>) {
        self.is_paid = is_paid;
        self.payment_method = method;
    }
}

/// Parameters for inserting a ticket
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub ticket_number: TicketNumber,
    pub price: Decimal,
    pub ticket_type: String,
    pub instructions: Option<String>,
    pub company_name: Option<String>,
}
