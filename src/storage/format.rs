//! Row <-> entity formatters
//!
//! Pure conversions. Row-to-entity fills defaults for NULL columns
//! (`is_paid` false, timestamps now, text `None`), so the round trip is lossy
//! for NULL inputs; entity-to-row keeps every populated field.

use super::gateway::parse_instant;
use super::rows::{CarRequestRow, TicketRow};
use crate::core::{CarRequest, PaymentMethod, RequestId, Ticket, TicketId, TicketNumber};
use crate::error::{Result, ValetError};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Convert a `tickets` row into a [`Ticket`]
pub fn format_ticket(row: TicketRow) -> Result<Ticket> {
    let payment_method = row.payment_method.as_deref().and_then(|method| {
        method.parse::<PaymentMethod>().map_or_else(
            |_| {
                tracing::warn!(
                    "Ticket {}: ignoring unknown payment method '{}'",
                    row.ticket_number,
                    method
                );
                None
            },
            Some,
        )
    });

    Ok(Ticket {
        id: TicketId::parse_str(&row.id)?,
        price: parse_price(&row.price)?,
        issue_date: parse_timestamp(row.issue_date.as_deref())?,
        company_name: row.company_name,
        is_paid: row.is_paid.unwrap_or(false),
        instructions: row.instructions,
        ticket_type: row.ticket_type,
        payment_method,
        ticket_number: TicketNumber::new(row.ticket_number),
    })
}

/// Convert a `car_requests` row into a [`CarRequest`]
pub fn format_car_request(row: CarRequestRow) -> Result<CarRequest> {
    let ticket_id = row.ticket_id.as_deref().ok_or_else(|| {
        ValetError::validation(format!("Car request {} has no ticket", row.id))
    })?;

    Ok(CarRequest {
        id: RequestId::parse_str(&row.id)?,
        ticket_id: TicketId::parse_str(ticket_id)?,
        status: row.status.parse()?,
        request_time: parse_timestamp(row.request_time.as_deref())?,
    })
}

/// Convert a [`Ticket`] back into its row shape
#[must_use]
pub fn ticket_to_row(ticket: &Ticket) -> TicketRow {
    TicketRow {
        id: ticket.id.to_string(),
        ticket_number: ticket.ticket_number.as_str().to_string(),
        price: price_value(ticket.price),
        company_name: ticket.company_name.clone(),
        is_paid: Some(ticket.is_paid),
        issue_date: Some(format_timestamp(&ticket.issue_date)),
        instructions: ticket.instructions.clone(),
        ticket_type: ticket.ticket_type.clone(),
        payment_method: ticket.payment_method.map(|m| m.as_str().to_string()),
    }
}

/// Convert a [`CarRequest`] back into its row shape
#[must_use]
pub fn car_request_to_row(request: &CarRequest) -> CarRequestRow {
    CarRequestRow {
        id: request.id.to_string(),
        ticket_id: Some(request.ticket_id.to_string()),
        status: request.status.as_str().to_string(),
        request_time: Some(format_timestamp(&request.request_time)),
    }
}

/// Read a numeric column that may arrive as a number or a numeric string
pub fn parse_price(value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        other => {
            return Err(ValetError::validation(format!("Invalid price: {other}")));
        },
    };

    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| ValetError::validation(format!("Invalid price '{text}': {e}")))?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValetError::validation(format!("Negative price: {price}")));
    }
    Ok(price)
}

/// Encode a price as a JSON number
#[must_use]
pub fn price_value(price: Decimal) -> Value {
    Number::from_str(&price.normalize().to_string())
        .map_or_else(|_| Value::String(price.to_string()), Value::Number)
}

/// Read a timestamp column; NULL means "now"
pub fn parse_timestamp(value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        None => Ok(Utc::now()),
        Some(text) => parse_instant(text)
            .ok_or_else(|| ValetError::validation(format!("Invalid timestamp: {text}"))),
    }
}

/// Encode a timestamp the way the gateway stores it
#[must_use]
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RequestStatus;
    use serde_json::json;

    fn full_ticket_row() -> TicketRow {
        TicketRow {
            id: TicketId::new().to_string(),
            ticket_number: "00017".to_string(),
            price: json!("3.0"),
            company_name: "Valet Parking Pro".to_string(),
            is_paid: Some(true),
            issue_date: Some("2025-06-01T18:30:00.000000Z".to_string()),
            instructions: Some("Black SUV".to_string()),
            ticket_type: Some("PREMIUM".to_string()),
            payment_method: Some("visa".to_string()),
        }
    }

    #[test]
    fn test_format_ticket_full_row() {
        let row = full_ticket_row();
        let ticket = format_ticket(row.clone()).unwrap();

        assert_eq!(ticket.id.to_string(), row.id);
        assert_eq!(ticket.ticket_number.as_str(), "00017");
        assert_eq!(ticket.price, Decimal::new(3, 0));
        assert!(ticket.is_paid);
        assert_eq!(ticket.instructions.as_deref(), Some("Black SUV"));
        assert_eq!(ticket.ticket_type.as_deref(), Some("PREMIUM"));
        assert_eq!(ticket.payment_method, Some(PaymentMethod::Visa));
        assert_eq!(format_timestamp(&ticket.issue_date), "2025-06-01T18:30:00.000000Z");
    }

    #[test]
    fn test_ticket_round_trip_keeps_populated_fields() {
        let row = full_ticket_row();
        let back = ticket_to_row(&format_ticket(row.clone()).unwrap());

        assert_eq!(back.id, row.id);
        assert_eq!(back.ticket_number, row.ticket_number);
        assert_eq!(parse_price(&back.price).unwrap(), Decimal::new(3, 0));
        assert_eq!(back.is_paid, row.is_paid);
        assert_eq!(back.issue_date, row.issue_date);
        assert_eq!(back.instructions, row.instructions);
        assert_eq!(back.ticket_type, row.ticket_type);
        assert_eq!(back.payment_method, row.payment_method);
    }

    #[test]
    fn test_format_ticket_defaults_for_nulls() {
        let before = Utc::now();
        let row = TicketRow {
            is_paid: None,
            issue_date: None,
            instructions: None,
            ticket_type: None,
            payment_method: None,
            ..full_ticket_row()
        };

        let ticket = format_ticket(row).unwrap();
        assert!(!ticket.is_paid);
        assert!(ticket.issue_date >= before);
        assert_eq!(ticket.instructions, None);
        assert_eq!(ticket.ticket_type, None);
        assert_eq!(ticket.payment_method, None);
    }

    #[test]
    fn test_unknown_payment_method_is_dropped() {
        let row = TicketRow {
            payment_method: Some("cheque".to_string()),
            ..full_ticket_row()
        };
        assert_eq!(format_ticket(row).unwrap().payment_method, None);
    }

    #[test]
    fn test_parse_price_forms() {
        assert_eq!(parse_price(&json!(2)).unwrap(), Decimal::new(2, 0));
        assert_eq!(parse_price(&json!(2.5)).unwrap(), Decimal::new(25, 1));
        assert_eq!(parse_price(&json!(" 5.00 ")).unwrap(), Decimal::new(5, 0));
        assert!(parse_price(&json!("two")).is_err());
        assert!(parse_price(&json!(-1)).is_err());
        assert!(parse_price(&Value::Null).is_err());
    }

    #[test]
    fn test_price_value_is_a_number() {
        assert_eq!(price_value(Decimal::new(250, 2)), json!(2.5));
        assert_eq!(price_value(Decimal::new(5, 0)), json!(5));
    }

    #[test]
    fn test_format_car_request() {
        let ticket_id = TicketId::new();
        let row = CarRequestRow {
            id: RequestId::new().to_string(),
            ticket_id: Some(ticket_id.to_string()),
            status: "accepted".to_string(),
            request_time: Some("2025-06-01 18:45:00".to_string()),
        };

        let request = format_car_request(row.clone()).unwrap();
        assert_eq!(request.ticket_id, ticket_id);
        assert_eq!(request.status, RequestStatus::Accepted);

        let back = car_request_to_row(&request);
        assert_eq!(back.id, row.id);
        assert_eq!(back.ticket_id, row.ticket_id);
        assert_eq!(back.status, "accepted");
    }

    #[test]
    fn test_format_car_request_rejects_orphans_and_bad_status() {
        let orphan = CarRequestRow {
            id: RequestId::new().to_string(),
            ticket_id: None,
            status: "pending".to_string(),
            request_time: None,
        };
        assert!(format_car_request(orphan.clone()).is_err());

        let bad_status = CarRequestRow {
            ticket_id: Some(TicketId::new().to_string()),
            status: "lost".to_string(),
            ..orphan
        };
        assert!(format_car_request(bad_status).is_err());
    }
}
