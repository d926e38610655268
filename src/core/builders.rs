use super::{
    CarRequest, PaymentMethod, RequestId, RequestStatus, Ticket, TicketId, TicketNumber,
    DEFAULT_TICKET_TYPE,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Builder for creating Ticket instances
#[derive(Default)]
pub struct TicketBuilder {
    ticket_number: Option<TicketNumber>,
    price: Option<Decimal>,
    issue_date: Option<DateTime<Utc>>,
    is_paid: bool,
    instructions: Option<String>,
    ticket_type: Option<String>,
    payment_method: Option<PaymentMethod>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket number
    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.ticket_number = Some(TicketNumber::new(number));
        self
    }

    /// Set the price
    #[must_use]
    pub const fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the issue date
    #[must_use]
    pub const fn issue_date(mut self, issue_date: DateTime<Utc>) -> Self {
        self.issue_date = Some(issue_date);
        self
    }

    /// Mark the ticket as paid with the given method
    #[must_use]
    pub const fn paid(mut self, method: PaymentMethod) -> Self {
        self.is_paid = true;
        self.payment_method = Some(method);
        self
    }

    /// Set instructions for the valet
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the ticket type
    #[must_use]
    pub fn ticket_type(mut self, ticket_type: impl Into<String>) -> Self {
        self.ticket_type = Some(ticket_type.into());
        self
    }

    /// Build the ticket
    pub fn build(self) -> Ticket {
        Ticket {
            id: TicketId::new(),
            ticket_number: self
                .ticket_number
                .unwrap_or_else(|| TicketNumber::from_sequence(1)),
            price: self.price.unwrap_or_else(|| Decimal::new(2, 0)),
            issue_date: self.issue_date.unwrap_or_else(Utc::now),
            company_name: String::new(),
            is_paid: self.is_paid,
            instructions: self.instructions,
            ticket_type: Some(
                self.ticket_type
                    .unwrap_or_else(|| DEFAULT_TICKET_TYPE.to_string()),
            ),
            payment_method: self.payment_method,
        }
    }
}

/// Builder for creating CarRequest instances
#[derive(Default)]
pub struct CarRequestBuilder {
    ticket_id: Option<TicketId>,
    status: Option<RequestStatus>,
    request_time: Option<DateTime<Utc>>,
}

impl CarRequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket the request is for
    #[must_use]
    pub const fn ticket(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set `request_time` timestamp
    #[must_use]
    pub const fn request_time(mut self, request_time: DateTime<Utc>) -> Self {
        self.request_time = Some(request_time);
        self
    }

    /// Build the request
    pub fn build(self) -> CarRequest {
        CarRequest {
            id: RequestId::new(),
            ticket_id: self.ticket_id.unwrap_or_default(),
            status: self.status.unwrap_or(RequestStatus::Pending),
            request_time: self.request_time.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_builder() {
        let ticket = TicketBuilder::new()
            .number("00042")
            .price(Decimal::new(5, 0))
            .ticket_type("VIP")
            .instructions("Keys in glovebox")
            .paid(PaymentMethod::Visa)
            .build();

        assert_eq!(ticket.ticket_number.as_str(), "00042");
        assert_eq!(ticket.price, Decimal::new(5, 0));
        assert_eq!(ticket.ticket_type.as_deref(), Some("VIP"));
        assert!(ticket.is_paid);
        assert_eq!(ticket.payment_method, Some(PaymentMethod::Visa));
    }

    #[test]
    fn test_car_request_builder() {
        let ticket_id = TicketId::new();
        let request = CarRequestBuilder::new()
            .ticket(ticket_id)
            .status(RequestStatus::Accepted)
            .build();

        assert_eq!(request.ticket_id, ticket_id);
        assert_eq!(request.status, RequestStatus::Accepted);
    }
}
