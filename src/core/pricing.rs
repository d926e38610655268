use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Ticket type used when none is given or the given one is unknown
pub const DEFAULT_TICKET_TYPE: &str = "STANDARD";

/// Price per ticket type
///
/// Type keys are case-insensitive. Prices are authoritative: the price of a
/// new ticket always comes from this table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    prices: BTreeMap<String, Decimal>,
}

impl Default for PriceTable {
    fn default() -> Self {
        let prices = [
            (DEFAULT_TICKET_TYPE, Decimal::new(20, 1)),
            ("PREMIUM", Decimal::new(30, 1)),
            ("VIP", Decimal::new(50, 1)),
            ("EVENT", Decimal::new(25, 1)),
        ]
        .into_iter()
        .map(|(name, price)| (name.to_string(), price))
        .collect();
        Self { prices }
    }
}

impl PriceTable {
    /// Default table with configured prices layered on top
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<String, Decimal>) -> Self {
        let mut table = Self::default();
        for (name, price) in overrides {
            table.prices.insert(name.to_uppercase(), *price);
        }
        table
    }

    /// Canonical (upper-case) form of a type key
    fn normalize(ticket_type: &str) -> String {
        ticket_type.trim().to_uppercase()
    }

    /// Price for a ticket type, falling back to the standard price
    #[must_use]
    pub fn price_for(&self, ticket_type: &str) -> Decimal {
        self.prices
            .get(&Self::normalize(ticket_type))
            .or_else(|| self.prices.get(DEFAULT_TICKET_TYPE))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prices() {
        let table = PriceTable::default();
        assert_eq!(table.price_for("standard"), Decimal::new(2, 0));
        assert_eq!(table.price_for("Premium"), Decimal::new(3, 0));
        assert_eq!(table.price_for("VIP"), Decimal::new(5, 0));
        assert_eq!(table.price_for("event"), Decimal::new(25, 1));
    }

    #[test]
    fn test_unknown_type_uses_standard() {
        let table = PriceTable::default();
        assert_eq!(table.price_for("helicopter"), table.price_for(DEFAULT_TICKET_TYPE));
    }

    #[test]
    fn test_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("vip".to_string(), Decimal::new(75, 1));
        overrides.insert("weekend".to_string(), Decimal::new(4, 0));

        let table = PriceTable::with_overrides(&overrides);
        assert_eq!(table.price_for("VIP"), Decimal::new(75, 1));
        assert_eq!(table.price_for("weekend"), Decimal::new(4, 0));
        assert_eq!(table.price_for("premium"), Decimal::new(3, 0));
        assert_eq!(table.prices.len(), 5);
        assert!(table.prices.contains_key("WEEKEND"));
    }
}
