//! Revenue figures over paid tickets

use crate::core::{PaymentMethod, Ticket};
use crate::error::{Result, ValetError};
use crate::storage::TicketRepository;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reporting window, counted back from the start of the current day (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Period {
    #[default]
    Today,
    Week,
    Month,
}

impl Period {
    /// First instant included in the window
    #[must_use]
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
        match self {
            Self::Today => midnight,
            Self::Week => midnight - Days::new(7),
            Self::Month => midnight
                .checked_sub_months(Months::new(1))
                .unwrap_or(midnight),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(ValetError::validation(format!(
                "Invalid period: {other}. Must be one of: today, week, month"
            ))),
        }
    }
}

/// Revenue of a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub total: Decimal,
    pub cash: Decimal,
    pub visa: Decimal,
}

/// Totals over a set of paid tickets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevenueReport {
    pub total: Decimal,
    pub cash: Decimal,
    pub visa: Decimal,
    pub cash_count: usize,
    pub visa_count: usize,
    pub total_count: usize,
    /// Newest day first
    pub daily: Vec<DailyRevenue>,
}

impl RevenueReport {
    /// Aggregate paid tickets; unpaid ones are ignored
    ///
    /// Paid tickets without a payment method count towards the total only.
    #[must_use]
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut report = Self::default();
        let mut days: BTreeMap<NaiveDate, DailyRevenue> = BTreeMap::new();

        for ticket in tickets.into_iter().filter(|t| t.is_paid) {
            let date = ticket.issue_date.date_naive();
            let day = days.entry(date).or_insert_with(|| DailyRevenue {
                date,
                total: Decimal::ZERO,
                cash: Decimal::ZERO,
                visa: Decimal::ZERO,
            });

            report.total += ticket.price;
            report.total_count += 1;
            day.total += ticket.price;

            match ticket.payment_method {
                Some(PaymentMethod::Cash) => {
                    report.cash += ticket.price;
                    report.cash_count += 1;
                    day.cash += ticket.price;
                },
                Some(PaymentMethod::Visa) => {
                    report.visa += ticket.price;
                    report.visa_count += 1;
                    day.visa += ticket.price;
                },
                None => {},
            }
        }

        report.daily = days.into_values().rev().collect();
        report
    }
}

/// Report over paid tickets issued at or after `start`
pub async fn fetch_revenue(tickets: &TicketRepository, start: DateTime<Utc>) -> Result<RevenueReport> {
    let paid = tickets
        .fetch_by_date_range(start, Some(true))
        .await
        .inspect_err(|e| tracing::error!("Failed to fetch revenue data: {}", e))?;
    tracing::debug!("Computing revenue over {} paid tickets", paid.len());
    Ok(RevenueReport::from_tickets(&paid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TicketBuilder;
    use crate::test_utils::TestDataBuilder;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_period_start() {
        let now = at(15, 13);
        assert_eq!(Period::Today.start(now), at(15, 0));
        assert_eq!(Period::Week.start(now), at(8, 0));
        assert_eq!(
            Period::Month.start(now),
            Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()
        );
        assert_eq!("Week".parse::<Period>().unwrap(), Period::Week);
        assert!("year".parse::<Period>().is_err());
    }

    #[test]
    fn test_report_totals_and_daily_breakdown() {
        let tickets = vec![
            TicketBuilder::new()
                .price(Decimal::new(2, 0))
                .paid(PaymentMethod::Cash)
                .issue_date(at(1, 9))
                .build(),
            TicketBuilder::new()
                .price(Decimal::new(5, 0))
                .paid(PaymentMethod::Visa)
                .issue_date(at(1, 18))
                .build(),
            TicketBuilder::new()
                .price(Decimal::new(25, 1))
                .paid(PaymentMethod::Cash)
                .issue_date(at(2, 10))
                .build(),
            TicketBuilder::new()
                .price(Decimal::new(3, 0))
                .issue_date(at(2, 11))
                .build(),
        ];

        let report = RevenueReport::from_tickets(&tickets);
        assert_eq!(report.total, Decimal::new(95, 1));
        assert_eq!(report.cash, Decimal::new(45, 1));
        assert_eq!(report.visa, Decimal::new(5, 0));
        assert_eq!((report.cash_count, report.visa_count, report.total_count), (2, 1, 3));

        let dates: Vec<_> = report.daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![at(2, 0).date_naive(), at(1, 0).date_naive()]);
        assert_eq!(report.daily[1].total, Decimal::new(7, 0));
        assert_eq!(report.daily[0].visa, Decimal::ZERO);
    }

    #[test]
    fn test_empty_report() {
        let report = RevenueReport::from_tickets(&Vec::<Ticket>::new());
        assert_eq!(report, RevenueReport::default());
    }

    #[tokio::test]
    async fn test_fetch_revenue_filters_by_date_and_payment() {
        let now = Utc::now();
        let gateway = TestDataBuilder::new()
            .with_paid_ticket("00001", Decimal::new(2, 0), PaymentMethod::Cash, now)
            .with_paid_ticket(
                "00002",
                Decimal::new(5, 0),
                PaymentMethod::Visa,
                now - Duration::days(40),
            )
            .with_ticket("00003", Decimal::new(3, 0))
            .build_gateway();
        let tickets = TicketRepository::new(gateway);

        let report = fetch_revenue(&tickets, now - Duration::days(1)).await.unwrap();
        assert_eq!(report.total, Decimal::new(2, 0));
        assert_eq!(report.total_count, 1);

        let wider = fetch_revenue(&tickets, now - Duration::days(60)).await.unwrap();
        assert_eq!(wider.total, Decimal::new(7, 0));
        assert_eq!(wider.visa_count, 1);
    }
}
