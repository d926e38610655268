use super::base::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::error::Result;
use crate::revenue::{Period, fetch_revenue};
use chrono::Utc;
use std::path::Path;

/// Handle the revenue command
pub async fn handle_revenue(
    period: Period,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let start = period.start(Utc::now());
    let report = fetch_revenue(ctx.core.ticket_repository(), start).await?;

    if formatter.is_json() {
        return formatter.json(&serde_json::json!({
            "period": period.as_str(),
            "since": start,
            "report": report,
        }));
    }

    ctx.info(&format!(
        "Revenue since {} ({})",
        start.format("%Y-%m-%d"),
        period
    ));
    ctx.info(&format!(
        "  Total: {} from {} ticket(s)",
        report.total, report.total_count
    ));
    ctx.info(&format!("  Cash:  {} ({})", report.cash, report.cash_count));
    ctx.info(&format!("  Visa:  {} ({})", report.visa, report.visa_count));
    if !report.daily.is_empty() {
        ctx.info("\nBy day:");
        for day in &report.daily {
            ctx.info(&format!(
                "  {}  total {}  cash {}  visa {}",
                day.date, day.total, day.cash, day.visa
            ));
        }
    }
    Ok(())
}
