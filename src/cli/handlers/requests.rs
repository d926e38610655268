//! Car request command handlers

use super::base::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::core::RequestStatus;
use crate::error::Result;
use std::path::Path;

/// Handle the request command
pub async fn handle_request(
    ticket_number: &str,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let request = ctx.core.submit_request(ticket_number).await?;

    if formatter.is_json() {
        formatter.json(&request)?;
    } else {
        ctx.success(&format!(
            "Your request for car #{} has been sent to the valet",
            ticket_number.trim()
        ));
    }
    Ok(())
}

/// Handle the queue command
pub async fn handle_queue(data_dir: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let queue = ctx.core.pending_queue().await?;

    if formatter.is_json() {
        return formatter.json(&queue);
    }
    if queue.is_empty() {
        ctx.info("No cars waiting");
        return Ok(());
    }

    ctx.info(&format!("{:<8} {:<8} {:>8}", "SINCE", "NUMBER", "PRICE"));
    for queued in &queue {
        let (number, price) = queued.ticket.as_ref().map_or_else(
            || ("?".to_string(), "-".to_string()),
            |t| (t.ticket_number.to_string(), t.price.to_string()),
        );
        ctx.info(&format!(
            "{:<8} {:<8} {:>8}",
            queued.request.request_time.format("%H:%M"),
            number,
            price
        ));
    }
    ctx.info(&format!("\n{} car(s) waiting", queue.len()));
    Ok(())
}

/// Handle the accept and complete commands
pub async fn handle_advance(
    ticket_number: &str,
    status: RequestStatus,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let ticket = ctx.ticket(ticket_number).await?;
    let request = ctx.open_request(&ticket).await?;

    if request.status == status {
        ctx.warning(&format!(
            "Request for ticket #{} is already {}",
            ticket.ticket_number, status
        ));
    }
    ctx.core.update_request_status(&request.id, status).await?;

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "ticket_number": ticket.ticket_number,
            "request_id": request.id,
            "request_status": status,
        }))?;
    } else {
        let message = match status {
            RequestStatus::Accepted => "accepted; the valet is fetching the car",
            RequestStatus::Completed => "completed; the car has been handed over",
            RequestStatus::Pending => "reset to pending",
        };
        ctx.success(&format!("Request for ticket #{} {}", ticket.ticket_number, message));
    }
    Ok(())
}
