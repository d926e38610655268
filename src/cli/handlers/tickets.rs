//! Ticket command handlers

use super::base::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::core::{CarRequest, PaymentMethod, RequestStatus, Ticket};
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// A ticket with its most relevant request, as printed by list and show
#[derive(Debug, Serialize)]
struct TicketView<'a> {
    #[serde(flatten)]
    ticket: &'a Ticket,
    request: Option<&'a CarRequest>,
}

fn payment_label(ticket: &Ticket) -> String {
    match (ticket.is_paid, ticket.payment_method) {
        (true, Some(method)) => format!("paid ({method})"),
        (true, None) => "paid".to_string(),
        (false, _) => "unpaid".to_string(),
    }
}

/// Handle the generate command
pub async fn handle_generate(
    ticket_type: &str,
    instructions: Option<String>,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let ticket = ctx.core.generate_ticket(ticket_type, instructions).await?;

    if formatter.is_json() {
        formatter.json(&ticket)?;
    } else {
        ctx.success(&format!(
            "Issued ticket #{} ({}, {})",
            ticket.ticket_number,
            ticket.ticket_type.as_deref().unwrap_or_default(),
            ticket.price
        ));
        if let Some(instructions) = &ticket.instructions {
            ctx.info(&format!("Instructions: {instructions}"));
        }
    }
    Ok(())
}

/// Handle the pay command
pub async fn handle_pay(
    ticket_number: &str,
    method: PaymentMethod,
    unpaid: bool,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let ticket = ctx.ticket(ticket_number).await?;

    let (is_paid, method) = if unpaid { (false, None) } else { (true, Some(method)) };
    ctx.core
        .update_payment_status(&ticket.id, is_paid, method)
        .await?;

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "ticket_number": ticket.ticket_number,
            "is_paid": is_paid,
            "payment_method": method,
        }))?;
    } else if is_paid {
        ctx.success(&format!(
            "Ticket #{} marked as paid ({})",
            ticket.ticket_number,
            method.map(|m| m.as_str()).unwrap_or_default()
        ));
    } else {
        ctx.success(&format!("Ticket #{} marked as unpaid", ticket.ticket_number));
    }
    Ok(())
}

/// Handle the delete command
pub async fn handle_delete(
    ticket_number: &str,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let ticket = ctx.ticket(ticket_number).await?;
    ctx.core.delete_ticket(&ticket.id).await?;

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "deleted": ticket.ticket_number,
        }))?;
    } else {
        ctx.success(&format!(
            "Deleted ticket #{} and its car requests",
            ticket.ticket_number
        ));
    }
    Ok(())
}

/// Handle the list command
pub async fn handle_list(
    pending: bool,
    unpaid: bool,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let state = ctx.core.snapshot().await;

    let mut views: Vec<TicketView<'_>> = state
        .tickets
        .iter()
        .map(|ticket| TicketView {
            ticket,
            request: state
                .active_request_for_ticket(&ticket.id)
                .or_else(|| state.request_for_ticket(&ticket.id)),
        })
        .filter(|view| !unpaid || !view.ticket.is_paid)
        .filter(|view| {
            !pending || view.request.is_some_and(|r| r.status == RequestStatus::Pending)
        })
        .collect();
    views.sort_by(|a, b| a.ticket.ticket_number.cmp(&b.ticket.ticket_number));

    if formatter.is_json() {
        return formatter.json(&views);
    }
    if views.is_empty() {
        ctx.info("No tickets found");
        return Ok(());
    }

    ctx.info(&format!(
        "{:<8} {:<10} {:>8} {:<14} {}",
        "NUMBER", "TYPE", "PRICE", "PAYMENT", "REQUEST"
    ));
    for view in &views {
        let request = view
            .request
            .map_or_else(|| "-".to_string(), |r| formatter.status(r.status).to_string());
        ctx.info(&format!(
            "{:<8} {:<10} {:>8} {:<14} {}",
            view.ticket.ticket_number.as_str(),
            view.ticket.ticket_type.as_deref().unwrap_or("-"),
            view.ticket.price.to_string(),
            payment_label(view.ticket),
            request
        ));
    }
    ctx.info(&format!("\n{} ticket(s)", views.len()));
    Ok(())
}

/// Handle the show command
pub async fn handle_show(
    ticket_number: &str,
    data_dir: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ctx = HandlerContext::new(data_dir, *formatter).await?;
    let ticket = ctx.ticket(ticket_number).await?;
    let state = ctx.core.snapshot().await;
    let request = state
        .active_request_for_ticket(&ticket.id)
        .or_else(|| state.request_for_ticket(&ticket.id));

    if formatter.is_json() {
        return formatter.json(&TicketView {
            ticket: &ticket,
            request,
        });
    }

    ctx.info(&format!("Ticket #{}", ticket.ticket_number));
    ctx.info(&format!("  Company:  {}", ticket.company_name));
    ctx.info(&format!(
        "  Type:     {}",
        ticket.ticket_type.as_deref().unwrap_or("-")
    ));
    ctx.info(&format!("  Price:    {}", ticket.price));
    ctx.info(&format!(
        "  Issued:   {}",
        ticket.issue_date.format("%Y-%m-%d %H:%M")
    ));
    ctx.info(&format!("  Payment:  {}", payment_label(&ticket)));
    if let Some(instructions) = &ticket.instructions {
        ctx.info(&format!("  Notes:    {instructions}"));
    }
    match request {
        Some(request) => ctx.info(&format!(
            "  Request:  {} since {}",
            formatter.status(request.status),
            request.request_time.format("%H:%M")
        )),
        None => ctx.info("  Request:  -"),
    }
    Ok(())
}
