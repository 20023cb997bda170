//! Console rendering of a slot queue. Reads engine state only.

use colored::Colorize;
use tabled::{Table, Tabled};

use opd_queue_cell::{Priority, PriorityUpgrade, Slot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityCell {
    pub priority: Priority,
    pub upgraded: bool,
}

#[derive(Debug, Clone, Tabled)]
pub struct QueueRow {
    #[tabled(rename = "Pos")]
    pub position: usize,
    #[tabled(rename = "Token ID")]
    pub token_id: String,
    #[tabled(rename = "Patient Name")]
    pub patient_name: String,
    #[tabled(rename = "Priority")]
    #[tabled(display = "paint_priority")]
    pub priority: PriorityCell,
}

/// Upgraded patients in green, emergencies in red, everyone else in blue.
fn paint_priority(cell: &PriorityCell) -> String {
    let label = cell.priority.as_str();
    if cell.upgraded {
        label.green().bold().to_string()
    } else if cell.priority == Priority::Emergency {
        label.red().to_string()
    } else {
        label.blue().to_string()
    }
}

pub fn queue_rows(slot: &Slot, upgrade: Option<&PriorityUpgrade>) -> Vec<QueueRow> {
    let upgraded_token = upgrade.map(|u| u.token_id.as_str());
    slot.tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| QueueRow {
            position: idx + 1,
            token_id: token.token_id.clone(),
            patient_name: token.patient_name.clone(),
            priority: PriorityCell {
                priority: token.priority,
                upgraded: upgraded_token == Some(token.token_id.as_str()),
            },
        })
        .collect()
}

pub fn render_queue(slot: &Slot, upgrade: Option<&PriorityUpgrade>) -> String {
    Table::new(queue_rows(slot, upgrade)).to_string()
}

pub fn print_queue(title: &str, slot: &Slot, upgrade: Option<&PriorityUpgrade>) {
    println!("\n{}", title.bold());
    println!("{}", render_queue(slot, upgrade));

    match upgrade {
        Some(upgrade) => println!(
            "{}",
            format!(
                "{} ({}) was upgraded from {} to {}.",
                upgrade.patient_name, upgrade.token_id, upgrade.previous_priority, upgrade.new_priority
            )
            .green()
        ),
        None => println!("{}", "No starvation upgrade was needed.".dimmed()),
    }
}

pub fn print_step(message: &str, priority: Priority) {
    let line = format!("➜ {}", message);
    match priority {
        Priority::Emergency | Priority::PaidPriority => println!("{}", line.red().bold()),
        _ => println!("{}", line.yellow()),
    }
}
