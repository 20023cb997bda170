use anyhow::Context;
use colored::Colorize;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod display;

use opd_queue_cell::{AllocationEngine, Priority, Slot};

const DOCTOR_ID: &str = "Dr. Smith";
const SLOT_ID: &str = "S1";

const ARRIVALS: [(&str, Priority, &str); 4] = [
    ("Alice", Priority::Online, "Booking standard patient 'Alice' (online)"),
    ("John", Priority::WalkIn, "Booking standard patient 'John' (walk-in)"),
    ("Bob", Priority::Emergency, "EMERGENCY ALERT: patient 'Bob' incoming"),
    ("Charlie", Priority::PaidPriority, "PAID PRIORITY: patient 'Charlie' incoming"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("{}", "OPD Simulation (fairness enabled)".cyan().bold());

    let engine = AllocationEngine::new();
    engine
        .set_doctor_schedule(DOCTOR_ID, vec![Slot::new(SLOT_ID, "09:00", "10:00", 5)])
        .await;
    info!("Initialized schedule for {}", DOCTOR_ID);

    for (patient, priority, message) in ARRIVALS {
        display::print_step(message, priority);
        engine.allocate(DOCTOR_ID, SLOT_ID, patient, priority).await?;
    }

    println!("\n{}", "--- Checking for starvation ---".magenta().bold());
    let upgrade = engine.relieve_pressure(DOCTOR_ID, SLOT_ID).await;

    let slots = engine
        .doctor_schedule(DOCTOR_ID)
        .await
        .context("simulated doctor has no schedule")?;
    let slot = slots
        .iter()
        .find(|slot| slot.slot_id == SLOT_ID)
        .context("simulated slot missing from schedule")?;

    display::print_queue(&format!("{}'s live queue (final state)", DOCTOR_ID), slot, upgrade.as_ref());
    println!("\n{}", "Simulation complete.".dimmed());

    Ok(())
}
