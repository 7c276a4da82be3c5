//! Read-only itinerary views: month buckets and the current step.

use anyhow::Result;
use sqlx::PgPool;

use etape_core::model::StepGroup;
use etape_core::sequence::{Clock, SystemClock, bucket_by_month, current_step};
use etape_core::service::load_itinerary;

pub async fn cmd_months(pool: &PgPool) -> Result<()> {
    let itinerary = load_itinerary(pool).await?;
    if itinerary.is_empty() {
        println!("No steps.");
        return Ok(());
    }

    for (key, groups) in bucket_by_month(&itinerary) {
        println!("{} ({key})", key.label_fr());
        for group in &groups {
            match group {
                StepGroup::Single(step) => {
                    println!("  {} {} (pos {})", step.date, step.destination.name, step.position);
                }
                StepGroup::Range { steps } => {
                    println!(
                        "  {} – {} {} ({} days)",
                        group.start_date(),
                        group.end_date(),
                        group.destination().name,
                        steps.len()
                    );
                }
            }
        }
    }
    Ok(())
}

pub async fn cmd_current(pool: &PgPool) -> Result<()> {
    let itinerary = load_itinerary(pool).await?;
    let today = SystemClock.today();

    match current_step(&itinerary, today) {
        Some(step) => {
            println!(
                "Current step (as of {today}): {} at {} (position {})",
                step.date, step.destination.name, step.position
            );
        }
        None => {
            println!("No current step: the itinerary has not started yet.");
        }
    }
    Ok(())
}
