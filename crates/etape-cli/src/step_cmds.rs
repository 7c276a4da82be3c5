//! `etape step` subcommands, including the coordinator-driven `move`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use etape_core::model::StepKey;
use etape_core::reorder::{PgOrderPersistence, ReorderCoordinator, ReorderOutcome};
use etape_core::service::load_itinerary;
use etape_core::store::SequenceStore;
use etape_db::queries::{activities, steps};

use crate::StepCommands;

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.parse()
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))
}

pub async fn run(pool: &PgPool, command: StepCommands) -> Result<()> {
    match command {
        StepCommands::Add {
            destination_id,
            date,
            notes,
        } => {
            let date = parse_date(&date)?;
            let step = steps::insert_step(pool, destination_id, date, notes.as_deref()).await?;
            println!(
                "Added step {} on {} at position {}",
                step.id, step.date, step.position
            );
        }
        StepCommands::List => {
            let itinerary = load_itinerary(pool).await?;
            if itinerary.is_empty() {
                println!("No steps.");
                return Ok(());
            }
            println!("{:<5} {:<6} {:<12} {:<24} NOTES", "POS", "ID", "DATE", "DESTINATION");
            for step in &itinerary {
                println!(
                    "{:<5} {:<6} {:<12} {:<24} {}",
                    step.position,
                    step.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    step.date,
                    step.destination.name,
                    step.notes.as_deref().unwrap_or("")
                );
            }
        }
        StepCommands::Show { id } => {
            let step = steps::get_step_with_destination(pool, id)
                .await?
                .with_context(|| format!("step {id} not found"))?;
            println!("Step {} ({})", step.id, step.date);
            println!("  position:    {}", step.position);
            println!("  destination: {} ({})", step.destination_name, step.destination_id);
            if let Some(notes) = &step.notes {
                println!("  notes:       {notes}");
            }
            if let Some(mode) = step.transport_mode {
                println!("  transport:   {mode}");
            }
            let step_activities = activities::list_activities_for_step(pool, id).await?;
            if !step_activities.is_empty() {
                println!("  activities:");
                for activity in &step_activities {
                    println!(
                        "    {}. {} {}",
                        activity.position,
                        activity.name,
                        activity
                            .category
                            .map_or_else(String::new, |c| format!("({c})"))
                    );
                }
            }
        }
        StepCommands::Edit {
            id,
            date,
            destination_id,
            notes,
        } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let step = steps::patch_step(pool, id, date, destination_id, notes.as_deref()).await?;
            println!("Updated step {} ({})", step.id, step.date);
        }
        StepCommands::Remove { id } => {
            steps::delete_step(pool, id).await?;
            println!("Removed step {id}.");
        }
        StepCommands::Move {
            source_id,
            target_id,
        } => {
            let itinerary = load_itinerary(pool).await?;
            let store = SequenceStore::with_steps(itinerary);
            let backend = Arc::new(PgOrderPersistence::new(pool.clone()));
            let coordinator = ReorderCoordinator::new(store.clone(), backend);

            let outcome = coordinator
                .reorder(&StepKey::Id(source_id), &StepKey::Id(target_id))
                .await?;
            match outcome {
                ReorderOutcome::Applied => {
                    println!("Moved step {source_id} to the slot of step {target_id}:");
                    for step in store.current() {
                        println!(
                            "  {}. {} {}",
                            step.position, step.date, step.destination.name
                        );
                    }
                }
                ReorderOutcome::Noop => {
                    println!("Nothing to do.");
                }
            }
        }
    }
    Ok(())
}
