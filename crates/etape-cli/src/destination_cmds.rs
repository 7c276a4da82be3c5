//! `etape destination` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use etape_db::queries::destinations;

use crate::DestinationCommands;

pub async fn run(pool: &PgPool, command: DestinationCommands) -> Result<()> {
    match command {
        DestinationCommands::Add {
            name,
            lat,
            lng,
            address,
            category,
            description,
        } => {
            let destination = destinations::insert_destination(
                pool,
                &name,
                lat,
                lng,
                address.as_deref(),
                category.as_deref(),
                description.as_deref(),
            )
            .await?;
            println!(
                "Added destination {} ({}) at {:.4}, {:.4}",
                destination.id, destination.name, destination.latitude, destination.longitude
            );
        }
        DestinationCommands::List => {
            let all = destinations::list_destinations(pool).await?;
            if all.is_empty() {
                println!("No destinations.");
                return Ok(());
            }
            println!("{:<6} {:<24} {:>9} {:>9}  CATEGORY", "ID", "NAME", "LAT", "LNG");
            for d in &all {
                println!(
                    "{:<6} {:<24} {:>9.4} {:>9.4}  {}",
                    d.id,
                    d.name,
                    d.latitude,
                    d.longitude,
                    d.category.as_deref().unwrap_or("-")
                );
            }
        }
        DestinationCommands::Remove { id } => {
            let referencing = destinations::count_referencing_steps(pool, id).await?;
            if referencing > 0 {
                anyhow::bail!(
                    "destination {id} is referenced by {referencing} step(s); remove them first"
                );
            }
            destinations::delete_destination(pool, id).await?;
            println!("Removed destination {id}.");
        }
    }
    Ok(())
}
