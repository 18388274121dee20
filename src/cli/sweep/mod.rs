//! Sweep command - runs one SLA sweep over a fixture file

mod fixtures;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use crate::domain::{Clock, FixedClock, SystemClock};

pub use fixtures::{EntityFixture, Fixtures, LoadedFixtures};

/// Arguments for the sweep command
#[derive(Args, Clone)]
pub struct SweepArgs {
    /// JSON fixture with employees, entities, definitions, steps and instances
    #[arg(long)]
    pub fixtures: PathBuf,

    /// Evaluate deadlines at this instant (RFC 3339) instead of the current time
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

/// Run the sweep and print its report as JSON
pub async fn run(args: SweepArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock::new(now)),
        None => Arc::new(SystemClock),
    };
    let now = clock.now();

    info!(fixtures = %args.fixtures.display(), now = %now, "Loading sweep fixture");
    let loaded = Fixtures::from_path(&args.fixtures)?
        .load(&config, clock)
        .await?;

    let report = loaded.sweeper.run(now).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
