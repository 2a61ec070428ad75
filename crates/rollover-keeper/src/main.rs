use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::time;

use rollover_keeper::config::create_example_config;
use rollover_keeper::{KeeperConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "rollover-keeper")]
#[command(about = "Keeper rotating a rollover strategy through fyToken pools")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: String,

    /// Write an example configuration to --config and exit
    #[arg(long)]
    init_config: bool,

    /// Number of ticks, overriding the configuration
    #[arg(short, long)]
    steps: Option<u64>,

    /// Wall-clock delay between ticks in milliseconds
    #[arg(short, long, default_value = "0")]
    interval_ms: u64,

    /// Dry run mode - report planned actions without applying them
    #[arg(long)]
    dry_run: bool,

    /// Write the strategy's events to this file as JSON lines
    #[arg(short, long)]
    events_out: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" })
    ).init();

    if args.init_config {
        create_example_config(&args.config)
            .with_context(|| format!("Failed to write example config to {}", args.config))?;
        log::info!("Wrote example configuration to {}", args.config);
        return Ok(());
    }

    log::info!("Starting rollover keeper");

    let mut config = KeeperConfig::load(&args.config)
        .with_context(|| format!("Failed to load config file {}", args.config))?;
    if let Some(steps) = args.steps {
        config.simulation.steps = steps;
    }
    let steps = config.simulation.steps;

    if args.dry_run {
        log::warn!("Running in DRY RUN mode - no actions will be applied");
    }

    let mut simulation = Simulation::new(config, args.dry_run)?;
    log::info!("Keeper initialized, running {} ticks", steps);

    let mut events_out = match &args.events_out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => None,
    };

    let mut interval_timer = (args.interval_ms > 0)
        .then(|| time::interval(Duration::from_millis(args.interval_ms)));
    let mut events_written = 0usize;

    for iteration in 1..=steps {
        if let Some(timer) = interval_timer.as_mut() {
            timer.tick().await;
        }

        match simulation.step() {
            Ok(actions) if actions.is_empty() => {
                log::debug!("Tick {}: nothing to do", iteration);
            }
            Ok(actions) => {
                log::info!("Tick {}: {} actions", iteration, actions.len());
                for action in &actions {
                    log::debug!("  {:?}", action);
                }
            }
            Err(e) => {
                // Continue running even if individual ticks fail
                log::error!("Error in keeper tick {}: {}", iteration, e);
            }
        }

        let events = simulation.take_events();
        if let Some(out) = events_out.as_mut() {
            for record in events.records() {
                writeln!(out, "{}", serde_json::to_string(record)?)?;
            }
            events_written += events.len();
        }
    }

    match simulation.claim_rewards() {
        Ok(0) => {}
        Ok(paid) => log::info!("Claimed {} reward tokens for the initial depositor", paid),
        Err(e) => log::warn!("Reward claim failed: {}", e),
    }

    if let Some(out) = events_out.as_mut() {
        for record in simulation.take_events().records() {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
            events_written += 1;
        }
        out.flush()?;
        log::info!("Wrote {} events", events_written);
    }

    let summary = simulation.summary()?;
    log::info!(
        "Finished after {} ticks: phase {:?}, pool {}, value {}, buffer {}, LP {}, supply {}",
        summary.steps,
        summary.phase,
        summary.pool,
        summary.value,
        summary.buffer,
        summary.cached,
        summary.total_supply
    );
    log::info!(
        "Rebalances: {} executed, {} held back",
        summary.rebalances,
        summary.rebalances_held
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
