//! # Affiliate Ledger Runtime
//!
//! Replays a session script against the affiliate ledger and prints one JSON
//! report per step on stdout.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry (tracing, metrics)
//! 3. Load the session script (`AL_SCRIPT`, or the first argument)
//! 4. Build the container and seed the chain
//! 5. Replay the steps and print the reports
//! 6. Print the final ledger state

use anyhow::{Context, Result};
use ledger_runtime::{run_script, seed_chain, LedgerContainer, RuntimeConfig, Script};
use ledger_telemetry::init_telemetry;
use std::path::PathBuf;
use tracing::{info, warn};

use affiliate_ledger::ports::inbound::LedgerApi;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = RuntimeConfig::from_env().context("invalid runtime configuration")?;
    init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    if let Some(arg) = std::env::args().nth(1) {
        config.script_path = Some(PathBuf::from(arg));
    }
    let script_path = config
        .script_path
        .clone()
        .context("no session script given (set AL_SCRIPT or pass a path)")?;

    info!(
        version = affiliate_ledger::VERSION,
        script = %script_path.display(),
        "starting affiliate ledger runtime"
    );

    let script = Script::load(&script_path)?;
    let container = LedgerContainer::build(&config, script.start_time);
    seed_chain(&container, &script);

    let reports = run_script(&container, &script).await?;
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }

    let rejected = reports.iter().filter(|r| !r.is_ok()).count();
    if rejected > 0 {
        warn!(rejected, "some steps were rejected");
    }

    let state = container.service.snapshot().await?;
    println!("{}", serde_json::to_string_pretty(&state)?);

    let stats = container.service.stats().await;
    info!(
        committed = stats.committed,
        rejected = stats.rejected,
        transfers = stats.transfers_executed,
        "session complete"
    );
    Ok(())
}
