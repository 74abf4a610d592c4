//! `gas-sim`: replay a scenario file against a player state.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use gas_sim::{ScenarioLoader, ScenarioRunner, logging};
use player_state::PlayerStateConfig;

#[derive(Parser)]
#[command(name = "gas-sim")]
#[command(about = "Replay attribute and tag changes against a player state", long_about = None)]
#[command(version)]
struct Cli {
    /// Scenario file (RON).
    scenario: PathBuf,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Also write logs to this directory.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::setup_logging(cli.log_dir.as_deref())?;

    let scenario = ScenarioLoader::load(&cli.scenario)?;
    let report = ScenarioRunner::new(scenario, PlayerStateConfig::from_env()).run()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
