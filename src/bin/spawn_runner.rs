//! Spawn Runner
//!
//! Populates a scenario's rooms and prints the spawn result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use arc_spawn::events::TracingSink;
use arc_spawn::scenario::Scenario;
use clap::Parser;

/// Spawn Runner - place a scenario's entities and report where they went
#[derive(Parser, Debug)]
#[command(name = "spawn_runner")]
#[command(about = "Run one spawn request from a TOML scenario and print the result")]
struct Args {
    /// Scenario file with rooms, selection tables and a request
    scenario: PathBuf,

    /// Random seed for deterministic runs (overrides the scenario)
    #[arg(long)]
    seed: Option<u64>,

    /// Treat every scenario room as one connected target
    #[arg(long)]
    split: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("arc_spawn=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Spawn run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> arc_spawn::core::Result<String> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(seed) = args.seed {
        scenario.engine.seed = Some(seed);
    }
    tracing::info!(
        scenario = %args.scenario.display(),
        rooms = scenario.rooms.len(),
        split = args.split,
        "Loaded scenario"
    );

    let engine = scenario.build_engine(Arc::new(TracingSink));
    let result = engine.populate(scenario.target(args.split), &scenario.request).await?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    Ok(output)
}
