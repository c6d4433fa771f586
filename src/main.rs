use anyhow::Context;
use clap::Parser;

use cspf_te_engine::build_engine;
use cspf_te_engine::domain::cspf::registry::engine_registry::EngineRegistry;
use cspf_te_engine::domain::scenario::ScenarioRunner;
use cspf_te_engine::loader::parser::load_scenario;
use cspf_te_engine::logger;

/// Replays recorded link events and tunnel requests against the CSPF engine and prints
/// the outcome of every step as JSON.
#[derive(Debug, Parser)]
#[command(name = "cspf-replay", version)]
struct Args {
    /// Engine configuration (JSON). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Scenario to replay (JSON).
    #[arg(short, long)]
    scenario: String,

    /// Run the engine on its own thread and talk to it through a proxy.
    #[arg(long)]
    threaded: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    let engine = build_engine(args.config.as_deref()).context("failed to build the engine")?;
    let scenario = load_scenario(&args.scenario).with_context(|| format!("failed to load scenario '{}'", args.scenario))?;

    let report = if args.threaded {
        let registry = EngineRegistry::new();
        let proxy = registry.spawn_engine("replay", Box::new(engine))?;
        let report = ScenarioRunner::new(proxy).run(&scenario)?;
        registry.shutdown("replay")?;
        report
    } else {
        ScenarioRunner::new(engine).run(&scenario)?
    };

    log::info!("Replayed {} steps, {} tunnels remain.", report.outcomes.len(), report.tunnels.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
