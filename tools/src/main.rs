//! plan-analyzer: command-line front end for the forecasting engine.
//!
//! Usage:
//!   plan-analyzer runway --cash 420000 --burn 55000 --revenue 21000 --growth 0.05
//!   plan-analyzer variance --plan plan.json --actual actual.json --stage series_a
//!
//! Both modes print a JSON report to stdout. `--config <path>` loads
//! config overrides, `--no-scenarios` skips scenario generation in
//! runway mode.

use anyhow::{bail, Context, Result};
use finplan_core::{
    clock::{Clock, SystemClock},
    config::EngineConfig,
    projection::RunwayInputs,
    record::MonthlyFinancialRecord,
    types::CompanyStage,
    ForecastEngine,
};
use std::env;
use std::fs;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str);

    let config = match find_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = ForecastEngine::new(config)?;
    let as_of = SystemClock.now();

    match mode {
        Some("runway") => run_runway(&engine, &args, as_of),
        Some("variance") => run_variance(&engine, &args, as_of),
        _ => {
            eprintln!("usage: plan-analyzer <runway|variance> [options]");
            eprintln!("  runway   --cash N --burn N [--revenue N] [--growth F] [--no-scenarios]");
            eprintln!("  variance --plan FILE --actual FILE [--stage STAGE]");
            eprintln!("  common   [--config FILE]");
            bail!("missing or unknown mode");
        }
    }
}

fn run_runway(
    engine: &ForecastEngine,
    args: &[String],
    as_of: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let inputs = RunwayInputs {
        cash_balance: parse_arg(args, "--cash", 0.0),
        monthly_burn_rate: parse_arg(args, "--burn", 0.0),
        monthly_revenue: parse_arg(args, "--revenue", 0.0),
        growth_rate: parse_arg(args, "--growth", 0.0),
    };
    let include_scenarios = !args.iter().any(|a| a == "--no-scenarios");

    let analysis = engine.calculate_runway(&inputs, include_scenarios, as_of)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn run_variance(
    engine: &ForecastEngine,
    args: &[String],
    as_of: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let plan_path = find_arg(args, "--plan").context("--plan <file> is required")?;
    let actual_path = find_arg(args, "--actual").context("--actual <file> is required")?;
    let stage = match find_arg(args, "--stage") {
        Some(key) => CompanyStage::parse(key)?,
        None => CompanyStage::Seed,
    };

    let planned = load_records(plan_path)?;
    let actual = load_records(actual_path)?;

    let report = engine.analyze_variance(&planned, &actual, stage, as_of)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_records(path: &str) -> Result<Vec<MonthlyFinancialRecord>> {
    let content = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse records in {path}"))
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
