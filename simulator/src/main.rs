use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use oddsbook_simulator::{ScenarioConfig, Simulator};
use std::io::Write as _;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Replays an oddsbook scenario and prints every event as a JSON line.
#[derive(Debug, Parser)]
#[command(name = "oddsbook-simulator", version)]
struct Args {
    /// Path to the scenario YAML file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Validate the scenario and exit without running it.
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Could not read scenario file {}", args.config.display()))?;
    let config: ScenarioConfig =
        serde_yaml::from_str(&raw).context("Could not parse scenario file")?;
    let scenario = config.validate().context("Scenario is invalid")?;
    info!(
        accounts = scenario.accounts.len(),
        batches = scenario.batches.len(),
        event_id = scenario.ledger.event_id,
        "loaded scenario"
    );
    if args.dry_run {
        println!("scenario ok");
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let report = Simulator::new(scenario).run(|event| {
        if write_error.is_some() {
            return;
        }
        let line = serde_json::to_string(event).map_err(anyhow::Error::from);
        if let Err(err) = line.and_then(|line| writeln!(out, "{line}").map_err(Into::into)) {
            write_error = Some(err);
        }
    })?;
    if let Some(err) = write_error {
        return Err(err).context("Could not write event");
    }
    writeln!(out, "{}", serde_json::to_string(&report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments() {
        let args = Args::parse_from([
            "oddsbook-simulator",
            "--config",
            "scenarios/match_result.yaml",
            "--log-format",
            "json",
        ]);
        assert_eq!(args.config, PathBuf::from("scenarios/match_result.yaml"));
        assert!(matches!(args.log_format, LogFormat::Json));
        assert!(!args.dry_run);
    }

    #[test]
    fn requires_config() {
        assert!(Args::try_parse_from(["oddsbook-simulator"]).is_err());
    }
}
