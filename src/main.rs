use anyhow::Context;
use clap::Parser;
use metalabel::config::ConfigManager;
use metalabel::data::CsvConnector;
use metalabel::pipeline;
use std::path::PathBuf;

/// Label, train and size over a CSV of bars with a primary signal column.
#[derive(Parser, Debug)]
#[command(name = "metalabel", version)]
struct Args {
    /// CSV with open/high/low/close/signal columns
    bars: PathBuf,

    /// TOML config; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prefix for environment overrides, e.g. METALABEL__BOCD__HAZARD_RATE
    #[arg(long, default_value = "METALABEL")]
    env_prefix: String,

    /// Write the JSON summary here instead of stdout
    #[arg(short, long)]
    report: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    min_rows: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let manager = ConfigManager::new();
    manager
        .load_layered(args.config.as_deref(), &args.env_prefix)
        .context("loading configuration")?;
    let config = manager.get();

    let bars = CsvConnector::load_bars(&args.bars, args.min_rows)
        .with_context(|| format!("loading bars from {}", args.bars.display()))?;
    log::info!("Loaded {} bars from {}", bars.len(), args.bars.display());

    let summary = pipeline::run(&config, &bars, None)?;
    log::info!(
        "{} samples, {} windows, last size {:.4}",
        summary.samples,
        summary.windows.len(),
        summary.last_size.final_size
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match args.report {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
