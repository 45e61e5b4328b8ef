use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use intersection_sim::simulation::{run_comparison, Mode, RuleBase, RunOutcome, SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Fixed-timer vs fuzzy signal control at a four-way intersection")]
struct Cli {
    /// Which policy to run
    #[arg(long, value_enum, default_value_t = RunMode::Compare)]
    mode: RunMode,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u32>,

    /// Expected arrivals per approach per tick
    #[arg(long)]
    arrival_rate: Option<f64>,

    /// Cars discharged per green tick
    #[arg(long)]
    departure_capacity: Option<usize>,

    /// Green duration of the fixed-timer policy
    #[arg(long)]
    fixed_duration: Option<u32>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Directory to write `simulation_data_<mode>.json` frame logs into
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RunMode {
    Fixed,
    Fuzzy,
    Compare,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let rule_base = Arc::new(
        RuleBase::new(config.fuzzy.clone()).context("Failed to build fuzzy rule base")?,
    );

    let outcomes = match cli.mode {
        RunMode::Fixed => vec![SimWorld::for_mode(Mode::Fixed, config, rule_base)?.run()?],
        RunMode::Fuzzy => vec![SimWorld::for_mode(Mode::Fuzzy, config, rule_base)?.run()?],
        RunMode::Compare => {
            let comparison = run_comparison(&config, rule_base)?;
            println!("{}", comparison.summary_table());
            vec![comparison.fixed, comparison.fuzzy]
        }
    };

    for outcome in &outcomes {
        let stats = &outcome.stats;
        println!(
            "[{}] ticks={} spawned={} served={} leftover={} avg_wait={:.2} max_wait={}",
            stats.mode,
            stats.ticks,
            stats.spawned,
            stats.served,
            stats.leftover,
            stats.avg_wait,
            stats.max_wait
        );
    }

    if let Some(dir) = &cli.output_dir {
        for outcome in &outcomes {
            write_frame_log(dir, outcome)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SimConfig::from_json(&json)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => SimConfig::default(),
    };

    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(rate) = cli.arrival_rate {
        config.arrival_rate = rate;
    }
    if let Some(capacity) = cli.departure_capacity {
        config.departure_capacity = capacity;
    }
    if let Some(duration) = cli.fixed_duration {
        config.fixed_duration = duration;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate().context("Invalid simulation config")?;
    Ok(config)
}

fn write_frame_log(dir: &Path, outcome: &RunOutcome) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let file_name = match outcome.stats.mode {
        Mode::Fixed => "simulation_data_fixed.json",
        Mode::Fuzzy => "simulation_data_fuzzy.json",
    };
    let path = dir.join(file_name);
    let json = outcome
        .result
        .to_json_pretty()
        .context("Failed to serialize frame log")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {} frames to {}", outcome.result.frames.len(), path.display());
    Ok(())
}
