//! Command line driver for lifecycle dry runs

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use stock_model_core_rs::run_modes::InputTable;
use stock_model_core_rs::{
    create_strategy, run, Model, ModelConfig, RunMode, RunOptions, RunReport, VERSION,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stock-model")]
#[command(about = "Population model execution engine", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Basic model run mode
    #[arg(short = 'r', long = "run")]
    run: bool,

    /// Point estimation run mode
    #[arg(short = 'e', long = "estimate")]
    estimate: bool,

    /// Markov chain Monte Carlo run mode
    #[arg(short = 'm', long = "mcmc")]
    mcmc: bool,

    /// Profiling run mode
    #[arg(short = 'p', long = "profiling")]
    profiling: bool,

    /// Simulation run mode with the given number of candidates
    #[arg(short = 's', long = "simulation", value_name = "N")]
    simulation: Option<usize>,

    /// Projection run mode
    #[arg(short = 'f', long = "projection")]
    projection: bool,

    /// JSON model configuration
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON table of addressable values to replay
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Random number seed
    #[arg(short = 'g', long = "seed", value_name = "SEED")]
    seed: Option<u64>,

    /// Describe an object type (object_type.sub_type)
    #[arg(short = 'q', long = "query", value_name = "TYPE")]
    query: Option<String>,

    /// Display version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Display the license
    #[arg(short = 'l', long = "license")]
    license: bool,

    /// Debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    /// Resolve the single run mode requested on the command line
    fn run_mode(&self) -> RunMode {
        if self.version {
            return RunMode::Version;
        }
        if self.query.is_some() {
            return RunMode::Query;
        }

        let flags = [
            (self.run, "r"),
            (self.estimate, "e"),
            (self.mcmc, "m"),
            (self.profiling, "p"),
            (self.simulation.is_some(), "s"),
            (self.projection, "f"),
        ];
        let requested: Vec<&str> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, token)| *token)
            .collect();

        match requested.as_slice() {
            [token] => RunMode::from_token(token),
            [] if self.config.is_none() && self.input.is_none() && self.seed.is_none() => {
                RunMode::Help
            }
            _ => RunMode::Invalid,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.license {
        println!("{}", license_text());
        return Ok(());
    }

    match cli.run_mode() {
        RunMode::Help => {
            Cli::command().print_help()?;
            println!();
        }
        RunMode::Version => println!("stock-model {}", VERSION),
        RunMode::Query => query(cli.query.as_deref().unwrap_or_default())?,
        RunMode::Invalid => bail!(
            "exactly one run mode must be given (-r, -e, -m, -p, -s N or -f)"
        ),
        mode => {
            let report = run_model(&cli, mode)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn run_model(cli: &Cli, mode: RunMode) -> anyhow::Result<RunReport> {
    let mut config = match &cli.config {
        Some(path) => read_json::<ModelConfig>(path)?,
        // single year, single time step
        None => ModelConfig::new(2000, 2000, 1, 10),
    };
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }

    let mut options = RunOptions::default();
    if let Some(path) = &cli.input {
        options.input = Some(read_json::<InputTable>(path)?);
    }
    if let Some(candidates) = cli.simulation {
        options.simulation_candidates = candidates;
    }

    let mut model = Model::new(config);
    info!(model = %model.instance_id(), run_mode = %mode, "Starting dry run");

    let mut strategy = create_strategy(mode, &options)?;
    let report = run(&mut model, strategy.as_mut())?;
    Ok(report)
}

fn license_text() -> String {
    format!(
        "stock-model {} is distributed under the {} license",
        VERSION,
        env!("CARGO_PKG_LICENSE")
    )
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Print the parameters of an object type with their defaults
fn query(lookup: &str) -> anyhow::Result<()> {
    let mut parts: Vec<&str> = lookup.split('.').collect();
    if parts.len() == 1 {
        parts.push("");
    }
    let [object_type, sub_type] = parts.as_slice() else {
        bail!("use object_type.sub_type when querying an object");
    };

    let parameters = match (*object_type, *sub_type) {
        ("model", "") => serde_json::to_value(ModelConfig::new(2000, 2000, 1, 10))?,
        ("run_options", "") => serde_json::to_value(RunOptions::default())?,
        _ => bail!("object type {} is invalid", lookup),
    };

    println!("Printing information for {} with sub-type {}", object_type, sub_type);
    println!("{}", serde_json::to_string_pretty(&parameters)?);
    Ok(())
}
