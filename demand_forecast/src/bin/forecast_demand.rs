//! # forecast_demand
//!
//! Command-line interface for the kitchen demand forecasting pipeline.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use demand_forecast::{ArtifactStore, ModelKind, Pipeline, PipelineConfig};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forecast_demand")]
#[command(about = "Weekly demand and ingredient requirement forecasts", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Additive,
    Ets,
    MovingAverage,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Additive => ModelKind::Additive,
            ModelArg::Ets => ModelKind::Ets,
            ModelArg::MovingAverage => ModelKind::MovingAverage,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast demand and ingredient requirements for one location
    Run {
        /// Order history CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Location id to forecast for
        #[arg(short, long)]
        location: Option<i64>,

        /// Number of meals in the popularity ranking
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Directory for chart artifacts
        #[arg(short, long)]
        artifact_dir: Option<PathBuf>,

        /// Skip chart rendering
        #[arg(long)]
        no_artifacts: bool,

        /// Forecasting model
        #[arg(short, long, value_enum)]
        model: Option<ModelArg>,

        /// Write the payload JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored artifacts, or print the path of one
    Artifacts {
        /// Artifact name
        name: Option<String>,

        /// Directory for chart artifacts
        #[arg(short, long)]
        artifact_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_forecast=info,forecast_demand=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            input,
            location,
            top_n,
            artifact_dir,
            no_artifacts,
            model,
            output,
        } => {
            if let Some(location) = location {
                config.location_id = location;
            }
            if let Some(top_n) = top_n {
                config.top_n = top_n;
            }
            if let Some(dir) = artifact_dir {
                config.artifact_dir = dir;
            }
            if no_artifacts {
                config.render_artifacts = false;
            }
            if let Some(model) = model {
                config.model = model.into();
            }

            let pipeline = Pipeline::new(config)?;
            let report = pipeline
                .run_csv(&input)
                .with_context(|| format!("Forecast failed for {}", input.display()))?;

            let json = report.payload.to_json()?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", json),
            }

            eprintln!(
                "{} series failed, {} unused ingredient(s) skipped, {} artifact(s) written, {} render failure(s)",
                report.failures.len(),
                report.skipped_ingredients.len(),
                report.artifacts.len(),
                report.render_failures.len()
            );
        }
        Commands::Artifacts { name, artifact_dir } => {
            let store = ArtifactStore::open(artifact_dir.unwrap_or(config.artifact_dir))?;
            match name {
                Some(name) => match store.path_of(&name) {
                    Some(path) => println!("{}", path.display()),
                    None => bail!("No artifact named '{}' in {}", name, store.dir().display()),
                },
                None => {
                    for name in store.list()? {
                        println!("{}", name);
                    }
                }
            }
        }
    }

    Ok(())
}
