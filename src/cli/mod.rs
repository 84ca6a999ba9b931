//! CLI command definitions and handlers

mod analyze;
mod output;
mod score;
mod train;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use profile_risk::classifier::ModelProvider;
use profile_risk::config::{load_config_file, load_risk_config, RiskConfig};
use profile_risk::pipeline::ScoringPipeline;

/// profile-risk - fake-profile risk scoring
///
/// Rates how likely a social-media profile is fake, from a handful of
/// signals plus an anomaly model. A triage heuristic, not a verdict.
#[derive(Parser, Debug)]
#[command(name = "profile-risk")]
#[command(
    version,
    about = "Explainable fake-profile risk scoring",
    after_help = "\
Examples:
  profile-risk score xk3                            Score a bare username
  profile-risk score jane.doe --text-file page.txt --picture
  profile-risk analyze snapshot.json --username jane.doe
  profile-risk batch snapshots.json --format json
  profile-risk train --force                        Refit and overwrite the model"
)]
pub struct Cli {
    /// Config file (default: ./profile-risk.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model artifact path (overrides config and PROFILE_RISK_MODEL)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the visible page text comes from
#[derive(clap::Args, Debug)]
pub struct SignalArgs {
    /// Username to score
    pub username: String,

    /// Visible page text
    #[arg(long, conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Read the visible page text from a file
    #[arg(long)]
    pub text_file: Option<PathBuf>,

    /// The profile has a picture
    #[arg(long)]
    pub picture: bool,
}

impl SignalArgs {
    fn raw_text(&self) -> Result<String> {
        match (&self.text, &self.text_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read text file {}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a profile from its signals
    Score {
        #[command(flatten)]
        signals: SignalArgs,
    },

    /// Print the feature vector without scoring
    Features {
        #[command(flatten)]
        signals: SignalArgs,
    },

    /// Analyze a fetched snapshot record
    /// ({"status": ..., "display_name": ..., "profile_pic": ..., "html": ...})
    Analyze {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Username, if the record does not carry one
        #[arg(long)]
        username: Option<String>,
    },

    /// Analyze a JSON array of snapshot records, each with a username
    Batch {
        /// JSON file holding an array of snapshots
        snapshots: PathBuf,
    },

    /// Fit the anomaly model on the bootstrap data and save it
    Train {
        /// Overwrite an existing artifact
        #[arg(long)]
        force: bool,
    },
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    fn parse(s: &str) -> Self {
        match s {
            "json" => Format::Json,
            _ => Format::Text,
        }
    }
}

/// Config file, then PROFILE_RISK_MODEL, then --model
fn resolve_config(config: Option<&Path>, model: Option<&Path>) -> Result<RiskConfig> {
    let mut resolved = match config {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => load_risk_config(Path::new(".")),
    };
    resolved.apply_env();
    resolved.apply_model_override(model);
    Ok(resolved)
}

/// Build the pipeline, loading or training the model
fn build_pipeline(config: &RiskConfig) -> Result<ScoringPipeline> {
    let provider = ModelProvider::new(&config.model.path, config.model.train_config());
    ScoringPipeline::from_provider(&provider).with_context(|| {
        format!(
            "Failed to load anomaly model from {}",
            config.model.path.display()
        )
    })
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.model.as_deref())?;
    let format = Format::parse(&cli.format);

    match cli.command {
        Commands::Score { signals } => score::run(&config, &signals, format),
        Commands::Features { signals } => score::run_features(&signals, format),
        Commands::Analyze { snapshot, username } => {
            analyze::run(&config, &snapshot, username.as_deref(), format)
        }
        Commands::Batch { snapshots } => analyze::run_batch(&config, &snapshots, format),
        Commands::Train { force } => train::run(&config, force, format),
    }
}
