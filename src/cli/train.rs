//! `train` command

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use super::output;
use super::Format;
use profile_risk::classifier::{load_or_train, train_and_save, ModelArtifact, ModelSource};
use profile_risk::config::RiskConfig;

#[derive(Serialize)]
struct TrainSummary<'a> {
    path: String,
    source: ModelSource,
    trained_at: String,
    n_estimators: usize,
    contamination: f64,
    offset: f64,
    schema: &'a [String],
}

pub fn run(config: &RiskConfig, force: bool, format: Format) -> Result<()> {
    let path = &config.model.path;
    let train_config = config.model.train_config();

    let (artifact, source): (ModelArtifact, ModelSource) = if force {
        let artifact = train_and_save(path, &train_config)
            .with_context(|| format!("Failed to train model into {}", path.display()))?;
        (artifact, ModelSource::Trained)
    } else {
        load_or_train(path, &train_config)
            .with_context(|| format!("Failed to load or train model at {}", path.display()))?
    };

    let summary = TrainSummary {
        path: path.display().to_string(),
        source,
        trained_at: artifact.trained_at.to_rfc3339(),
        n_estimators: artifact.forest.n_estimators(),
        contamination: artifact.forest.contamination(),
        offset: artifact.forest.offset(),
        schema: &artifact.schema,
    };

    match format {
        Format::Json => output::print_json(&summary),
        Format::Text => {
            let verb = match source {
                ModelSource::Trained => style("Trained").green().bold(),
                ModelSource::Loaded => style("Loaded existing").cyan().bold(),
            };
            println!("{} model at {}", verb, summary.path);
            println!(
                "  {} trees, contamination {}, offset {:.4}, trained {}",
                summary.n_estimators, summary.contamination, summary.offset, summary.trained_at
            );
            if source == ModelSource::Loaded {
                println!("  {}", style("use --force to retrain").dim());
            }
            Ok(())
        }
    }
}
