//! `score` and `features` commands

use anyhow::Result;
use serde::Serialize;

use super::output;
use super::{build_pipeline, Format, SignalArgs};
use profile_risk::classifier::FeatureExtractor;
use profile_risk::config::RiskConfig;
use profile_risk::models::RiskResult;
use profile_risk::pipeline::Assessment;

/// JSON shape of `score`: the same top-level `risk` as `analyze`, plus the
/// full assessment
#[derive(Serialize)]
struct ScoreReport<'a> {
    username: &'a str,
    risk: RiskResult,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

pub fn run(config: &RiskConfig, signals: &SignalArgs, format: Format) -> Result<()> {
    let raw_text = signals.raw_text()?;
    let pipeline = build_pipeline(config)?;
    let assessment = pipeline.assess(&signals.username, &raw_text, signals.picture);

    match format {
        Format::Json => output::print_json(&ScoreReport {
            username: &signals.username,
            risk: assessment.risk(),
            assessment: &assessment,
        }),
        Format::Text => {
            output::print_assessment(&signals.username, &assessment);
            Ok(())
        }
    }
}

/// Features need no model, so nothing is loaded or trained here
pub fn run_features(signals: &SignalArgs, format: Format) -> Result<()> {
    let raw_text = signals.raw_text()?;
    let features = FeatureExtractor::new().extract(&signals.username, &raw_text, signals.picture);

    match format {
        Format::Json => output::print_json(&features),
        Format::Text => {
            output::print_features(&features);
            Ok(())
        }
    }
}
