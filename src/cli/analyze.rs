//! `analyze` and `batch` commands over fetched snapshot records

use anyhow::{Context, Result};
use std::path::Path;

use super::output;
use super::{build_pipeline, Format};
use profile_risk::config::RiskConfig;
use profile_risk::models::ProfileSnapshot;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))
}

pub fn run(config: &RiskConfig, path: &Path, username: Option<&str>, format: Format) -> Result<()> {
    let snapshot = ProfileSnapshot::from_json(&read(path)?, username)
        .with_context(|| format!("Invalid snapshot in {}", path.display()))?;
    let pipeline = build_pipeline(config)?;
    let report = pipeline.analyze(&snapshot);

    match format {
        Format::Json => output::print_json(&report),
        Format::Text => {
            output::print_report(&report);
            println!();
            Ok(())
        }
    }
}

pub fn run_batch(config: &RiskConfig, path: &Path, format: Format) -> Result<()> {
    let mut snapshots: Vec<ProfileSnapshot> = serde_json::from_str(&read(path)?)
        .with_context(|| format!("Expected a JSON array of snapshots in {}", path.display()))?;
    for (i, snapshot) in snapshots.iter_mut().enumerate() {
        snapshot
            .apply_username(None)
            .with_context(|| format!("Snapshot #{} in {}", i, path.display()))?;
    }

    let pipeline = build_pipeline(config)?;
    let reports = pipeline.analyze_batch(&snapshots);
    tracing::info!("Analyzed {} snapshots", reports.len());

    match format {
        Format::Json => output::print_json(&reports),
        Format::Text => {
            for report in &reports {
                output::print_report(report);
            }
            println!();
            Ok(())
        }
    }
}
