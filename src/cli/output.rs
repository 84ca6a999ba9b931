//! Terminal and JSON rendering for command results

use anyhow::Result;
use console::{style, StyledObject};
use serde::Serialize;

use profile_risk::classifier::FeatureVector;
use profile_risk::models::{RiskBand, RiskResult};
use profile_risk::pipeline::{AnalysisReport, Assessment};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn styled_band(band: RiskBand) -> StyledObject<String> {
    let label = band.to_string().to_uppercase();
    match band {
        RiskBand::Low => style(label).green().bold(),
        RiskBand::Medium => style(label).yellow().bold(),
        RiskBand::High => style(label).red().bold(),
    }
}

pub fn print_risk(risk: &RiskResult) {
    println!(
        "  {}  {}  ({:.1}/10)",
        style(format!("{:>3}/100", risk.score())).bold(),
        styled_band(risk.band()),
        risk.rating()
    );
}

pub fn print_features(features: &FeatureVector) {
    println!("\n  {}", style("FEATURES").bold());
    for (name, value) in features.iter() {
        println!("  {:<24} {:.2}", name, value);
    }
}

fn print_rules(triggered: &[&str]) {
    if triggered.is_empty() {
        println!("  {}", style("no rule penalties").dim());
        return;
    }
    for rule in triggered {
        println!("  {} {}", style("•").yellow(), rule);
    }
}

pub fn print_assessment(username: &str, assessment: &Assessment) {
    println!("\n{} {}", style("Profile risk:").bold(), username);
    println!("{}", style("──────────────────────────────────────").dim());
    print_risk(&assessment.risk());

    let breakdown = &assessment.breakdown;
    println!("\n  {}", style("BREAKDOWN").bold());
    println!("  {:<24} {}", "base", breakdown.base_risk);
    println!(
        "  {:<24} {:.1}  (signal {:.4})",
        "anomaly", breakdown.ml_risk, assessment.anomaly_signal
    );
    println!("  {:<24} {}", "rules", breakdown.rule_risk);
    print_rules(&breakdown.triggered_rules);

    print_features(&assessment.features);
    println!();
}

pub fn print_report(report: &AnalysisReport) {
    match report {
        AnalysisReport::Ok {
            username,
            display_name,
            risk,
            factors,
            triggered_rules,
            ..
        } => {
            match display_name {
                Some(name) => println!("\n{} {} ({})", style("Profile risk:").bold(), username, name),
                None => println!("\n{} {}", style("Profile risk:").bold(), username),
            }
            print_risk(risk);
            print_rules(triggered_rules);
            print_features(factors);
        }
        AnalysisReport::Unsupported { reason, data } | AnalysisReport::Error { reason, data } => {
            println!(
                "\n{} {}  {} ({})",
                style("Profile risk:").bold(),
                data.username,
                style("not scored").dim(),
                reason
            );
        }
    }
}
