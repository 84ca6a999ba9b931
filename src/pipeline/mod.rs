//! Scoring pipeline
//!
//! The single entry point for callers: features → anomaly signal → blended
//! risk. Also turns fetched snapshots into the report shape callers embed
//! in their responses, including the non-scoreable cases.

use rayon::prelude::*;
use serde::Serialize;

use crate::classifier::{
    AnomalyScorer, FeatureExtractor, FeatureVector, ModelProvider, ModelResult,
};
use crate::models::{Accessibility, ProfileSnapshot, RiskResult};
use crate::scoring::{RiskBlender, RiskBreakdown};

/// Page-title suffix the fetcher leaves on display names
const TITLE_SUFFIX: &str = " • Instagram photos and videos";

/// Everything computed for one profile
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub features: FeatureVector,
    /// Rectified anomaly signal fed to the blender
    pub anomaly_signal: f64,
    pub breakdown: RiskBreakdown,
}

impl Assessment {
    pub fn risk(&self) -> RiskResult {
        self.breakdown.result
    }
}

/// Result of analyzing one snapshot, keyed by `status` on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisReport {
    Ok {
        username: String,
        display_name: Option<String>,
        profile_picture: Option<String>,
        risk: RiskResult,
        factors: FeatureVector,
        anomaly_signal: f64,
        triggered_rules: Vec<&'static str>,
        /// Raw snapshot, kept for audit
        data: ProfileSnapshot,
    },
    Unsupported {
        reason: &'static str,
        data: ProfileSnapshot,
    },
    Error {
        reason: &'static str,
        data: ProfileSnapshot,
    },
}

impl AnalysisReport {
    pub fn risk(&self) -> Option<RiskResult> {
        match self {
            AnalysisReport::Ok { risk, .. } => Some(*risk),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> &ProfileSnapshot {
        match self {
            AnalysisReport::Ok { data, .. }
            | AnalysisReport::Unsupported { data, .. }
            | AnalysisReport::Error { data, .. } => data,
        }
    }
}

/// Feature extraction, anomaly scoring and blending in sequence
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    extractor: FeatureExtractor,
    scorer: AnomalyScorer,
    blender: RiskBlender,
}

impl ScoringPipeline {
    pub fn new(scorer: AnomalyScorer) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            scorer,
            blender: RiskBlender::new(),
        }
    }

    /// Build over the provider's model, loading or training it first
    pub fn from_provider(provider: &ModelProvider) -> ModelResult<Self> {
        Ok(Self::new(AnomalyScorer::from_provider(provider)?))
    }

    /// Features only, no model involved
    pub fn features(&self, username: &str, raw_text: &str, has_profile_picture: bool) -> FeatureVector {
        self.extractor.extract(username, raw_text, has_profile_picture)
    }

    /// Full assessment with the intermediate values kept
    pub fn assess(&self, username: &str, raw_text: &str, has_profile_picture: bool) -> Assessment {
        let features = self.features(username, raw_text, has_profile_picture);
        let anomaly_signal = self.scorer.score(&features);
        let breakdown = self.blender.breakdown(anomaly_signal, &features);
        tracing::debug!(
            "{}: signal {:.4}, rules {:?} -> {}",
            username,
            anomaly_signal,
            breakdown.triggered_rules,
            breakdown.result.score()
        );
        Assessment {
            features,
            anomaly_signal,
            breakdown,
        }
    }

    /// Risk rating for one profile
    pub fn evaluate(&self, username: &str, raw_text: &str, has_profile_picture: bool) -> RiskResult {
        self.assess(username, raw_text, has_profile_picture).risk()
    }

    /// Analyze a fetched snapshot. Only public snapshots are scored.
    pub fn analyze(&self, snapshot: &ProfileSnapshot) -> AnalysisReport {
        match snapshot.accessibility {
            Accessibility::Private => AnalysisReport::Unsupported {
                reason: "profile_is_private",
                data: snapshot.clone(),
            },
            Accessibility::Blocked | Accessibility::Error => AnalysisReport::Error {
                reason: "profile_not_accessible",
                data: snapshot.clone(),
            },
            Accessibility::Public => {
                let assessment = self.assess(
                    &snapshot.username,
                    &snapshot.raw_text,
                    snapshot.has_profile_picture(),
                );
                AnalysisReport::Ok {
                    username: snapshot.username.clone(),
                    display_name: snapshot.display_name.as_deref().and_then(clean_display_name),
                    profile_picture: snapshot.profile_picture_url.clone(),
                    risk: assessment.risk(),
                    factors: assessment.features,
                    anomaly_signal: assessment.anomaly_signal,
                    triggered_rules: assessment.breakdown.triggered_rules,
                    data: snapshot.clone(),
                }
            }
        }
    }

    /// Analyze many snapshots in parallel, preserving input order
    pub fn analyze_batch(&self, snapshots: &[ProfileSnapshot]) -> Vec<AnalysisReport> {
        snapshots.par_iter().map(|s| self.analyze(s)).collect()
    }
}

/// Strip whitespace and the site suffix from a page title
pub fn clean_display_name(raw_title: &str) -> Option<String> {
    let name = raw_title.trim().replace(TITLE_SUFFIX, "");
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
