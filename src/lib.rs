//! profile-risk - explainable fake-profile risk scoring
//!
//! Scores a social-media profile snapshot in three steps:
//! a fixed five-feature vector, an isolation-forest anomaly signal and a
//! rule-based blend into a 0-100 score with a Low/Medium/High band.
//!
//! ```rust,ignore
//! use profile_risk::classifier::{ModelProvider, TrainConfig};
//! use profile_risk::pipeline::ScoringPipeline;
//!
//! let provider = ModelProvider::new("risk_model.json", TrainConfig::default());
//! let pipeline = ScoringPipeline::from_provider(&provider)?;
//! let risk = pipeline.evaluate("xk3", "", false);
//! ```

pub mod classifier;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod scoring;

pub use classifier::{ModelError, ModelProvider};
pub use models::{Accessibility, ProfileSnapshot, RiskBand, RiskResult};
pub use pipeline::{AnalysisReport, ScoringPipeline};
