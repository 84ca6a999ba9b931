//! Risk blending
//!
//! Turns the rectified anomaly signal plus the feature vector into the
//! final, explainable risk rating.
//!
//! # Scoring Formula
//!
//! ```text
//! score  = min(100, floor(base + ml + rules))
//! base   = 15
//! ml     = min(signal × 60, 60)
//! rules  = Σ points of every rule that fires
//! rating = score / 10   (one decimal)
//! ```
//!
//! # Rule Penalties
//!
//! - **No profile image** (+15): `profile_image_presence == 0`
//! - **Young account** (+10): `account_age_estimated < 0.3`
//! - **No public footprint** (+10): `public_footprint == 0`
//! - **Random username** (+10): `username_entropy > 0.75`
//!
//! # Bands
//!
//! - Low: score < 35
//! - Medium: score < 70
//! - High: everything else
//!
//! Since the base is 15 and nothing subtracts, scores never fall below 15.

mod blender;

pub use blender::{
    RiskBlender, RiskBreakdown, RulePenalty, BASE_RISK, ML_CAP, ML_WEIGHT, RULE_PENALTIES,
};
