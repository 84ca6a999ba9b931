//! Blends the anomaly signal with rule penalties into a banded score

use serde::Serialize;

use crate::classifier::{FeatureName, FeatureVector};
use crate::models::RiskResult;

/// Floor: no profile ever scores zero
pub const BASE_RISK: u32 = 15;

/// Points per unit of anomaly signal
pub const ML_WEIGHT: f64 = 60.0;

/// Cap on the anomaly contribution
pub const ML_CAP: f64 = 60.0;

/// One independent red flag. Penalties are not exclusive: every rule that
/// applies adds its points.
#[derive(Clone, Copy)]
pub struct RulePenalty {
    pub name: &'static str,
    pub points: u32,
    applies: fn(&FeatureVector) -> bool,
}

impl RulePenalty {
    pub fn applies(&self, features: &FeatureVector) -> bool {
        (self.applies)(features)
    }
}

impl std::fmt::Debug for RulePenalty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulePenalty")
            .field("name", &self.name)
            .field("points", &self.points)
            .finish()
    }
}

fn no_profile_image(f: &FeatureVector) -> bool {
    f.get(FeatureName::ProfileImagePresence) == 0.0
}

fn young_account(f: &FeatureVector) -> bool {
    f.get(FeatureName::AccountAgeEstimated) < 0.3
}

fn no_public_footprint(f: &FeatureVector) -> bool {
    f.get(FeatureName::PublicFootprint) == 0.0
}

fn random_username(f: &FeatureVector) -> bool {
    f.get(FeatureName::UsernameEntropy) > 0.75
}

/// Rule table, evaluated in order
pub const RULE_PENALTIES: [RulePenalty; 4] = [
    RulePenalty {
        name: "no_profile_image",
        points: 15,
        applies: no_profile_image,
    },
    RulePenalty {
        name: "young_account",
        points: 10,
        applies: young_account,
    },
    RulePenalty {
        name: "no_public_footprint",
        points: 10,
        applies: no_public_footprint,
    },
    RulePenalty {
        name: "random_username",
        points: 10,
        applies: random_username,
    },
];

/// Where a score came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub base_risk: u32,
    /// Capped anomaly contribution, before flooring
    pub ml_risk: f64,
    pub rule_risk: u32,
    /// Names of the rules that fired, in table order
    pub triggered_rules: Vec<&'static str>,
    pub result: RiskResult,
}

/// Combines anomaly signal and rule penalties. Stateless and total.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskBlender;

impl RiskBlender {
    pub fn new() -> Self {
        Self
    }

    /// Full accounting of a score
    pub fn breakdown(&self, anomaly_signal: f64, features: &FeatureVector) -> RiskBreakdown {
        // NaN and negative signals contribute nothing
        let signal = if anomaly_signal.is_nan() {
            0.0
        } else {
            anomaly_signal.max(0.0)
        };
        let ml_risk = (signal * ML_WEIGHT).min(ML_CAP);

        let triggered: Vec<&RulePenalty> = RULE_PENALTIES
            .iter()
            .filter(|rule| rule.applies(features))
            .collect();
        let rule_risk: u32 = triggered.iter().map(|rule| rule.points).sum();

        let total = f64::from(BASE_RISK) + ml_risk + f64::from(rule_risk);
        let score = (total.floor() as u32).min(100);

        RiskBreakdown {
            base_risk: BASE_RISK,
            ml_risk,
            rule_risk,
            triggered_rules: triggered.iter().map(|rule| rule.name).collect(),
            result: RiskResult::from_score(score),
        }
    }

    /// Score, rating and band for one profile
    pub fn blend(&self, anomaly_signal: f64, features: &FeatureVector) -> RiskResult {
        self.breakdown(anomaly_signal, features).result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskBand;

    /// Vector that trips none of the rules
    fn clean() -> FeatureVector {
        FeatureVector::new([0.3, 0.8, 1.0, 1.0, 0.8])
    }

    /// Vector that trips all four rules
    fn red_flags() -> FeatureVector {
        FeatureVector::new([0.9, 0.0, 0.3, 0.0, 0.2])
    }

    #[test]
    fn test_clean_profile_scores_base_only() {
        let result = RiskBlender::new().blend(0.0, &clean());
        assert_eq!(result.score(), 15);
        assert!((result.rating() - 1.5).abs() < 1e-9);
        assert_eq!(result.band(), RiskBand::Low);
    }

    #[test]
    fn test_all_rules_fire() {
        let breakdown = RiskBlender::new().breakdown(0.0, &red_flags());
        assert_eq!(breakdown.rule_risk, 45);
        assert_eq!(
            breakdown.triggered_rules,
            vec![
                "no_profile_image",
                "young_account",
                "no_public_footprint",
                "random_username"
            ]
        );
        assert_eq!(breakdown.result.score(), 60);
        assert_eq!(breakdown.result.band(), RiskBand::Medium);
    }

    #[test]
    fn test_all_rules_with_capped_ml_clamps_to_100() {
        let result = RiskBlender::new().blend(5.0, &red_flags());
        assert_eq!(result.score(), 100);
        assert!((result.rating() - 10.0).abs() < 1e-9);
        assert_eq!(result.band(), RiskBand::High);
    }

    #[test]
    fn test_ml_contribution_is_capped() {
        let blender = RiskBlender::new();
        let b = blender.breakdown(3.0, &clean());
        assert_eq!(b.ml_risk, 60.0);
        assert_eq!(b.result.score(), 75);

        let inf = blender.breakdown(f64::INFINITY, &clean());
        assert_eq!(inf.ml_risk, 60.0);
    }

    #[test]
    fn test_ml_contribution_is_floored() {
        // 15 + 0.51 * 60 = 45.6 -> 45
        let result = RiskBlender::new().blend(0.51, &clean());
        assert_eq!(result.score(), 45);
        assert!((result.rating() - 4.5).abs() < 1e-9);
        assert_eq!(result.band(), RiskBand::Medium);
    }

    #[test]
    fn test_degenerate_signals_add_nothing() {
        let blender = RiskBlender::new();
        assert_eq!(blender.blend(-2.0, &clean()).score(), 15);
        assert_eq!(blender.blend(f64::NAN, &clean()).score(), 15);
    }

    #[test]
    fn test_individual_rules() {
        let blender = RiskBlender::new();
        let cases = [
            ([0.3, 0.8, 1.0, 0.0, 0.8], "no_profile_image", 30),
            ([0.3, 0.8, 1.0, 1.0, 0.2], "young_account", 25),
            ([0.3, 0.0, 1.0, 1.0, 0.8], "no_public_footprint", 25),
            ([0.8, 0.8, 1.0, 1.0, 0.8], "random_username", 25),
        ];
        for (values, rule, score) in cases {
            let b = blender.breakdown(0.0, &FeatureVector::new(values));
            assert_eq!(b.triggered_rules, vec![rule]);
            assert_eq!(b.result.score(), score, "rule {rule}");
        }
    }

    #[test]
    fn test_rule_thresholds_are_strict() {
        let blender = RiskBlender::new();
        // age exactly 0.3 and entropy exactly 0.75 do not trigger
        let b = blender.breakdown(0.0, &FeatureVector::new([0.75, 0.8, 1.0, 1.0, 0.3]));
        assert!(b.triggered_rules.is_empty());
    }

    #[test]
    fn test_score_range_and_rating() {
        let blender = RiskBlender::new();
        let vectors = [clean(), red_flags(), FeatureVector::new([0.5; 5])];
        let mut signal = 0.0;
        while signal <= 2.0 {
            for v in &vectors {
                let r = blender.blend(signal, v);
                assert!((15..=100).contains(&r.score()), "score {}", r.score());
                assert!((r.rating() - f64::from(r.score()) / 10.0).abs() < 1e-9);
                assert_eq!(r.band(), RiskBand::from_score(r.score()));
            }
            signal += 0.05;
        }
    }
}
