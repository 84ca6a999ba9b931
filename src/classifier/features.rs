//! Feature extraction for profile risk scoring
//!
//! Turns a username, the visible page text and the picture flag into the
//! fixed five-slot vector the anomaly model was trained on.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Number of features in the schema
pub const FEATURE_COUNT: usize = 5;

/// Entropies above this many bits are rare for short handles
const ENTROPY_SATURATION_BITS: f64 = 5.0;

/// Token whose occurrences stand in for posting activity
const ACTIVITY_TOKEN: &str = "post";

/// Occurrence count at which the footprint saturates
const FOOTPRINT_SATURATION: f64 = 20.0;

/// Usernames longer than this count as descriptive
const DESCRIPTIVE_USERNAME_LEN: usize = 5;

/// Feature schema. Declaration order is the positional order the model
/// consumes, so new features must only ever be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureName {
    UsernameEntropy,
    PublicFootprint,
    ProfileCompleteness,
    ProfileImagePresence,
    AccountAgeEstimated,
}

impl FeatureName {
    pub const ALL: [FeatureName; FEATURE_COUNT] = [
        FeatureName::UsernameEntropy,
        FeatureName::PublicFootprint,
        FeatureName::ProfileCompleteness,
        FeatureName::ProfileImagePresence,
        FeatureName::AccountAgeEstimated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::UsernameEntropy => "username_entropy",
            FeatureName::PublicFootprint => "public_footprint",
            FeatureName::ProfileCompleteness => "profile_completeness",
            FeatureName::ProfileImagePresence => "profile_image_presence",
            FeatureName::AccountAgeEstimated => "account_age_estimated",
        }
    }

    /// Position in the model input
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Schema names in positional order
    pub fn schema() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Fixed-order feature vector, every value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build from positional values; each one is clamped into [0, 1].
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            values: values.map(clamp_unit),
        }
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        self.values[name.index()]
    }

    /// Positional view used as model input
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// (name, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.iter().map(move |&name| (name, self.get(name)))
    }
}

// Serialized as a map so callers see names, but in schema order rather
// than whatever order a hash map would pick.
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.as_str(), &value)?;
        }
        map.end()
    }
}

/// Derives feature vectors from profile signals. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature vector. Never fails: empty usernames and empty
    /// text just produce low-completeness, high-risk values.
    pub fn extract(&self, username: &str, raw_text: &str, has_profile_picture: bool) -> FeatureVector {
        let entropy = clamp_unit(username_entropy(username) / ENTROPY_SATURATION_BITS);

        let posts = raw_text.to_lowercase().matches(ACTIVITY_TOKEN).count();
        let footprint = clamp_unit(posts as f64 / FOOTPRINT_SATURATION);

        let completeness = if username.chars().count() > DESCRIPTIVE_USERNAME_LEN {
            1.0
        } else {
            0.3
        };

        let image = if has_profile_picture { 1.0 } else { 0.0 };

        // Age is inferred from footprint, never observed directly
        let age = if footprint > 0.6 && has_profile_picture {
            0.8
        } else if footprint > 0.3 {
            0.5
        } else {
            0.2
        };

        FeatureVector::new([
            round2(entropy),
            round2(footprint),
            round2(completeness),
            image,
            age,
        ])
    }
}

/// Shannon entropy in bits of the username's character distribution.
/// Empty and single-character names have zero entropy.
pub fn username_entropy(username: &str) -> f64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut total = 0usize;
    for c in username.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total <= 1 {
        return 0.0;
    }

    let total = total as f64;
    let entropy: f64 = counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum();

    // a single repeated symbol sums to -0.0; report it as plain zero
    if entropy > 0.0 {
        entropy
    } else {
        0.0
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order() {
        let names: Vec<&str> = FeatureName::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "username_entropy",
                "public_footprint",
                "profile_completeness",
                "profile_image_presence",
                "account_age_estimated",
            ]
        );
        for (i, name) in FeatureName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn test_entropy_of_repeated_chars_is_zero() {
        assert_eq!(username_entropy("aaaaaa"), 0.0);
        assert_eq!(username_entropy("a"), 0.0);
        assert_eq!(username_entropy(""), 0.0);

        let extractor = FeatureExtractor::new();
        let features = extractor.extract("aaaaaa", "", false);
        assert_eq!(features.get(FeatureName::UsernameEntropy), 0.0);
    }

    #[test]
    fn test_zero_entropy_is_positive_zero() {
        assert_eq!(username_entropy("aaaaaa").to_bits(), 0f64.to_bits());

        let features = FeatureExtractor::new().extract("aaaaaa", "", true);
        let json = serde_json::to_string(&features).unwrap();
        assert!(json.starts_with(r#"{"username_entropy":0.0,"#), "{json}");
    }

    #[test]
    fn test_entropy_of_distinct_chars() {
        // four equally likely symbols = 2 bits
        assert!((username_entropy("abcd") - 2.0).abs() < 1e-12);
        // "aabb": two symbols at p=0.5 = 1 bit
        assert!((username_entropy("aabb") - 1.0).abs() < 1e-12);

        let features = FeatureExtractor::new().extract("abcd", "", false);
        assert_eq!(features.get(FeatureName::UsernameEntropy), 0.4);
    }

    #[test]
    fn test_entropy_saturates_at_one() {
        // 64 distinct characters = 6 bits, above the 5-bit saturation point
        let name: String = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_."
            .chars()
            .collect();
        assert_eq!(name.chars().count(), 64);
        let features = FeatureExtractor::new().extract(&name, "", true);
        assert_eq!(features.get(FeatureName::UsernameEntropy), 1.0);
    }

    #[test]
    fn test_footprint_counts_case_insensitively() {
        let extractor = FeatureExtractor::new();
        let features = extractor.extract("someone", "Post POST post pOsT", false);
        assert_eq!(features.get(FeatureName::PublicFootprint), 0.2);
    }

    #[test]
    fn test_footprint_clamps_to_one() {
        let text = "post ".repeat(25);
        let features = FeatureExtractor::new().extract("someone", &text, true);
        assert_eq!(features.get(FeatureName::PublicFootprint), 1.0);
    }

    #[test]
    fn test_completeness_threshold() {
        let extractor = FeatureExtractor::new();
        assert_eq!(
            extractor.extract("abcde", "", false).get(FeatureName::ProfileCompleteness),
            0.3
        );
        assert_eq!(
            extractor.extract("abcdef", "", false).get(FeatureName::ProfileCompleteness),
            1.0
        );
        assert_eq!(
            extractor.extract("", "", false).get(FeatureName::ProfileCompleteness),
            0.3
        );
    }

    #[test]
    fn test_age_ladder() {
        let extractor = FeatureExtractor::new();
        let many_posts = "post ".repeat(14); // footprint 0.7
        let some_posts = "post ".repeat(8); // footprint 0.4

        let mature = extractor.extract("someone", &many_posts, true);
        assert_eq!(mature.get(FeatureName::AccountAgeEstimated), 0.8);

        // high footprint without a picture falls to the middle rung
        let no_pic = extractor.extract("someone", &many_posts, false);
        assert_eq!(no_pic.get(FeatureName::AccountAgeEstimated), 0.5);

        let middle = extractor.extract("someone", &some_posts, true);
        assert_eq!(middle.get(FeatureName::AccountAgeEstimated), 0.5);

        let young = extractor.extract("someone", "", true);
        assert_eq!(young.get(FeatureName::AccountAgeEstimated), 0.2);
    }

    #[test]
    fn test_image_presence() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.extract("x", "", true).get(FeatureName::ProfileImagePresence), 1.0);
        assert_eq!(extractor.extract("x", "", false).get(FeatureName::ProfileImagePresence), 0.0);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = FeatureExtractor::new();
        let a = extractor.extract("user_9x!Q", "post post repost", true);
        let b = extractor.extract("user_9x!Q", "post post repost", true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_values_in_unit_range() {
        let extractor = FeatureExtractor::new();
        let long_text = "post".repeat(100);
        for (name, text, pic) in [
            ("", "", false),
            ("x", "post", true),
            ("a_very_long_and_random_looking_name_19283746", long_text.as_str(), true),
        ] {
            let features = extractor.extract(name, text, pic);
            for (_, v) in features.iter() {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_vector_clamps_inputs() {
        let v = FeatureVector::new([1.5, -0.2, f64::NAN, 0.5, 1.0]);
        assert_eq!(v.values(), &[1.0, 0.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_serializes_in_schema_order() {
        let v = FeatureVector::new([0.1, 0.2, 0.3, 1.0, 0.5]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(
            json,
            r#"{"username_entropy":0.1,"public_footprint":0.2,"profile_completeness":0.3,"profile_image_presence":1.0,"account_age_estimated":0.5}"#
        );
    }
}
