//! Core data models for profile-risk
//!
//! These models describe what flows in and out of the scoring pipeline:
//! the fetched profile snapshot on the way in, the banded risk result on
//! the way out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the fetcher could see the profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    #[default]
    Public,
    Private,
    Blocked,
    Error,
}

impl Accessibility {
    /// Only public snapshots carry enough data to score
    pub fn is_scoreable(&self) -> bool {
        matches!(self, Accessibility::Public)
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accessibility::Public => write!(f, "public"),
            Accessibility::Private => write!(f, "private"),
            Accessibility::Blocked => write!(f, "blocked"),
            Accessibility::Error => write!(f, "error"),
        }
    }
}

/// Errors raised while reading snapshot records
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot has no username; pass one explicitly")]
    MissingUsername,

    #[error("failed to parse snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A normalized profile page, as produced by the external fetcher.
///
/// Field names on the wire follow the fetcher's record:
/// `{status, display_name?, profile_pic?, html?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileSnapshot {
    /// The queried handle. Not part of the fetcher record, so it may be
    /// filled in by the caller after parsing.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(rename = "status")]
    pub accessibility: Accessibility,

    /// Raw page title text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(
        rename = "profile_pic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_picture_url: Option<String>,

    /// Visible text content of the page
    #[serde(rename = "html", default)]
    pub raw_text: String,
}

impl ProfileSnapshot {
    /// Build a public snapshot directly from signals
    pub fn public(username: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            accessibility: Accessibility::Public,
            raw_text: raw_text.into(),
            ..Default::default()
        }
    }

    /// Parse a fetcher record, using `username` when the record has none
    pub fn from_json(json: &str, username: Option<&str>) -> SnapshotResult<Self> {
        let mut snapshot: ProfileSnapshot = serde_json::from_str(json)?;
        snapshot.apply_username(username)?;
        Ok(snapshot)
    }

    /// Override the username, or ensure the record already carries one
    pub fn apply_username(&mut self, username: Option<&str>) -> SnapshotResult<()> {
        if let Some(name) = username {
            self.username = name.to_string();
        }
        if self.username.trim().is_empty() {
            return Err(SnapshotError::MissingUsername);
        }
        Ok(())
    }

    /// Empty URLs count as "no picture", same as a missing field
    pub fn has_profile_picture(&self) -> bool {
        self.profile_picture_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}

/// Coarse risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Upper bound (exclusive) of the Low band
    pub const LOW_BELOW: u32 = 35;
    /// Upper bound (exclusive) of the Medium band
    pub const MEDIUM_BELOW: u32 = 70;

    /// Map a 0-100 score to its band. Low is checked first.
    pub fn from_score(score: u32) -> Self {
        if score < Self::LOW_BELOW {
            RiskBand::Low
        } else if score < Self::MEDIUM_BELOW {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "Low"),
            RiskBand::Medium => write!(f, "Medium"),
            RiskBand::High => write!(f, "High"),
        }
    }
}

/// Final, banded risk rating for one profile. Serialized as
/// `{score, rating, band}`; read-only outside the crate so the three
/// always agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskResult {
    score: u32,
    rating: f64,
    band: RiskBand,
}

impl RiskResult {
    /// The only way to build a result: everything derives from the score.
    pub(crate) fn from_score(score: u32) -> Self {
        let score = score.min(100);
        Self {
            score,
            // an integer over ten already has a single decimal
            rating: f64::from(score) / 10.0,
            band: RiskBand::from_score(score),
        }
    }

    /// Integer score in [0, 100]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// `score / 10` rounded to one decimal
    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn band(&self) -> RiskBand {
        self.band
    }
}
