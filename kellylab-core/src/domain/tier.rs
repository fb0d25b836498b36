//! Confidence tiers and per-tier parameter tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Conviction bucket a trade signal falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// All tiers in sampling order (HIGH → MEDIUM → LOW).
    pub const ALL: [ConfidenceTier; 3] = [
        ConfidenceTier::High,
        ConfidenceTier::Medium,
        ConfidenceTier::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per confidence tier.
///
/// Replaces string-keyed maps: every consumer sees the same three fields,
/// and a missing tier is a compile error rather than a runtime lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub high: T,
    pub medium: T,
    pub low: T,
}

impl<T> TierTable<T> {
    pub const fn new(high: T, medium: T, low: T) -> Self {
        Self { high, medium, low }
    }

    pub fn get(&self, tier: ConfidenceTier) -> &T {
        match tier {
            ConfidenceTier::High => &self.high,
            ConfidenceTier::Medium => &self.medium,
            ConfidenceTier::Low => &self.low,
        }
    }

    pub fn get_mut(&mut self, tier: ConfidenceTier) -> &mut T {
        match tier {
            ConfidenceTier::High => &mut self.high,
            ConfidenceTier::Medium => &mut self.medium,
            ConfidenceTier::Low => &mut self.low,
        }
    }

    /// Iterate `(tier, value)` pairs in HIGH → MEDIUM → LOW order.
    pub fn iter(&self) -> impl Iterator<Item = (ConfidenceTier, &T)> {
        ConfidenceTier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> TierTable<U> {
        TierTable {
            high: f(&self.high),
            medium: f(&self.medium),
            low: f(&self.low),
        }
    }

    /// Fallible per-tier map; stops at the first error in tier order.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(ConfidenceTier, &T) -> Result<U, E>,
    ) -> Result<TierTable<U>, E> {
        Ok(TierTable {
            high: f(ConfidenceTier::High, &self.high)?,
            medium: f(ConfidenceTier::Medium, &self.medium)?,
            low: f(ConfidenceTier::Low, &self.low)?,
        })
    }
}

impl<T: Clone> TierTable<T> {
    /// Same value for every tier.
    pub fn splat(value: T) -> Self {
        Self {
            high: value.clone(),
            medium: value.clone(),
            low: value,
        }
    }
}

impl TierTable<f64> {
    pub fn sum(&self) -> f64 {
        self.high + self.medium + self.low
    }

    /// Σ self[tier] × weights[tier].
    pub fn weighted_by(&self, weights: &TierTable<f64>) -> f64 {
        self.high * weights.high + self.medium * weights.medium + self.low * weights.low
    }
}
