//! Domain types shared by ingestion, the worker and the monitor

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Risk tier
// =============================================================================

/// Aggressiveness level selected once at process start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Safe = 1,
    Low,
    Medium,
    High,
    Power,
}

impl RiskTier {
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Safe,
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Power => "power",
        }
    }

    /// Safe and Power only act on near-certain scores
    pub fn is_high_confidence(&self) -> bool {
        matches!(self, RiskTier::Safe | RiskTier::Power)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RiskTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown risk tier '{}' (expected one of safe, low, medium, high, power)",
                    s
                )
            })
    }
}

impl<'de> Deserialize<'de> for RiskTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// News message
// =============================================================================

/// One qualifying headline, serialized as the task payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsMessage {
    pub id: String,
    pub headline: String,
    pub symbols: Vec<String>,
    pub risk: RiskTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NewsMessage {
    /// Ticker an order is placed on
    pub fn primary_symbol(&self) -> Option<&str> {
        self.symbols.first().map(String::as_str)
    }
}

// =============================================================================
// Session options
// =============================================================================

/// Per-session settings, immutable once created
#[derive(Debug, Clone)]
pub struct SessionOptions {
    risk: RiskTier,
    gain_target: Decimal,
    starting_equity: Decimal,
    started_at: DateTime<Utc>,
}

impl SessionOptions {
    pub fn new(risk: RiskTier, gain_target: Decimal, starting_equity: Decimal) -> Self {
        Self {
            risk,
            gain_target,
            starting_equity,
            started_at: Utc::now(),
        }
    }

    pub fn risk(&self) -> RiskTier {
        self.risk
    }

    pub fn gain_target(&self) -> Decimal {
        self.gain_target
    }

    pub fn starting_equity(&self) -> Decimal {
        self.starting_equity
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Equity at which the session is done
    pub fn target_equity(&self) -> Decimal {
        self.starting_equity + self.gain_target
    }
}
