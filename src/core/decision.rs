//! Dual-threshold order decision
//!
//! Standard tiers buy at 75 and above and sell at 25 and below. Safe and
//! Power only act at 95 / 5. Both comparisons are inclusive; a score of 0
//! means "no opinion" and never sells.

use crate::core::types::RiskTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub buy: i64,
    pub sell: i64,
}

impl Thresholds {
    pub const STANDARD: Thresholds = Thresholds { buy: 75, sell: 25 };
    pub const HIGH_CONFIDENCE: Thresholds = Thresholds { buy: 95, sell: 5 };

    pub fn for_tier(risk: RiskTier) -> Self {
        if risk.is_high_confidence() {
            Self::HIGH_CONFIDENCE
        } else {
            Self::STANDARD
        }
    }
}

pub fn decide(score: i64, risk: RiskTier) -> Decision {
    let thresholds = Thresholds::for_tier(risk);
    if score >= thresholds.buy {
        Decision::Buy
    } else if score <= thresholds.sell && score > 0 {
        Decision::Sell
    } else {
        Decision::Hold
    }
}
