//! Position sizing
//!
//! Two strategy families behind `SizingStrategy`:
//! - Tiered (Low/Medium/High): `|min(bp * fraction / price, cap) * multiplier|`,
//!   with (fraction, cap) stepping up the farther the score is from neutral.
//! - Equity fraction (Safe/Power): `bp * 0.1 / price` bounded by 20 shares,
//!   as a ceiling for Safe and a floor for Power.
//!
//! Quantities are truncated to whole shares. Anything that cannot be sized
//! yields 0, which callers treat as "do not send".

use tracing::warn;

use crate::adapters::types::OrderSide;
use crate::core::types::RiskTier;

/// Buying-power fraction for equity-tier sizing
pub const EQUITY_FRACTION: f64 = 0.1;
/// Share bound for equity-tier sizing
pub const EQUITY_SHARE_BOUND: f64 = 20.0;

/// Fraction of buying power and share cap for one score band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingBand {
    pub fraction: f64,
    pub cap: f64,
}

const BAND_1: SizingBand = SizingBand { fraction: 0.02, cap: 4.0 };
const BAND_2: SizingBand = SizingBand { fraction: 0.05, cap: 10.0 };
const BAND_3: SizingBand = SizingBand { fraction: 0.07, cap: 14.0 };
const BAND_4: SizingBand = SizingBand { fraction: 0.10, cap: 20.0 };

/// Band for a bullish score; `None` above 100
pub fn buy_band(score: i64) -> Option<SizingBand> {
    match score {
        s if s < 80 => Some(BAND_1),
        s if s < 90 => Some(BAND_2),
        s if s < 95 => Some(BAND_3),
        s if s <= 100 => Some(BAND_4),
        _ => None,
    }
}

/// Band for a bearish score; `None` below 0
pub fn sell_band(score: i64) -> Option<SizingBand> {
    match score {
        s if s > 20 => Some(BAND_1),
        s if s > 10 => Some(BAND_2),
        s if s > 5 => Some(BAND_3),
        s if s >= 0 => Some(BAND_4),
        _ => None,
    }
}

/// Multiplier for the tiered family; `None` for Safe and Power
pub fn tiered_multiplier(risk: RiskTier) -> Option<f64> {
    match risk {
        RiskTier::Low => Some(0.5),
        RiskTier::Medium => Some(1.0),
        RiskTier::High => Some(2.0),
        RiskTier::Safe | RiskTier::Power => None,
    }
}

fn usable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

fn whole_shares(raw: f64) -> i64 {
    if raw.is_finite() {
        raw.abs().trunc() as i64
    } else {
        0
    }
}

/// Tiered quantity for Low/Medium/High
pub fn tiered_quantity(
    buying_power: f64,
    price: f64,
    score: i64,
    side: OrderSide,
    risk: RiskTier,
) -> i64 {
    if !usable_price(price) {
        return 0;
    }
    let band = match side {
        OrderSide::Buy => buy_band(score),
        OrderSide::Sell => sell_band(score),
    };
    let Some(band) = band else {
        return 0;
    };
    let multiplier = tiered_multiplier(risk).unwrap_or_else(|| {
        warn!(risk = %risk, "[SIZING] No tiered multiplier for risk tier, using 0");
        0.0
    });
    let shares = (buying_power * band.fraction / price).min(band.cap);
    whole_shares(shares * multiplier)
}

/// Equity-fraction quantity for Safe/Power
pub fn equity_fraction_quantity(buying_power: f64, price: f64, risk: RiskTier) -> i64 {
    if !usable_price(price) {
        return 0;
    }
    let shares = buying_power * EQUITY_FRACTION / price;
    match risk {
        RiskTier::Safe => whole_shares(shares.min(EQUITY_SHARE_BOUND)),
        RiskTier::Power => whole_shares(shares.max(EQUITY_SHARE_BOUND)),
        other => {
            warn!(risk = %other, "[SIZING] Equity-fraction sizing does not apply to tier, using 0");
            0
        }
    }
}

/// Order quantity from buying power, quote and sentiment
pub trait SizingStrategy {
    fn compute(&self, buying_power: f64, price: f64, score: i64, side: OrderSide) -> i64;
}

/// Strategy selected by risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSizer {
    Tiered { risk: RiskTier },
    EquityFraction { risk: RiskTier },
}

impl PositionSizer {
    pub fn for_tier(risk: RiskTier) -> Self {
        if risk.is_high_confidence() {
            PositionSizer::EquityFraction { risk }
        } else {
            PositionSizer::Tiered { risk }
        }
    }
}

impl SizingStrategy for PositionSizer {
    fn compute(&self, buying_power: f64, price: f64, score: i64, side: OrderSide) -> i64 {
        match *self {
            PositionSizer::Tiered { risk } => {
                tiered_quantity(buying_power, price, score, side, risk)
            }
            PositionSizer::EquityFraction { risk } => {
                equity_fraction_quantity(buying_power, price, risk)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_medium_buy_85() {
        // min(10000 * 0.05 / 50, 10) * 1.0
        let sizer = PositionSizer::for_tier(RiskTier::Medium);
        assert_eq!(sizer.compute(10_000.0, 50.0, 85, OrderSide::Buy), 10);
    }

    #[test]
    fn test_safe_60() {
        // min(10000 * 0.1 / 50, 20)
        let sizer = PositionSizer::for_tier(RiskTier::Safe);
        assert_eq!(sizer.compute(10_000.0, 50.0, 60, OrderSide::Buy), 20);
    }

    #[test]
    fn test_safe_caps_and_power_floors() {
        // bp * 0.1 / price = 2
        assert_eq!(equity_fraction_quantity(1_000.0, 50.0, RiskTier::Safe), 2);
        assert_eq!(equity_fraction_quantity(1_000.0, 50.0, RiskTier::Power), 20);
        // bp * 0.1 / price = 200
        assert_eq!(equity_fraction_quantity(100_000.0, 50.0, RiskTier::Safe), 20);
        assert_eq!(equity_fraction_quantity(100_000.0, 50.0, RiskTier::Power), 200);
    }

    #[test]
    fn test_equity_fraction_other_tiers_zero() {
        for risk in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
            assert_eq!(equity_fraction_quantity(10_000.0, 50.0, risk), 0);
        }
    }

    #[test]
    fn test_tiered_multiplier_missing_is_zero() {
        assert_eq!(tiered_quantity(10_000.0, 50.0, 99, OrderSide::Buy, RiskTier::Safe), 0);
        assert_eq!(tiered_quantity(10_000.0, 50.0, 1, OrderSide::Sell, RiskTier::Power), 0);
    }

    #[test]
    fn test_risk_multipliers() {
        // band 4: min(100000 * 0.1 / 100, 20) = 20
        assert_eq!(tiered_quantity(100_000.0, 100.0, 97, OrderSide::Buy, RiskTier::Low), 10);
        assert_eq!(tiered_quantity(100_000.0, 100.0, 97, OrderSide::Buy, RiskTier::Medium), 20);
        assert_eq!(tiered_quantity(100_000.0, 100.0, 97, OrderSide::Buy, RiskTier::High), 40);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(buy_band(79), Some(BAND_1));
        assert_eq!(buy_band(80), Some(BAND_2));
        assert_eq!(buy_band(90), Some(BAND_3));
        assert_eq!(buy_band(95), Some(BAND_4));
        assert_eq!(buy_band(100), Some(BAND_4));
        assert_eq!(buy_band(101), None);

        assert_eq!(sell_band(21), Some(BAND_1));
        assert_eq!(sell_band(20), Some(BAND_2));
        assert_eq!(sell_band(10), Some(BAND_3));
        assert_eq!(sell_band(5), Some(BAND_4));
        assert_eq!(sell_band(0), Some(BAND_4));
        assert_eq!(sell_band(-1), None);
    }

    #[test]
    fn test_out_of_band_scores_yield_zero() {
        assert_eq!(tiered_quantity(10_000.0, 50.0, 101, OrderSide::Buy, RiskTier::High), 0);
        assert_eq!(tiered_quantity(10_000.0, 50.0, -3, OrderSide::Sell, RiskTier::High), 0);
    }

    #[test]
    fn test_truncates_to_whole_shares() {
        // min(1000 * 0.05 / 30, 10) = 1.67 -> 1
        assert_eq!(tiered_quantity(1_000.0, 30.0, 85, OrderSide::Buy, RiskTier::Medium), 1);
        // 0.83 * 0.5 -> 0
        assert_eq!(tiered_quantity(1_000.0, 60.0, 85, OrderSide::Buy, RiskTier::Low), 0);
    }

    #[test]
    fn test_non_positive_price_yields_zero() {
        for price in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert_eq!(tiered_quantity(10_000.0, price, 90, OrderSide::Buy, RiskTier::High), 0);
            assert_eq!(equity_fraction_quantity(10_000.0, price, RiskTier::Power), 0);
        }
    }

    #[test]
    fn test_for_tier_selection() {
        assert_eq!(
            PositionSizer::for_tier(RiskTier::Power),
            PositionSizer::EquityFraction { risk: RiskTier::Power }
        );
        assert_eq!(
            PositionSizer::for_tier(RiskTier::Low),
            PositionSizer::Tiered { risk: RiskTier::Low }
        );
    }

    fn tiered_risk() -> impl Strategy<Value = RiskTier> {
        prop_oneof![Just(RiskTier::Low), Just(RiskTier::Medium), Just(RiskTier::High)]
    }

    proptest! {
        #[test]
        fn prop_buy_quantity_grows_with_score(
            bp in 0.0f64..1_000_000.0,
            price in 0.01f64..5_000.0,
            a in 0i64..=100,
            b in 0i64..=100,
            risk in tiered_risk(),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let q_lo = tiered_quantity(bp, price, lo, OrderSide::Buy, risk);
            let q_hi = tiered_quantity(bp, price, hi, OrderSide::Buy, risk);
            prop_assert!(q_lo <= q_hi, "buy({}) = {} > buy({}) = {}", lo, q_lo, hi, q_hi);
        }

        #[test]
        fn prop_sell_quantity_grows_as_score_falls(
            bp in 0.0f64..1_000_000.0,
            price in 0.01f64..5_000.0,
            a in 0i64..=100,
            b in 0i64..=100,
            risk in tiered_risk(),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let q_lo = tiered_quantity(bp, price, lo, OrderSide::Sell, risk);
            let q_hi = tiered_quantity(bp, price, hi, OrderSide::Sell, risk);
            prop_assert!(q_lo >= q_hi, "sell({}) = {} < sell({}) = {}", lo, q_lo, hi, q_hi);
        }

        #[test]
        fn prop_quantity_never_negative(
            bp in -1_000_000.0f64..1_000_000.0,
            price in -100.0f64..5_000.0,
            score in -10i64..=110,
        ) {
            for risk in RiskTier::ALL {
                let sizer = PositionSizer::for_tier(risk);
                prop_assert!(sizer.compute(bp, price, score, OrderSide::Buy) >= 0);
                prop_assert!(sizer.compute(bp, price, score, OrderSide::Sell) >= 0);
            }
        }
    }
}
