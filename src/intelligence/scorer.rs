use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::SightingRepo;

/// Reputation assumed for a wallet with no closed trades.
pub const NEUTRAL_REPUTATION: i32 = 50;

/// Whale buys on the same mint within this window count toward momentum.
pub const MOMENTUM_WINDOW_MINUTES: i64 = 5;

/// Letter grade attached to a signal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            85..=u32::MAX => Grade::S,
            70..=84 => Grade::A,
            50..=69 => Grade::B,
            30..=49 => Grade::C,
            _ => Grade::D,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFactors {
    pub reputation: Decimal,
    pub volume: Decimal,
    pub momentum: Decimal,
}

/// Strength of a single whale trade as a follow signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub score: u32,
    pub grade: Grade,
    pub factors: SignalFactors,
}

/// Score a trade from the trader's reputation (0-100), its size in SOL, and
/// how many whales bought the same token recently (including this one).
pub fn score_signal(reputation: i32, amount_sol: Decimal, recent_whale_count: i64) -> SignalScore {
    let reputation = Decimal::from(reputation.clamp(0, 100));
    let reputation_factor = reputation / Decimal::ONE_HUNDRED * Decimal::from(40);
    let volume_factor = volume_factor(amount_sol);
    let momentum_factor = (Decimal::from(recent_whale_count.max(0)) * Decimal::from(5)).min(Decimal::from(25));

    let total = (reputation_factor + volume_factor + momentum_factor).floor();
    let score = total.to_u32().unwrap_or(0).min(100);

    SignalScore {
        score,
        grade: Grade::from_score(score),
        factors: SignalFactors {
            reputation: reputation_factor,
            volume: volume_factor,
            momentum: momentum_factor,
        },
    }
}

/// Score a trade at query time from the wallet's stored reputation and the
/// whale buys on the same mint up to and including `at`.
pub async fn score_at(
    sightings: &dyn SightingRepo,
    reputation: Option<i32>,
    mint: &str,
    amount_sol: Decimal,
    at: DateTime<Utc>,
) -> anyhow::Result<SignalScore> {
    let since = at - Duration::minutes(MOMENTUM_WINDOW_MINUTES);
    let recent = sightings.count_whale_buys(mint, since, at).await?.max(1);
    Ok(score_signal(
        reputation.unwrap_or(NEUTRAL_REPUTATION),
        amount_sol,
        recent,
    ))
}

/// Step function over trade size; breakpoints at 1, 5 and 10 SOL.
fn volume_factor(amount_sol: Decimal) -> Decimal {
    if amount_sol < Decimal::ONE {
        Decimal::ZERO
    } else if amount_sol < Decimal::from(5) {
        (amount_sol * Decimal::TEN).min(Decimal::from(20))
    } else if amount_sol < Decimal::TEN {
        Decimal::from(25)
    } else {
        Decimal::from(35)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_inputs_grade_s() {
        let s = score_signal(100, Decimal::from(10), 5);
        assert_eq!(s.score, 100);
        assert_eq!(s.grade, Grade::S);
    }

    #[test]
    fn test_minimal_inputs_grade_d() {
        let s = score_signal(0, Decimal::ZERO, 1);
        assert_eq!(s.score, 5);
        assert_eq!(s.grade, Grade::D);
    }

    #[test]
    fn test_mid_reputation_single_sol() {
        let s = score_signal(60, Decimal::ONE, 1);
        assert_eq!(s.factors.reputation, Decimal::from(24));
        assert_eq!(s.factors.volume, Decimal::from(10));
        assert_eq!(s.factors.momentum, Decimal::from(5));
        assert_eq!(s.score, 39);
        assert_eq!(s.grade, Grade::C);
    }

    #[test]
    fn test_volume_breakpoints() {
        assert_eq!(volume_factor(Decimal::new(99, 2)), Decimal::ZERO);
        assert_eq!(volume_factor(Decimal::new(15, 1)), Decimal::from(15));
        // 4.99 SOL would be 49.9 uncapped
        assert_eq!(volume_factor(Decimal::new(499, 2)), Decimal::from(20));
        assert_eq!(volume_factor(Decimal::from(5)), Decimal::from(25));
        assert_eq!(volume_factor(Decimal::new(999, 2)), Decimal::from(25));
        assert_eq!(volume_factor(Decimal::from(10)), Decimal::from(35));
        assert_eq!(volume_factor(Decimal::from(500)), Decimal::from(35));
    }

    #[test]
    fn test_momentum_caps_at_25() {
        let s = score_signal(0, Decimal::ZERO, 40);
        assert_eq!(s.factors.momentum, Decimal::from(25));
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(85), Grade::S);
        assert_eq!(Grade::from_score(84), Grade::A);
        assert_eq!(Grade::from_score(70), Grade::A);
        assert_eq!(Grade::from_score(69), Grade::B);
        assert_eq!(Grade::from_score(50), Grade::B);
        assert_eq!(Grade::from_score(49), Grade::C);
        assert_eq!(Grade::from_score(30), Grade::C);
        assert_eq!(Grade::from_score(29), Grade::D);
    }

    #[test]
    fn test_factors_sum_matches_score_across_grid() {
        let amounts = [0i64, 50, 100, 137, 250, 499, 500, 750, 1000, 5000];
        for rep in (0..=100).step_by(7) {
            for &cents in &amounts {
                for count in 1..=7 {
                    let amount = Decimal::new(cents, 2);
                    let a = score_signal(rep, amount, count);
                    let b = score_signal(rep, amount, count);
                    assert_eq!(a, b, "scoring must be deterministic");

                    let sum = a.factors.reputation + a.factors.volume + a.factors.momentum;
                    let diff = sum - Decimal::from(a.score);
                    assert!(diff >= Decimal::ZERO && diff < Decimal::ONE);
                    assert!(a.score <= 100);
                }
            }
        }
    }
}
