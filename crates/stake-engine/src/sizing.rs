//! Stake-sizing policies.
//!
//! Every policy implements [`SizingPolicy`]: given a wager, the current
//! bankroll state and the run configuration, produce exactly one of
//! stake-or-skip. Policies are stateless between calls and `Send + Sync`,
//! so the same boxed value can serve any number of runs.
//!
//! ## Policies
//!
//! - [`FixedFractionPolicy`]: flat units per confidence tier, independent
//!   of the current bankroll
//! - [`FractionalKellyPolicy`]: shrunk Kelly fraction of the current
//!   bankroll, hard-capped per bet
//! - [`MatrixPolicy`]: unit lookup by (grade category, odds bucket) cell
//!
//! A policy that cannot size an event because the record lacks a required
//! attribute returns the [`DataError`] instead of guessing; the simulator
//! records it and moves on.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stake_common::{payout_per_unit, DataError, GradeCategory, OddsBucket, WagerEvent};

use crate::bankroll::BankrollState;
use crate::config::SimConfig;
use crate::scoring::{ConfidenceScorer, Tier};

/// Why a policy (or the simulator itself) declined to stake an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Current balance is under the configured capital floor.
    BankrollBelowFloor,
    /// The stake would exceed the entire current balance.
    StakeExceedsBankroll,
    /// The model sees no positive edge at these odds.
    NonPositiveEdge,
    /// The minimum stake does not fit under the per-bet fraction cap.
    MinimumAboveCap,
    /// The run has already halted; events are skipped unconditionally.
    Halted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::BankrollBelowFloor => write!(f, "bankroll below floor"),
            SkipReason::StakeExceedsBankroll => write!(f, "stake exceeds bankroll"),
            SkipReason::NonPositiveEdge => write!(f, "non-positive edge"),
            SkipReason::MinimumAboveCap => write!(f, "minimum stake above fraction cap"),
            SkipReason::Halted => write!(f, "simulator halted"),
        }
    }
}

/// A sizing verdict: stake an amount, or skip with a reason. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SizingDecision {
    Stake { amount: Decimal },
    Skip { reason: SkipReason },
}

impl SizingDecision {
    /// The staked amount, when this decision stakes.
    pub fn stake_amount(&self) -> Option<Decimal> {
        match self {
            SizingDecision::Stake { amount } => Some(*amount),
            SizingDecision::Skip { .. } => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SizingDecision::Skip { .. })
    }
}

impl std::fmt::Display for SizingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizingDecision::Stake { amount } => write!(f, "stake {}", amount),
            SizingDecision::Skip { reason } => write!(f, "skip ({})", reason),
        }
    }
}

/// A stake-sizing policy.
///
/// Implementations hold only immutable configuration; all run state lives
/// in the [`BankrollState`] owned by the simulator.
pub trait SizingPolicy: Send + Sync {
    /// Stable policy name, used in comparison rows and logs.
    fn name(&self) -> &str;

    /// Decide a stake for `wager` against the current bankroll state.
    fn decide(
        &self,
        wager: &WagerEvent,
        state: &BankrollState,
        config: &SimConfig,
    ) -> Result<SizingDecision, DataError>;
}

/// Default flat units per tier, lowest to highest.
const DEFAULT_TIER_UNITS: [Decimal; 5] = [dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];

/// Flat units per confidence tier.
///
/// The stake depends only on the wager's tier, never on the bankroll, so
/// this policy behaves like the historical flat-unit betting records.
#[derive(Debug)]
pub struct FixedFractionPolicy {
    scorer: ConfidenceScorer,
    units: [Decimal; 5],
}

impl Default for FixedFractionPolicy {
    fn default() -> Self {
        Self::new(ConfidenceScorer::default())
    }
}

impl FixedFractionPolicy {
    pub fn new(scorer: ConfidenceScorer) -> Self {
        Self::with_units(scorer, DEFAULT_TIER_UNITS)
    }

    /// Custom unit ladder, indexed lowest tier to highest.
    pub fn with_units(scorer: ConfidenceScorer, units: [Decimal; 5]) -> Self {
        Self { scorer, units }
    }

    /// Flat unit value for a tier.
    pub fn unit_for(&self, tier: Tier) -> Decimal {
        self.units[tier as usize]
    }
}

impl SizingPolicy for FixedFractionPolicy {
    fn name(&self) -> &str {
        "fixed_fraction"
    }

    fn decide(
        &self,
        wager: &WagerEvent,
        _state: &BankrollState,
        _config: &SimConfig,
    ) -> Result<SizingDecision, DataError> {
        let tier = self.scorer.tier(wager);
        Ok(SizingDecision::Stake {
            amount: self.unit_for(tier),
        })
    }
}

/// Fractional Kelly sizing.
///
/// Stakes a shrunk Kelly fraction of the *current* bankroll, hard-capped
/// at `max_bet_fraction_of_bankroll`. The returned stake never exceeds
/// that cap times the balance, whatever the minimum-stake setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct FractionalKellyPolicy;

impl FractionalKellyPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SizingPolicy for FractionalKellyPolicy {
    fn name(&self) -> &str {
        "fractional_kelly"
    }

    fn decide(
        &self,
        wager: &WagerEvent,
        state: &BankrollState,
        config: &SimConfig,
    ) -> Result<SizingDecision, DataError> {
        // 1. The Kelly formula needs the model's win probability.
        let p = wager.probability.ok_or_else(|| DataError::MissingProbability {
            event_id: wager.id.clone(),
        })?;

        // 2. Net payout per unit staked. Zero odds carry no price.
        let b = payout_per_unit(wager.odds).map_err(|_| DataError::InvalidOdds {
            event_id: wager.id.clone(),
        })?;

        // 3. Edge = p*b - (1-p): expected profit per unit at the model's
        //    probability. No edge, no bet.
        let edge = p * b - (Decimal::ONE - p);
        if edge <= Decimal::ZERO {
            return Ok(SizingDecision::Skip {
                reason: SkipReason::NonPositiveEdge,
            });
        }

        // 4. Shrink the raw Kelly fraction, then cap it per bet.
        let fraction =
            (edge / b * config.kelly_shrink_factor).min(config.max_bet_fraction_of_bankroll);

        // 5. Stake that fraction of the current balance, raised to the
        //    minimum stake. A minimum that cannot fit under the cap is a
        //    skip, not an oversized bet.
        let cap = state.balance * config.max_bet_fraction_of_bankroll;
        let stake = (fraction * state.balance).max(config.minimum_stake);
        if stake > cap {
            return Ok(SizingDecision::Skip {
                reason: SkipReason::MinimumAboveCap,
            });
        }

        // 6. Guard the capital floor and the balance itself.
        if state.balance < config.bankroll_floor {
            return Ok(SizingDecision::Skip {
                reason: SkipReason::BankrollBelowFloor,
            });
        }
        if stake > state.balance {
            return Ok(SizingDecision::Skip {
                reason: SkipReason::StakeExceedsBankroll,
            });
        }

        Ok(SizingDecision::Stake { amount: stake })
    }
}

/// Unit lookup by (grade category, odds bucket) cell.
///
/// The default table is the conservative A/B/C ladder from the historical
/// matrix analysis: 3 units for A-family grades, 2 for B, 1 for C, in
/// every odds bucket. Cells can be overridden individually; a combination
/// with no cell resolves to the baseline unit value.
#[derive(Debug, Clone)]
pub struct MatrixPolicy {
    units: HashMap<(GradeCategory, OddsBucket), Decimal>,
    baseline: Decimal,
}

impl Default for MatrixPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixPolicy {
    /// The full default table with a baseline of 1 unit.
    pub fn new() -> Self {
        let mut units = HashMap::new();
        for bucket in OddsBucket::ALL {
            units.insert((GradeCategory::A, bucket), dec!(3));
            units.insert((GradeCategory::B, bucket), dec!(2));
            units.insert((GradeCategory::C, bucket), dec!(1));
        }
        Self {
            units,
            baseline: dec!(1),
        }
    }

    /// An empty table: every combination resolves to `baseline` until
    /// cells are added.
    pub fn empty(baseline: Decimal) -> Self {
        Self {
            units: HashMap::new(),
            baseline,
        }
    }

    /// Override one cell.
    pub fn with_cell(
        mut self,
        category: GradeCategory,
        bucket: OddsBucket,
        units: Decimal,
    ) -> Self {
        self.units.insert((category, bucket), units);
        self
    }

    /// Unit value for a cell, falling back to the baseline.
    pub fn units_for(&self, category: GradeCategory, bucket: OddsBucket) -> Decimal {
        self.units
            .get(&(category, bucket))
            .copied()
            .unwrap_or(self.baseline)
    }
}

impl SizingPolicy for MatrixPolicy {
    fn name(&self) -> &str {
        "matrix"
    }

    fn decide(
        &self,
        wager: &WagerEvent,
        _state: &BankrollState,
        _config: &SimConfig,
    ) -> Result<SizingDecision, DataError> {
        // The grade axis is required; an absent grade is a data error,
        // never a silent fallback category.
        let grade = wager.grade.ok_or_else(|| DataError::MissingGrade {
            event_id: wager.id.clone(),
        })?;

        let amount = self.units_for(grade.category(), wager.bucket());
        Ok(SizingDecision::Stake { amount })
    }
}
