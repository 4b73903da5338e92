//! Simulation configuration.
//!
//! All parameters travel in an explicit [`SimConfig`] struct passed to the
//! simulator and comparator; nothing is read from globals, files or the
//! environment. Defaults are the constants the historical Kelly analysis
//! settled on. [`SimConfig::validate`] rejects unusable parameter sets
//! before any simulation step runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal configuration failure, raised by [`SimConfig::validate`] before a
/// run starts. Unlike per-event data errors these abort immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A bankroll that starts at or below zero cannot stake anything.
    #[error("starting_bankroll must be positive, got {value}")]
    NonPositiveStartingBankroll { value: Decimal },

    /// A floor at or above the starting bankroll would halt the run before
    /// the first event.
    #[error("bankroll_floor {floor} must be below starting_bankroll {starting}")]
    FloorAtOrAboveStarting { floor: Decimal, starting: Decimal },

    /// The per-bet fraction cap must leave room for a positive stake.
    #[error("max_bet_fraction_of_bankroll must be positive, got {value}")]
    NonPositiveMaxFraction { value: Decimal },
}

/// Metric the comparator ranks policy rows by.
///
/// `Roi`, `FinalBalance` and `RiskAdjusted` rank descending (more is
/// better); `MaxDrawdown` ranks ascending (shallower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKey {
    Roi,
    FinalBalance,
    MaxDrawdown,
    RiskAdjusted,
}

impl RankKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankKey::Roi => "roi",
            RankKey::FinalBalance => "final_balance",
            RankKey::MaxDrawdown => "max_drawdown",
            RankKey::RiskAdjusted => "risk_adjusted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "roi" => Some(RankKey::Roi),
            "final_balance" => Some(RankKey::FinalBalance),
            "max_drawdown" => Some(RankKey::MaxDrawdown),
            "risk_adjusted" => Some(RankKey::RiskAdjusted),
            _ => None,
        }
    }
}

impl std::fmt::Display for RankKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the comparator breaks ties on the primary rank key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakRule {
    /// Keep the order policies were registered in (stable sort).
    RegistrationOrder,
    /// The shallower maximum drawdown wins the tie.
    LowerMaxDrawdown,
}

impl TieBreakRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakRule::RegistrationOrder => "registration_order",
            TieBreakRule::LowerMaxDrawdown => "lower_max_drawdown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "registration_order" => Some(TieBreakRule::RegistrationOrder),
            "lower_max_drawdown" => Some(TieBreakRule::LowerMaxDrawdown),
            _ => None,
        }
    }
}

impl std::fmt::Display for TieBreakRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for one simulation or comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Bankroll every run starts from (units).
    pub starting_bankroll: Decimal,

    /// Capital floor. A balance below this after settlement halts the run.
    pub bankroll_floor: Decimal,

    /// Hard cap on any single stake as a fraction of the current bankroll.
    pub max_bet_fraction_of_bankroll: Decimal,

    /// Smallest stake worth placing (units).
    pub minimum_stake: Decimal,

    /// Shrink applied to the raw Kelly fraction (0.25 = quarter Kelly).
    pub kelly_shrink_factor: Decimal,

    /// Retain a per-event ledger in the report. Off by default so
    /// summary-only runs stay allocation-free per event.
    pub retain_ledger: bool,

    /// Metric comparison rows are ranked by.
    pub rank_key: RankKey,

    /// Tie-break applied when two rows rank equal on the primary key.
    pub tie_break_rule: TieBreakRule,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_bankroll: Decimal::new(500, 0),      // 500 units
            bankroll_floor: Decimal::new(100, 0),         // 100 units
            max_bet_fraction_of_bankroll: Decimal::new(5, 2), // 0.05 = 5%
            minimum_stake: Decimal::new(5, 0),            // 5 units
            kelly_shrink_factor: Decimal::new(25, 2),     // 0.25 = quarter Kelly
            retain_ledger: false,
            rank_key: RankKey::Roi,
            tie_break_rule: TieBreakRule::RegistrationOrder,
        }
    }
}

impl SimConfig {
    /// Validate the parameter set. Called by the simulator and comparator
    /// before touching any event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_bankroll <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveStartingBankroll {
                value: self.starting_bankroll,
            });
        }
        if self.bankroll_floor >= self.starting_bankroll {
            return Err(ConfigError::FloorAtOrAboveStarting {
                floor: self.bankroll_floor,
                starting: self.starting_bankroll,
            });
        }
        if self.max_bet_fraction_of_bankroll <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveMaxFraction {
                value: self.max_bet_fraction_of_bankroll,
            });
        }
        Ok(())
    }
}
