//! Stake-sizing and bankroll-simulation engine.
//!
//! This crate turns a wager's signal attributes (model probability, American
//! odds, quality grade) into a capital allocation, and replays an ordered
//! history of wagers through competing sizing policies to produce bankroll
//! trajectories, drawdown and return metrics.
//!
//! The engine is a pure library: it consumes an in-memory slice of
//! [`stake_common::WagerEvent`] records already ordered for replay and
//! returns structured results. Retrieval, filtering, report rendering and
//! subscriber installation are the caller's concern.
//!
//! ## Modules
//!
//! - `config`: Simulation parameters and validation
//! - `scoring`: Rule-table confidence scoring and tier mapping
//! - `sizing`: The `SizingPolicy` trait and its three implementations
//! - `bankroll`: Sequential replay state machine and run summaries
//! - `compare`: Side-by-side policy comparison with ranked rows

pub mod bankroll;
pub mod compare;
pub mod config;
pub mod scoring;
pub mod sizing;

pub use bankroll::{
    BankrollSimulator, BankrollState, LedgerEntry, RunStatus, SimulationReport,
};
pub use compare::{Comparator, ComparisonReport, ComparisonRow};
pub use config::{ConfigError, RankKey, SimConfig, TieBreakRule};
pub use scoring::{ConfidenceScorer, FactorRule, ScoreBreakdown, ScoringFactor, Tier};
pub use sizing::{
    FixedFractionPolicy, FractionalKellyPolicy, MatrixPolicy, SizingDecision, SizingPolicy,
    SkipReason,
};
