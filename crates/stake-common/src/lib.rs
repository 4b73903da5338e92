//! Shared types and odds arithmetic for the stake-sizing engine.
//!
//! This crate contains:
//! - Common wager types (WagerEvent, Outcome, Side, Grade, OddsBucket)
//! - American-odds math (implied probability, payout, settlement)
//! - The per-event data-error taxonomy

pub mod odds;
pub mod types;

pub use odds::{implied_probability, payout_per_unit, settle, OddsError};
pub use types::*;
