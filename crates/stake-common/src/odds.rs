//! American-odds arithmetic.
//!
//! Pure, stateless functions shared by every sizing policy and the
//! simulator. All math is `Decimal`; nothing here rounds.
//!
//! American odds are a signed integer price: negative values quote a
//! favorite (the amount staked to win 100), positive values an underdog
//! (the amount won on a 100 stake). Zero is undefined and always rejected.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Outcome;

/// Failure of an odds computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OddsError {
    /// American odds of zero carry no price information.
    #[error("American odds of zero are undefined")]
    InvalidOdds,
}

/// Break-even win probability embedded in an odds price.
///
/// `-110` implies about 0.5238 (the juice makes both sides sum past 1);
/// `+150` implies exactly 0.4.
pub fn implied_probability(odds: i32) -> Result<Decimal, OddsError> {
    if odds == 0 {
        return Err(OddsError::InvalidOdds);
    }
    let magnitude = Decimal::from(odds.unsigned_abs());
    if odds < 0 {
        Ok(magnitude / (magnitude + Decimal::ONE_HUNDRED))
    } else {
        Ok(Decimal::ONE_HUNDRED / (magnitude + Decimal::ONE_HUNDRED))
    }
}

/// Net profit per one unit staked on a winning outcome.
///
/// `100/|odds|` for favorites, `odds/100` for dogs. The stake itself is
/// returned separately by the book; this is profit only.
pub fn payout_per_unit(odds: i32) -> Result<Decimal, OddsError> {
    if odds == 0 {
        return Err(OddsError::InvalidOdds);
    }
    let magnitude = Decimal::from(odds.unsigned_abs());
    if odds < 0 {
        Ok(Decimal::ONE_HUNDRED / magnitude)
    } else {
        Ok(magnitude / Decimal::ONE_HUNDRED)
    }
}

/// Signed settlement amount for a finished wager.
///
/// Win pays `stake * payout_per_unit(odds)`, a loss costs the whole stake,
/// and a push returns it (net zero). Odds are validated for every outcome
/// so a malformed record cannot slip through on a loss.
pub fn settle(outcome: Outcome, stake: Decimal, odds: i32) -> Result<Decimal, OddsError> {
    if odds == 0 {
        return Err(OddsError::InvalidOdds);
    }
    match outcome {
        Outcome::Win => Ok(stake * payout_per_unit(odds)?),
        Outcome::Loss => Ok(-stake),
        Outcome::Push => Ok(Decimal::ZERO),
    }
}
