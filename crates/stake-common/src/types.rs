//! Shared wager types for the stake-sizing engine.
//!
//! CRITICAL: All stakes, balances, probabilities, and scores use
//! `rust_decimal::Decimal`. NEVER use f64 for financial math.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a textual field cannot be mapped to one of the closed enums.
///
/// Ingestion code uses this to turn unrecognized outcome/side/grade strings
/// into a [`DataError`] carrying the event id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {field}: {value:?}")]
pub struct ParseEnumError {
    /// Which field failed to parse (e.g. "outcome").
    pub field: &'static str,
    /// The offending input.
    pub value: String,
}

impl ParseEnumError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Settled result of a wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
    Push,
}

impl Outcome {
    /// Returns the canonical record label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Push => "PUSH",
        }
    }

    /// Parses a record label, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "WIN" => Some(Outcome::Win),
            "LOSS" => Some(Outcome::Loss),
            "PUSH" => Some(Outcome::Push),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseEnumError::new("outcome", s))
    }
}

/// Which side of the matchup the wager backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseEnumError::new("side", s))
    }
}

/// Letter quality grade assigned to a wager by the upstream model.
///
/// The full `A+`..`F` scale appears in historical records; sizing matrices
/// work on the simplified [`GradeCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Parses a grade label; whitespace and case are normalized first.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A+" => Some(Grade::APlus),
            "A" => Some(Grade::A),
            "A-" => Some(Grade::AMinus),
            "B+" => Some(Grade::BPlus),
            "B" => Some(Grade::B),
            "B-" => Some(Grade::BMinus),
            "C+" => Some(Grade::CPlus),
            "C" => Some(Grade::C),
            "C-" => Some(Grade::CMinus),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }

    /// Collapses the eleven-grade scale into the three-category scale used
    /// by matrix sizing: A-family, B-family, everything else C.
    pub fn category(&self) -> GradeCategory {
        match self {
            Grade::APlus | Grade::A | Grade::AMinus => GradeCategory::A,
            Grade::BPlus | Grade::B | Grade::BMinus => GradeCategory::B,
            Grade::CPlus | Grade::C | Grade::CMinus | Grade::D | Grade::F => GradeCategory::C,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseEnumError::new("grade", s))
    }
}

/// Simplified grade axis for matrix sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeCategory {
    A,
    B,
    C,
}

impl std::fmt::Display for GradeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeCategory::A => write!(f, "A"),
            GradeCategory::B => write!(f, "B"),
            GradeCategory::C => write!(f, "C"),
        }
    }
}

/// Market segment derived from the American odds price.
///
/// Boundaries follow the historical performance analysis ranges:
/// below -1000 is extreme chalk, -150..150 is a pick'em, and anything at
/// +150 or longer counts as a dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OddsBucket {
    ExtremeFavorite,
    BigFavorite,
    ModerateFavorite,
    SlightFavorite,
    PickEm,
    Dog,
}

impl OddsBucket {
    /// Classifies raw American odds into a segment.
    ///
    /// Total over all integers; odds validity (nonzero) is enforced where
    /// money moves, not here.
    pub fn from_odds(odds: i32) -> Self {
        if odds < -1000 {
            OddsBucket::ExtremeFavorite
        } else if odds < -500 {
            OddsBucket::BigFavorite
        } else if odds < -200 {
            OddsBucket::ModerateFavorite
        } else if odds < -150 {
            OddsBucket::SlightFavorite
        } else if odds < 150 {
            OddsBucket::PickEm
        } else {
            OddsBucket::Dog
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OddsBucket::ExtremeFavorite => "EXTREME_FAVORITE",
            OddsBucket::BigFavorite => "BIG_FAVORITE",
            OddsBucket::ModerateFavorite => "MODERATE_FAVORITE",
            OddsBucket::SlightFavorite => "SLIGHT_FAVORITE",
            OddsBucket::PickEm => "PICK_EM",
            OddsBucket::Dog => "DOG",
        }
    }

    /// All buckets in favorite-to-dog order. Used to build full sizing
    /// matrices.
    pub const ALL: [OddsBucket; 6] = [
        OddsBucket::ExtremeFavorite,
        OddsBucket::BigFavorite,
        OddsBucket::ModerateFavorite,
        OddsBucket::SlightFavorite,
        OddsBucket::PickEm,
        OddsBucket::Dog,
    ];
}

impl std::fmt::Display for OddsBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single malformed-event failure.
///
/// Data errors are recovered locally: the simulator skips the event, records
/// the error in its diagnostics list, and continues the run. A missing field
/// is always reported, never silently substituted with a guessed value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataError {
    /// American odds of zero are undefined.
    #[error("event {event_id}: invalid odds of zero")]
    InvalidOdds { event_id: String },

    /// The active policy requires an estimated win probability.
    #[error("event {event_id}: missing model probability")]
    MissingProbability { event_id: String },

    /// The active policy requires a quality grade.
    #[error("event {event_id}: missing quality grade")]
    MissingGrade { event_id: String },

    /// A textual field held a value outside the closed enum
    /// (produced at the ingestion boundary via the `FromStr` impls).
    #[error("event {event_id}: unrecognized {field}: {value:?}")]
    UnrecognizedValue {
        event_id: String,
        field: String,
        value: String,
    },
}

impl DataError {
    /// The id of the offending event.
    pub fn event_id(&self) -> &str {
        match self {
            DataError::InvalidOdds { event_id }
            | DataError::MissingProbability { event_id }
            | DataError::MissingGrade { event_id }
            | DataError::UnrecognizedValue { event_id, .. } => event_id,
        }
    }

    /// Wraps a parse failure with the event it occurred in.
    pub fn from_parse(event_id: impl Into<String>, err: ParseEnumError) -> Self {
        DataError::UnrecognizedValue {
            event_id: event_id.into(),
            field: err.field.to_string(),
            value: err.value,
        }
    }
}

/// An immutable historical wager record.
///
/// Events arrive already ordered for replay (non-decreasing timestamp, ties
/// broken by input order); retrieval and ordering are the caller's
/// responsibility. Signal attributes are optional because historical records
/// are incomplete; policies that need an absent attribute fail that event
/// with a [`DataError`] instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerEvent {
    /// Stable record identifier, echoed in ledger entries and diagnostics.
    pub id: String,

    /// Event time; informational only, replay order is positional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Side of the matchup the wager backs.
    pub side: Side,

    /// Raw American odds. Zero is representable and rejected as a
    /// [`DataError`] wherever money is computed from it.
    pub odds: i32,

    /// Settled result.
    pub outcome: Outcome,

    /// Model-estimated win probability in (0, 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<Decimal>,

    /// Predicted expected value, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_percent: Option<Decimal>,

    /// Model quality grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
}

impl WagerEvent {
    /// Creates an event with the required fields; signal attributes are
    /// attached with the `with_*` builders.
    pub fn new(id: impl Into<String>, side: Side, odds: i32, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            side,
            odds,
            outcome,
            probability: None,
            ev_percent: None,
            grade: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_probability(mut self, probability: Decimal) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_ev_percent(mut self, ev_percent: Decimal) -> Self {
        self.ev_percent = Some(ev_percent);
        self
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = Some(grade);
        self
    }

    /// Market segment derived from this event's odds.
    pub fn bucket(&self) -> OddsBucket {
        OddsBucket::from_odds(self.odds)
    }
}
