//! Confidence scoring for wager events.
//!
//! A wager's signal attributes are evaluated by an ordered registry of
//! scoring factors. Each factor is a priority-ordered table of rules
//! (predicate, label, points); the first rule that matches contributes its
//! points and label, and a factor with no matching rule contributes
//! nothing. A missing attribute therefore scores zero rather than being
//! replaced with a guess. Factors can be added or removed without touching
//! the score-to-tier mapping.
//!
//! ## Default factors
//!
//! The default registry encodes the historical performance analysis:
//!
//! - **grade**: A and B+ score best; A+ historically underperforms
//! - **odds sweet spot**: -110 to -200 favorites; chalk and big dogs score 0
//! - **model probability**: 70%+ is strong conviction
//! - **expected value**: 5-15% is the goldilocks zone, 20%+ is overconfident
//! - **venue**: away sides have performed better
//!
//! Totals map to five ordered tiers, with one hard override: grade `F` is
//! pinned to the bottom tier no matter what the other factors add up to.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stake_common::{Grade, Side, WagerEvent};

type Predicate = Box<dyn Fn(&WagerEvent) -> bool + Send + Sync>;

/// One row of a factor's rule table.
pub struct FactorRule {
    label: String,
    points: Decimal,
    predicate: Predicate,
}

impl FactorRule {
    pub fn new(
        label: impl Into<String>,
        points: Decimal,
        predicate: impl Fn(&WagerEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            points,
            predicate: Box::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> Decimal {
        self.points
    }

    fn matches(&self, wager: &WagerEvent) -> bool {
        (self.predicate)(wager)
    }
}

impl std::fmt::Debug for FactorRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorRule")
            .field("label", &self.label)
            .field("points", &self.points)
            .finish()
    }
}

/// A named, priority-ordered rule table. The first matching rule wins.
pub struct ScoringFactor {
    name: String,
    rules: Vec<FactorRule>,
}

impl ScoringFactor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Append a rule. Order is priority: earlier rules shadow later ones.
    pub fn rule(
        mut self,
        label: impl Into<String>,
        points: Decimal,
        predicate: impl Fn(&WagerEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(FactorRule::new(label, points, predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[FactorRule] {
        &self.rules
    }

    /// First rule whose predicate matches, if any.
    fn evaluate(&self, wager: &WagerEvent) -> Option<&FactorRule> {
        self.rules.iter().find(|rule| rule.matches(wager))
    }
}

impl std::fmt::Debug for ScoringFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringFactor")
            .field("name", &self.name)
            .field(
                "rules",
                &self.rules.iter().map(FactorRule::label).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Result of scoring one wager: the summed points and the label of every
/// rule that matched, in factor order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: Decimal,
    pub labels: Vec<String>,
}

/// Confidence tier, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Low,
    Moderate,
    Good,
    High,
    Elite,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "LOW",
            Tier::Moderate => "MODERATE",
            Tier::Good => "GOOD",
            Tier::High => "HIGH",
            Tier::Elite => "ELITE",
        }
    }

    /// All tiers, lowest to highest. Used to build full unit tables.
    pub const ALL: [Tier; 5] = [
        Tier::Low,
        Tier::Moderate,
        Tier::Good,
        Tier::High,
        Tier::Elite,
    ];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evaluates the factor registry and maps totals to tiers.
pub struct ConfidenceScorer {
    factors: Vec<ScoringFactor>,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(Self::default_factors())
    }
}

impl ConfidenceScorer {
    pub fn new(factors: Vec<ScoringFactor>) -> Self {
        Self { factors }
    }

    /// The historical default registry. Maximum attainable total is 7.0.
    pub fn default_factors() -> Vec<ScoringFactor> {
        vec![
            ScoringFactor::new("grade")
                .rule("grade A", dec!(2), |w| w.grade == Some(Grade::A))
                .rule("grade B+", dec!(2), |w| w.grade == Some(Grade::BPlus))
                .rule("grade C", dec!(1), |w| w.grade == Some(Grade::C))
                .rule("grade A+", dec!(0.5), |w| w.grade == Some(Grade::APlus))
                .rule("grade B", dec!(0.5), |w| w.grade == Some(Grade::B))
                .rule("grade D", dec!(0.5), |w| w.grade == Some(Grade::D))
                .rule("grade F", dec!(0), |w| w.grade == Some(Grade::F)),
            ScoringFactor::new("odds sweet spot")
                .rule("sweet spot favorite", dec!(2), |w| {
                    w.odds > -200 && w.odds <= -110
                })
                .rule("big favorite", dec!(1), |w| w.odds > -300 && w.odds <= -200)
                .rule("heavy chalk", dec!(0), |w| w.odds <= -300)
                .rule("pick'em range", dec!(0.5), |w| w.odds > -110 && w.odds < 130)
                .rule("slight dog", dec!(0.5), |w| w.odds >= 130 && w.odds < 200)
                .rule("big dog", dec!(0), |w| w.odds >= 200),
            ScoringFactor::new("model probability")
                .rule("high model probability", dec!(1.5), |w| {
                    w.probability.is_some_and(|p| p >= dec!(0.70))
                })
                .rule("good model probability", dec!(1), |w| {
                    w.probability.is_some_and(|p| p >= dec!(0.60))
                })
                .rule("moderate model probability", dec!(0.5), |w| {
                    w.probability.is_some_and(|p| p >= dec!(0.55))
                })
                .rule("low model probability", dec!(0), |w| w.probability.is_some()),
            ScoringFactor::new("expected value")
                .rule("goldilocks ev", dec!(1), |w| {
                    w.ev_percent.is_some_and(|ev| ev >= dec!(5) && ev < dec!(15))
                })
                .rule("low positive ev", dec!(0.5), |w| {
                    w.ev_percent
                        .is_some_and(|ev| ev >= Decimal::ZERO && ev < dec!(5))
                })
                .rule("high ev", dec!(0.5), |w| {
                    w.ev_percent.is_some_and(|ev| ev >= dec!(15) && ev < dec!(20))
                })
                .rule("very high ev", dec!(0), |w| {
                    w.ev_percent.is_some_and(|ev| ev >= dec!(20))
                })
                .rule("negative ev", dec!(0.5), |w| {
                    w.ev_percent.is_some_and(|ev| ev < Decimal::ZERO)
                }),
            ScoringFactor::new("venue")
                .rule("away side", dec!(0.5), |w| w.side == Side::Away)
                .rule("home side", dec!(0), |w| w.side == Side::Home),
        ]
    }

    /// Append a factor to the registry.
    pub fn add_factor(&mut self, factor: ScoringFactor) {
        self.factors.push(factor);
    }

    /// Remove a factor by name, returning it when present.
    pub fn remove_factor(&mut self, name: &str) -> Option<ScoringFactor> {
        let idx = self.factors.iter().position(|f| f.name() == name)?;
        Some(self.factors.remove(idx))
    }

    pub fn factors(&self) -> &[ScoringFactor] {
        &self.factors
    }

    /// Score a wager: sum the first-matching rule of every factor.
    pub fn score(&self, wager: &WagerEvent) -> ScoreBreakdown {
        let mut total = Decimal::ZERO;
        let mut labels = Vec::new();

        for factor in &self.factors {
            if let Some(rule) = factor.evaluate(wager) {
                total += rule.points;
                labels.push(rule.label.clone());
            }
        }

        ScoreBreakdown { total, labels }
    }

    /// Map a total score onto the five-tier ladder.
    pub fn tier_for_score(score: Decimal) -> Tier {
        if score >= dec!(5.5) {
            Tier::Elite
        } else if score >= dec!(4.5) {
            Tier::High
        } else if score >= dec!(3.5) {
            Tier::Good
        } else if score >= dec!(2.5) {
            Tier::Moderate
        } else {
            Tier::Low
        }
    }

    /// Tier for a wager. The override is checked before the score is
    /// mapped: grade F can never leave the bottom tier.
    pub fn tier(&self, wager: &WagerEvent) -> Tier {
        if wager.grade == Some(Grade::F) {
            return Tier::Low;
        }
        Self::tier_for_score(self.score(wager).total)
    }
}

impl std::fmt::Debug for ConfidenceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidenceScorer")
            .field(
                "factors",
                &self.factors.iter().map(ScoringFactor::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
