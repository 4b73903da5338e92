//! Side-by-side policy comparison.
//!
//! [`Comparator`] runs the bankroll simulator once per registered policy
//! over the identical event slice and configuration. Every run builds its
//! own fresh state, so policies never see each other's balances. The
//! result is one summary row per policy, ranked by the configured key
//! with the configured tie-break.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stake_common::WagerEvent;
use tracing::info;

use crate::bankroll::{BankrollSimulator, SimulationReport};
use crate::config::{ConfigError, RankKey, SimConfig, TieBreakRule};
use crate::sizing::SizingPolicy;

/// One ranked summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// 1-based rank after sorting.
    pub rank: u32,
    pub policy: String,
    pub final_balance: Decimal,
    pub roi: Decimal,
    pub max_drawdown: Decimal,
    pub risk_adjusted: Decimal,
}

impl ComparisonRow {
    fn from_report(report: &SimulationReport) -> Self {
        Self {
            rank: 0,
            policy: report.policy.clone(),
            final_balance: report.final_balance,
            roi: report.roi,
            max_drawdown: report.max_drawdown,
            risk_adjusted: report.risk_adjusted,
        }
    }
}

/// Result of one comparison: ranked rows plus the full per-policy
/// reports in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub reports: Vec<SimulationReport>,
}

impl ComparisonReport {
    /// The top-ranked row, when any policy was registered.
    pub fn winner(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }
}

/// Runs every registered policy over the same events and ranks the
/// outcomes.
pub struct Comparator {
    simulator: BankrollSimulator,
    policies: Vec<Box<dyn SizingPolicy>>,
}

impl Comparator {
    /// Build a comparator, validating the configuration first.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            simulator: BankrollSimulator::new(config)?,
            policies: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        self.simulator.config()
    }

    /// Register a policy. Registration order is the tie-break order when
    /// the config keeps ties in registration order.
    pub fn register(&mut self, policy: Box<dyn SizingPolicy>) {
        self.policies.push(policy);
    }

    /// Run all registered policies over the identical event slice.
    pub fn run(&self, events: &[WagerEvent]) -> ComparisonReport {
        let reports: Vec<SimulationReport> = self
            .policies
            .iter()
            .map(|policy| self.simulator.run(policy.as_ref(), events))
            .collect();

        let mut rows: Vec<ComparisonRow> = reports.iter().map(ComparisonRow::from_report).collect();
        self.rank(&mut rows);

        info!(
            policies = rows.len(),
            events = events.len(),
            winner = rows.first().map(|r| r.policy.as_str()).unwrap_or("-"),
            "comparison complete"
        );

        ComparisonReport { rows, reports }
    }

    /// Stable sort on the configured key, then assign 1-based ranks.
    fn rank(&self, rows: &mut [ComparisonRow]) {
        let key = self.config().rank_key;
        let tie_break = self.config().tie_break_rule;

        rows.sort_by(|a, b| {
            let primary = match key {
                RankKey::Roi => b.roi.cmp(&a.roi),
                RankKey::FinalBalance => b.final_balance.cmp(&a.final_balance),
                RankKey::RiskAdjusted => b.risk_adjusted.cmp(&a.risk_adjusted),
                RankKey::MaxDrawdown => a.max_drawdown.cmp(&b.max_drawdown),
            };
            match tie_break {
                // The sort is stable, so an equal ordering preserves
                // registration order by itself.
                TieBreakRule::RegistrationOrder => primary,
                TieBreakRule::LowerMaxDrawdown => {
                    primary.then_with(|| a.max_drawdown.cmp(&b.max_drawdown))
                }
            }
        });

        for (idx, row) in rows.iter_mut().enumerate() {
            row.rank = (idx + 1) as u32;
        }
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator")
            .field("config", self.simulator.config())
            .field(
                "policies",
                &self.policies.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
