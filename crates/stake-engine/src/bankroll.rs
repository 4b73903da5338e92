//! Sequential bankroll replay.
//!
//! [`BankrollSimulator`] feeds an ordered slice of wager events through one
//! sizing policy, settling each stake against the recorded outcome and
//! tracking the balance trajectory. The run is a two-state machine:
//!
//! - `RUNNING`: events are sized, settled and applied in input order
//! - `HALTED`: entered when the balance drops below the capital floor;
//!   terminal, every remaining event becomes a recorded skip
//!
//! Malformed events never abort a run. A policy that returns a
//! [`DataError`] costs that event a skip and a diagnostics entry, nothing
//! more. The simulator also protects the balance itself: a stake larger
//! than the current balance is downgraded to a skip, so no policy can push
//! the bankroll negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stake_common::{settle, DataError, Outcome, WagerEvent};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SimConfig};
use crate::sizing::{SizingDecision, SizingPolicy, SkipReason};

/// Run status. `Halted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Halted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Halted => "HALTED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state of one simulation run.
///
/// Created once per run, mutated once per event, never shared across
/// runs. The per-event-return accumulators are streaming so the
/// risk-adjusted ratio never requires a retained ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    /// Current balance.
    pub balance: Decimal,

    /// Highest balance seen so far.
    pub peak: Decimal,

    /// Current drawdown from peak, as a fraction of peak.
    pub drawdown: Decimal,

    /// Deepest drawdown seen so far.
    pub max_drawdown: Decimal,

    /// Sum of all stakes placed.
    pub total_staked: Decimal,

    /// Sum of all settlement amounts.
    pub total_profit: Decimal,

    /// Whether the run is still accepting stakes.
    pub status: RunStatus,

    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub skips: u32,

    /// Number of settled stakes contributing to the return accumulators.
    pub return_count: u32,

    /// Sum of per-event returns (profit over stake).
    pub return_sum: Decimal,

    /// Sum of squared per-event returns.
    pub return_sum_squares: Decimal,
}

impl BankrollState {
    /// Fresh state at the starting bankroll.
    pub fn new(starting_bankroll: Decimal) -> Self {
        Self {
            balance: starting_bankroll,
            peak: starting_bankroll,
            drawdown: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            total_staked: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            status: RunStatus::Running,
            wins: 0,
            losses: 0,
            pushes: 0,
            skips: 0,
            return_count: 0,
            return_sum: Decimal::ZERO,
            return_sum_squares: Decimal::ZERO,
        }
    }

    /// Apply one settled stake: move the balance, bump the outcome
    /// counter, refresh the trajectory metrics and the streaming return
    /// accumulators.
    pub fn apply_settlement(&mut self, outcome: Outcome, stake: Decimal, profit: Decimal) {
        self.balance += profit;
        self.total_staked += stake;
        self.total_profit += profit;

        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Push => self.pushes += 1,
        }

        if self.balance > self.peak {
            self.peak = self.balance;
        }
        self.drawdown = if self.peak > Decimal::ZERO {
            (self.peak - self.balance) / self.peak
        } else {
            Decimal::ZERO
        };
        if self.drawdown > self.max_drawdown {
            self.max_drawdown = self.drawdown;
        }

        // Zero stakes settle to zero profit and carry no return.
        if stake > Decimal::ZERO {
            let event_return = profit / stake;
            self.return_count += 1;
            self.return_sum += event_return;
            self.return_sum_squares += event_return * event_return;
        }
    }

    pub fn record_skip(&mut self) {
        self.skips += 1;
    }

    pub fn halt(&mut self) {
        self.status = RunStatus::Halted;
    }

    pub fn is_halted(&self) -> bool {
        self.status == RunStatus::Halted
    }

    /// Mean per-event return over the population standard deviation of
    /// per-event returns. Zero when fewer than two stakes settled or the
    /// returns show no variance.
    pub fn risk_adjusted_ratio(&self) -> Decimal {
        if self.return_count < 2 {
            return Decimal::ZERO;
        }
        let n = Decimal::from(self.return_count);
        let mean = self.return_sum / n;
        let variance = self.return_sum_squares / n - mean * mean;
        if variance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // Decimal has no square root; round-trip through f64 for it.
        let std_dev = f64_to_decimal(decimal_to_f64(variance).sqrt());
        if std_dev <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        mean / std_dev
    }
}

/// One row of the optional per-event ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub event_id: String,
    pub decision: SizingDecision,
    /// Settlement amount applied to the balance; zero for skips.
    pub settlement: Decimal,
    /// Balance after this event.
    pub balance: Decimal,
    /// Drawdown after this event.
    pub drawdown: Decimal,
}

/// Summary of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Name of the policy that produced this run.
    pub policy: String,

    pub starting_bankroll: Decimal,
    pub final_balance: Decimal,
    pub total_staked: Decimal,
    pub total_profit: Decimal,

    /// Total profit over total staked; zero when nothing was staked.
    pub roi: Decimal,

    pub max_drawdown: Decimal,

    /// Mean per-event return over its population standard deviation.
    pub risk_adjusted: Decimal,

    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub skips: u32,

    /// Wins over decided bets (wins plus losses); zero when none decided.
    pub hit_rate: Decimal,

    /// Number of events processed.
    pub events: usize,

    /// Whether the run hit the capital floor and halted.
    pub halted: bool,

    /// Per-event data errors, in input order. Never aborts the run.
    pub diagnostics: Vec<DataError>,

    /// Per-event ledger, retained only when the config asks for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<Vec<LedgerEntry>>,
}

/// Replays wager events through a sizing policy.
#[derive(Debug, Clone)]
pub struct BankrollSimulator {
    config: SimConfig,
}

impl BankrollSimulator {
    /// Build a simulator, validating the configuration first. Config
    /// failures are fatal; nothing is simulated on a bad parameter set.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run one policy over the event slice, in input order.
    pub fn run(&self, policy: &dyn SizingPolicy, events: &[WagerEvent]) -> SimulationReport {
        let mut state = BankrollState::new(self.config.starting_bankroll);
        let mut diagnostics: Vec<DataError> = Vec::new();
        let mut ledger: Option<Vec<LedgerEntry>> = self.config.retain_ledger.then(Vec::new);

        for event in events {
            // 1. A halted run skips everything that remains.
            if state.is_halted() {
                state.record_skip();
                let decision = SizingDecision::Skip {
                    reason: SkipReason::Halted,
                };
                debug!(event_id = %event.id, "halted, forced skip");
                push_entry(&mut ledger, event, decision, Decimal::ZERO, &state);
                continue;
            }

            // 2. Ask the policy. A data error is recorded and survived.
            let decision = match policy.decide(event, &state, &self.config) {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(event_id = %event.id, error = %err, "data error, skipping event");
                    diagnostics.push(err);
                    state.record_skip();
                    continue;
                }
            };

            let amount = match decision {
                SizingDecision::Skip { reason } => {
                    debug!(event_id = %event.id, reason = %reason, "policy skip");
                    state.record_skip();
                    push_entry(&mut ledger, event, decision, Decimal::ZERO, &state);
                    continue;
                }
                SizingDecision::Stake { amount } => amount,
            };

            // 3. Protective skip: no policy may push the balance negative.
            if amount > state.balance {
                warn!(
                    event_id = %event.id,
                    stake = %amount,
                    balance = %state.balance,
                    "stake exceeds balance, protective skip"
                );
                state.record_skip();
                let skip = SizingDecision::Skip {
                    reason: SkipReason::StakeExceedsBankroll,
                };
                push_entry(&mut ledger, event, skip, Decimal::ZERO, &state);
                continue;
            }

            // 4. Settle against the recorded outcome.
            let profit = match settle(event.outcome, amount, event.odds) {
                Ok(profit) => profit,
                Err(_) => {
                    let err = DataError::InvalidOdds {
                        event_id: event.id.clone(),
                    };
                    warn!(event_id = %event.id, error = %err, "data error, skipping event");
                    diagnostics.push(err);
                    state.record_skip();
                    continue;
                }
            };

            state.apply_settlement(event.outcome, amount, profit);
            debug!(
                event_id = %event.id,
                outcome = %event.outcome,
                stake = %amount,
                profit = %profit,
                balance = %state.balance,
                "settled"
            );
            push_entry(&mut ledger, event, decision, profit, &state);

            // 5. Floor check after settlement; the halt is a reported
            //    state transition, not an error.
            if state.balance < self.config.bankroll_floor {
                state.halt();
                warn!(
                    event_id = %event.id,
                    balance = %state.balance,
                    floor = %self.config.bankroll_floor,
                    "bankroll floor breached, halting run"
                );
            }
        }

        let report = self.build_report(policy.name(), state, diagnostics, ledger, events.len());
        info!(
            policy = report.policy.as_str(),
            events = report.events,
            final_balance = %report.final_balance,
            roi = %report.roi,
            max_drawdown = %report.max_drawdown,
            halted = report.halted,
            "simulation complete"
        );
        report
    }

    fn build_report(
        &self,
        policy: &str,
        state: BankrollState,
        diagnostics: Vec<DataError>,
        ledger: Option<Vec<LedgerEntry>>,
        events: usize,
    ) -> SimulationReport {
        let roi = if state.total_staked > Decimal::ZERO {
            state.total_profit / state.total_staked
        } else {
            Decimal::ZERO
        };
        let decided = state.wins + state.losses;
        let hit_rate = if decided > 0 {
            Decimal::from(state.wins) / Decimal::from(decided)
        } else {
            Decimal::ZERO
        };

        SimulationReport {
            policy: policy.to_string(),
            starting_bankroll: self.config.starting_bankroll,
            final_balance: state.balance,
            total_staked: state.total_staked,
            total_profit: state.total_profit,
            roi,
            max_drawdown: state.max_drawdown,
            risk_adjusted: state.risk_adjusted_ratio(),
            wins: state.wins,
            losses: state.losses,
            pushes: state.pushes,
            skips: state.skips,
            hit_rate,
            events,
            halted: state.is_halted(),
            diagnostics,
            ledger,
        }
    }
}

fn push_entry(
    ledger: &mut Option<Vec<LedgerEntry>>,
    event: &WagerEvent,
    decision: SizingDecision,
    settlement: Decimal,
    state: &BankrollState,
) {
    if let Some(entries) = ledger {
        entries.push(LedgerEntry {
            event_id: event.id.clone(),
            decision,
            settlement,
            balance: state.balance,
            drawdown: state.drawdown,
        });
    }
}

/// Convert Decimal to f64 for math operations.
#[inline]
fn decimal_to_f64(d: Decimal) -> f64 {
    use std::str::FromStr;
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

/// Convert f64 back to Decimal.
#[inline]
fn f64_to_decimal(f: f64) -> Decimal {
    use rust_decimal::prelude::FromPrimitive;
    Decimal::from_f64(f).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stake_common::Side;

    /// Test policy: stake a flat amount on every event.
    struct FlatStake(Decimal);

    impl SizingPolicy for FlatStake {
        fn name(&self) -> &str {
            "flat_stake"
        }

        fn decide(
            &self,
            _wager: &WagerEvent,
            _state: &BankrollState,
            _config: &SimConfig,
        ) -> Result<SizingDecision, DataError> {
            Ok(SizingDecision::Stake { amount: self.0 })
        }
    }

    fn win(id: &str, odds: i32) -> WagerEvent {
        WagerEvent::new(id, Side::Home, odds, Outcome::Win)
    }

    fn loss(id: &str, odds: i32) -> WagerEvent {
        WagerEvent::new(id, Side::Home, odds, Outcome::Loss)
    }

    // ========================================================================
    // BankrollState
    // ========================================================================

    #[test]
    fn test_state_initial_values() {
        let state = BankrollState::new(dec!(500));
        assert_eq!(state.balance, dec!(500));
        assert_eq!(state.peak, dec!(500));
        assert_eq!(state.drawdown, Decimal::ZERO);
        assert_eq!(state.max_drawdown, Decimal::ZERO);
        assert_eq!(state.status, RunStatus::Running);
        assert_eq!(state.wins + state.losses + state.pushes + state.skips, 0);
    }

    #[test]
    fn test_settlement_updates_peak_and_drawdown() {
        let mut state = BankrollState::new(dec!(100));

        state.apply_settlement(Outcome::Win, dec!(10), dec!(20));
        assert_eq!(state.balance, dec!(120));
        assert_eq!(state.peak, dec!(120));
        assert_eq!(state.drawdown, Decimal::ZERO);
        assert_eq!(state.wins, 1);

        state.apply_settlement(Outcome::Loss, dec!(30), dec!(-30));
        assert_eq!(state.balance, dec!(90));
        assert_eq!(state.peak, dec!(120));
        assert_eq!(state.drawdown, dec!(0.25)); // (120 - 90) / 120
        assert_eq!(state.max_drawdown, dec!(0.25));
        assert_eq!(state.losses, 1);

        // Recovery shrinks drawdown but not max drawdown.
        state.apply_settlement(Outcome::Win, dec!(10), dec!(18));
        assert_eq!(state.balance, dec!(108));
        assert_eq!(state.drawdown, dec!(0.1)); // (120 - 108) / 120
        assert_eq!(state.max_drawdown, dec!(0.25));
    }

    #[test]
    fn test_zero_stake_settles_without_return() {
        let mut state = BankrollState::new(dec!(100));
        state.apply_settlement(Outcome::Win, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(state.wins, 1);
        assert_eq!(state.return_count, 0);
        assert_eq!(state.balance, dec!(100));
    }

    #[test]
    fn test_risk_adjusted_needs_two_settlements() {
        let mut state = BankrollState::new(dec!(100));
        assert_eq!(state.risk_adjusted_ratio(), Decimal::ZERO);

        state.apply_settlement(Outcome::Win, dec!(1), dec!(1));
        assert_eq!(state.risk_adjusted_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_risk_adjusted_zero_variance() {
        let mut state = BankrollState::new(dec!(100));
        // Two identical returns: variance 0.
        state.apply_settlement(Outcome::Win, dec!(1), dec!(1));
        state.apply_settlement(Outcome::Win, dec!(1), dec!(1));
        assert_eq!(state.risk_adjusted_ratio(), Decimal::ZERO);
    }

    #[test]
    fn test_risk_adjusted_known_values() {
        let mut state = BankrollState::new(dec!(100));
        // Returns 0.5 and 1.5: mean 1, population variance 0.25,
        // std dev 0.5, ratio 2.
        state.apply_settlement(Outcome::Win, dec!(10), dec!(5));
        state.apply_settlement(Outcome::Win, dec!(10), dec!(15));
        assert_eq!(state.risk_adjusted_ratio(), dec!(2));
    }

    // ========================================================================
    // Simulator runs
    // ========================================================================

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig {
            starting_bankroll: dec!(-5),
            ..SimConfig::default()
        };
        assert!(BankrollSimulator::new(config).is_err());
    }

    #[test]
    fn test_empty_run() {
        let sim = BankrollSimulator::new(SimConfig::default()).unwrap();
        let report = sim.run(&FlatStake(dec!(1)), &[]);

        assert_eq!(report.final_balance, dec!(500));
        assert_eq!(report.roi, Decimal::ZERO);
        assert_eq!(report.events, 0);
        assert!(!report.halted);
        assert!(report.diagnostics.is_empty());
        assert!(report.ledger.is_none());
    }

    #[test]
    fn test_data_error_skips_and_continues() {
        let sim = BankrollSimulator::new(SimConfig::default()).unwrap();
        // Zero odds in the middle of the run.
        let events = vec![win("ok1", -110), win("bad", 0), win("ok2", -110)];
        let report = sim.run(&FlatStake(dec!(10)), &events);

        assert_eq!(report.wins, 2);
        assert_eq!(report.skips, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].event_id(), "bad");
        assert!(!report.halted);
    }

    #[test]
    fn test_protective_skip_keeps_balance_non_negative() {
        let config = SimConfig {
            starting_bankroll: dec!(50),
            bankroll_floor: dec!(1),
            retain_ledger: true,
            ..SimConfig::default()
        };
        let sim = BankrollSimulator::new(config).unwrap();
        // Stake 80 > balance 50: the simulator must refuse it.
        let report = sim.run(&FlatStake(dec!(80)), &[loss("big", -110)]);

        assert_eq!(report.final_balance, dec!(50));
        assert_eq!(report.skips, 1);
        assert_eq!(report.losses, 0);

        let ledger = report.ledger.unwrap();
        assert_eq!(
            ledger[0].decision,
            SizingDecision::Skip {
                reason: SkipReason::StakeExceedsBankroll
            }
        );
    }

    #[test]
    fn test_floor_halt_then_forced_skips() {
        let config = SimConfig {
            starting_bankroll: dec!(500),
            bankroll_floor: dec!(490),
            retain_ledger: true,
            ..SimConfig::default()
        };
        let sim = BankrollSimulator::new(config).unwrap();
        // First loss drops 480 < 490: halt. Remaining events forced skips.
        let events = vec![loss("l1", -110), win("w1", -110), win("w2", -110)];
        let report = sim.run(&FlatStake(dec!(20)), &events);

        assert!(report.halted);
        assert_eq!(report.final_balance, dec!(480));
        assert_eq!(report.losses, 1);
        assert_eq!(report.wins, 0);
        assert_eq!(report.skips, 2);

        let ledger = report.ledger.unwrap();
        assert_eq!(ledger.len(), 3);
        for entry in &ledger[1..] {
            assert_eq!(
                entry.decision,
                SizingDecision::Skip {
                    reason: SkipReason::Halted
                }
            );
            // Balance frozen at the halt value.
            assert_eq!(entry.balance, dec!(480));
        }
    }

    #[test]
    fn test_roi_and_hit_rate() {
        let config = SimConfig {
            bankroll_floor: dec!(1),
            ..SimConfig::default()
        };
        let sim = BankrollSimulator::new(config).unwrap();
        // +100 odds, stake 10: win +10, loss -10, push 0.
        let events = vec![
            win("w", 100),
            loss("l", 100),
            WagerEvent::new("p", Side::Home, 100, Outcome::Push),
            win("w2", 100),
        ];
        let report = sim.run(&FlatStake(dec!(10)), &events);

        assert_eq!(report.total_staked, dec!(40));
        assert_eq!(report.total_profit, dec!(10));
        assert_eq!(report.roi, dec!(0.25));
        assert_eq!(report.wins, 2);
        assert_eq!(report.losses, 1);
        assert_eq!(report.pushes, 1);
        // Pushes are excluded from the hit rate.
        assert_eq!(report.hit_rate, Decimal::from(2) / Decimal::from(3));
    }

    #[test]
    fn test_ledger_disabled_by_default() {
        let sim = BankrollSimulator::new(SimConfig::default()).unwrap();
        let report = sim.run(&FlatStake(dec!(1)), &[win("w", 100)]);
        assert!(report.ledger.is_none());
    }

    #[test]
    fn test_ledger_entries_track_balances() {
        let config = SimConfig {
            bankroll_floor: dec!(1),
            retain_ledger: true,
            ..SimConfig::default()
        };
        let sim = BankrollSimulator::new(config).unwrap();
        let events = vec![win("w", 100), loss("l", 100)];
        let report = sim.run(&FlatStake(dec!(10)), &events);

        let ledger = report.ledger.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].event_id, "w");
        assert_eq!(ledger[0].settlement, dec!(10));
        assert_eq!(ledger[0].balance, dec!(510));
        assert_eq!(ledger[1].settlement, dec!(-10));
        assert_eq!(ledger[1].balance, dec!(500));
        // Drawdown after falling back from the 510 peak.
        assert_eq!(ledger[1].drawdown, dec!(10) / dec!(510));
    }

    #[test]
    fn test_report_serde_round_trip() {
        let config = SimConfig {
            retain_ledger: true,
            ..SimConfig::default()
        };
        let sim = BankrollSimulator::new(config).unwrap();
        let events = vec![win("w", 100), win("bad", 0)];
        let report = sim.run(&FlatStake(dec!(10)), &events);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"policy\""));
        assert!(json.contains("invalid_odds"));

        let back: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
