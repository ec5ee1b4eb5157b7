//! Simulation engine: replays loaded price records through a strategy,
//! settles its orders on a [`Ledger`], and records valuations and results
//! for one or more repeated runs.
//!
//! Per run the cursor starts on the first loaded date. Before the first step
//! the opening valuation is recorded for that date. Each step then invokes
//! the strategy at the cursor date, advances the cursor, and records the
//! portfolio value at the newly entered date. The final loaded date is never
//! offered to the strategy; once the cursor reaches it every open position is
//! sold at that date's close and a [`RunResult`] is stored.

use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::mem;

use super::error::SimError;
use super::evaluation::{resample, EvaluationPoint, EvaluationReport, ResampleMode};
use super::ledger::Ledger;
use super::metrics::{self, RunSummary};
use super::price::{load_price_records, validate_records, PriceRecord};
use super::strategy::Strategy;
use super::trade_log::{format_logs, TradeAction, TradeLogEntry};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub id: i64,
    pub initial_balance: f64,
    pub instruments: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), SimError> {
        if self.end_date < self.start_date {
            return Err(SimError::InvalidDateRange {
                start_date: self.start_date,
                end_date: self.end_date,
            });
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(SimError::InvalidBalance(self.initial_balance));
        }
        Ok(())
    }
}

/// Run lifecycle: `Idle → Running → Liquidating → Recorded → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Liquidating,
    Recorded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub profit: f64,
    pub profit_percentage: f64,
    pub annualized_profit_percentage: f64,
    pub final_balance: f64,
    pub logs: Vec<TradeLogEntry>,
}

/// State owned by the run in progress; reset between repetitions.
#[derive(Debug, Clone)]
struct RunState {
    ledger: Ledger,
    cursor: usize,
    logs: Vec<TradeLogEntry>,
}

impl RunState {
    fn new(initial_balance: f64, instruments: &[String]) -> Self {
        Self {
            ledger: Ledger::new(initial_balance, instruments),
            cursor: 0,
            logs: Vec::new(),
        }
    }

    fn order(
        &mut self,
        records: &[PriceRecord],
        action: TradeAction,
        instrument: &str,
        amount: u64,
    ) -> bool {
        let record = &records[self.cursor];
        let Some(price) = record.close(instrument) else {
            debug!("rejected {action:?} of {instrument}: no price on {}", record.date);
            return false;
        };

        let filled = match action {
            TradeAction::Buy => self.ledger.buy(instrument, price, amount),
            TradeAction::Sell => self.ledger.sell(instrument, price, amount),
        };
        if filled {
            debug!("{} {amount} {instrument} at {price} on {}", action, record.date);
            self.logs.push(TradeLogEntry {
                action,
                date: record.date,
                instrument: instrument.to_string(),
                price,
                amount,
            });
        }
        filled
    }

    fn sell_all(&mut self, records: &[PriceRecord]) {
        for (instrument, amount) in self.ledger.open_positions() {
            self.order(records, TradeAction::Sell, &instrument, amount);
        }
    }

    fn reset(&mut self) {
        self.ledger.reset();
        self.cursor = 0;
        self.logs.clear();
    }
}

/// What a strategy sees and may act on during one simulated date.
///
/// Prices are the closes of the cursor date, the same date that stamps any
/// order placed through this context.
pub struct StepContext<'a> {
    records: &'a [PriceRecord],
    run: &'a mut RunState,
}

impl StepContext<'_> {
    pub fn buy(&mut self, instrument: &str, amount: u64) -> bool {
        self.run.order(self.records, TradeAction::Buy, instrument, amount)
    }

    pub fn sell(&mut self, instrument: &str, amount: u64) -> bool {
        self.run.order(self.records, TradeAction::Sell, instrument, amount)
    }

    pub fn sell_all(&mut self) {
        self.run.sell_all(self.records);
    }

    pub fn current_price(&self, instrument: &str) -> Option<f64> {
        self.current_record().close(instrument)
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_record().date
    }

    pub fn current_record(&self) -> &PriceRecord {
        &self.records[self.run.cursor]
    }

    pub fn iteration(&self) -> usize {
        self.run.cursor
    }

    /// Records up to and including the cursor date.
    pub fn history(&self) -> &[PriceRecord] {
        &self.records[..=self.run.cursor]
    }

    pub fn balance(&self) -> f64 {
        self.run.ledger.balance()
    }

    pub fn shares(&self, instrument: &str) -> u64 {
        self.run.ledger.shares(instrument)
    }

    pub fn positions(&self) -> &BTreeMap<String, u64> {
        self.run.ledger.positions()
    }

    pub fn total_value(&self) -> f64 {
        self.run.ledger.total_value(self.current_record())
    }
}

pub struct Simulation {
    config: SimulationConfig,
    records: Vec<PriceRecord>,
    strategy: Box<dyn Strategy>,
    run: RunState,
    phase: RunPhase,
    evaluations: Vec<EvaluationPoint>,
    results: Vec<RunResult>,
}

impl Simulation {
    /// Load prices for the configured window from `data_port` and build the
    /// strategy for the instrument universe.
    pub fn new<F>(
        config: SimulationConfig,
        data_port: &dyn DataPort,
        strategy_factory: F,
    ) -> Result<Self, SimError>
    where
        F: FnOnce(&[String]) -> Box<dyn Strategy>,
    {
        config.validate()?;
        let records = load_price_records(
            data_port,
            &config.instruments,
            config.start_date,
            config.end_date,
        )?;
        Self::with_records(config, records, strategy_factory)
    }

    /// Build from already loaded records.
    pub fn with_records<F>(
        config: SimulationConfig,
        records: Vec<PriceRecord>,
        strategy_factory: F,
    ) -> Result<Self, SimError>
    where
        F: FnOnce(&[String]) -> Box<dyn Strategy>,
    {
        config.validate()?;
        validate_records(
            &records,
            &config.instruments,
            config.start_date,
            config.end_date,
        )?;

        let first = records[0].date;
        let last = records[records.len() - 1].date;
        if first != config.start_date {
            warn!(
                "simulation {}: requested start {} but first trading day is {}",
                config.id, config.start_date, first
            );
        }
        if last != config.end_date {
            warn!(
                "simulation {}: requested end {} but last trading day is {}",
                config.id, config.end_date, last
            );
        }

        let strategy = strategy_factory(&config.instruments);
        let evaluations = records
            .iter()
            .map(|r| EvaluationPoint::new(r.date))
            .collect();
        let run = RunState::new(config.initial_balance, &config.instruments);

        Ok(Self {
            config,
            records,
            strategy,
            run,
            phase: RunPhase::Idle,
            evaluations,
            results: Vec::new(),
        })
    }

    /// Preprocess once, then perform `runs` sequential runs.
    pub fn execute(&mut self, runs: usize) {
        self.strategy.preprocess_data(&self.records);
        for _ in 0..runs {
            self.run_once();
        }
    }

    fn run_once(&mut self) {
        info!(
            "simulation {}: run {} with {} over {} trading days",
            self.config.id,
            self.results.len() + 1,
            self.strategy.name(),
            self.records.len()
        );
        self.phase = RunPhase::Running;

        let opening = self.run.ledger.total_value(&self.records[0]);
        self.evaluations[0].push(opening);

        let last = self.records.len() - 1;
        while self.run.cursor < last {
            let mut ctx = StepContext {
                records: &self.records,
                run: &mut self.run,
            };
            self.strategy.execute(&mut ctx);

            self.run.cursor += 1;
            let cursor = self.run.cursor;
            let value = self.run.ledger.total_value(&self.records[cursor]);
            self.evaluations[cursor].push(value);
        }

        self.phase = RunPhase::Liquidating;
        self.sell_all();
        self.store_result();
        self.reset();
    }

    /// Sell every open position of the current run at the cursor date's close.
    pub fn sell_all(&mut self) {
        self.run.sell_all(&self.records);
    }

    fn store_result(&mut self) {
        let final_balance = self.run.ledger.balance();
        let initial = self.config.initial_balance;
        let profit_percentage = metrics::profit_percentage(initial, final_balance);
        let result = RunResult {
            profit: final_balance - initial,
            profit_percentage,
            annualized_profit_percentage: metrics::annualized_profit_percentage(
                profit_percentage,
                self.config.start_date,
                self.config.end_date,
            ),
            final_balance,
            logs: mem::take(&mut self.run.logs),
        };
        info!(
            "simulation {}: run {} finished with profit {:.2} ({:.2}%), {} trades",
            self.config.id,
            self.results.len() + 1,
            result.profit,
            result.profit_percentage,
            result.logs.len()
        );
        self.results.push(result);
        self.phase = RunPhase::Recorded;
    }

    fn reset(&mut self) {
        self.run.reset();
        self.phase = RunPhase::Idle;
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn result(&self, run: usize) -> Option<&RunResult> {
        self.results.get(run)
    }

    /// Human-readable trade log of a completed run; `None` before any run
    /// has completed or for an out-of-range run.
    pub fn logs_str(&self, run: usize) -> Option<String> {
        self.results.get(run).map(|r| format_logs(&r.logs))
    }

    pub fn summary(&self) -> Option<RunSummary> {
        RunSummary::compute(&self.results)
    }

    pub fn evaluation_points(&self) -> &[EvaluationPoint] {
        &self.evaluations
    }

    pub fn evaluations(&self, mode: ResampleMode) -> Vec<&EvaluationPoint> {
        resample(&self.evaluations, mode)
    }

    pub fn report(&self, mode: ResampleMode) -> EvaluationReport {
        EvaluationReport::build(&self.evaluations, mode)
    }

    pub fn id(&self) -> i64 {
        self.config.id
    }

    pub fn initial_balance(&self) -> f64 {
        self.config.initial_balance
    }

    pub fn instruments(&self) -> &[String] {
        &self.config.instruments
    }

    pub fn start_date(&self) -> NaiveDate {
        self.config.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.config.end_date
    }

    pub fn actual_start_date(&self) -> NaiveDate {
        self.records[0].date
    }

    /// Last loaded trading day; may precede the requested end date.
    pub fn actual_end_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].date
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.run.ledger
    }

    pub fn iteration(&self) -> usize {
        self.run.cursor
    }

    pub fn current_date(&self) -> NaiveDate {
        self.records[self.run.cursor].date
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }
}
