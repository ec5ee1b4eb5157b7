#![allow(dead_code)]

use chrono::NaiveDate;
use stocksim::domain::error::SimError;
pub use stocksim::domain::price::PriceBar;
use stocksim::domain::simulation::SimulationConfig;
use stocksim::domain::strategy::Strategy;
use stocksim::ports::data_port::DataPort;
use std::collections::BTreeMap;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: BTreeMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors
            .insert(instrument.to_string(), reason.to_string());
        self
    }

    fn check(&self, instrument: &str) -> Result<(), SimError> {
        match self.errors.get(instrument) {
            Some(reason) => Err(SimError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SimError> {
        self.check(instrument)?;
        Ok(self
            .data
            .get(instrument)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<String>, SimError> {
        Ok(self.data.keys().cloned().collect())
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SimError> {
        self.check(instrument)?;
        match self.data.get(instrument) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn make_bar(instrument: &str, date: &str, close: f64) -> PriceBar {
    PriceBar {
        instrument: instrument.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// Consecutive calendar-day bars for `instrument`, one per entry of `closes`.
pub fn bars_from_closes(instrument: &str, start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| PriceBar {
            instrument: instrument.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: *close,
            high: close + 1.0,
            low: close - 1.0,
            close: *close,
            volume: 1000,
        })
        .collect()
}

pub fn generate_bars(
    instrument: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(instrument, start_date, &closes)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_config(instruments: &[&str], start: NaiveDate, end: NaiveDate) -> SimulationConfig {
    SimulationConfig {
        id: 1,
        initial_balance: 1000.0,
        instruments: instruments.iter().map(|s| s.to_string()).collect(),
        start_date: start,
        end_date: end,
    }
}

/// Strategy factory that ignores the universe and returns `strategy`.
pub fn boxed<S: Strategy + 'static>(strategy: S) -> impl FnOnce(&[String]) -> Box<dyn Strategy> {
    move |_: &[String]| Box::new(strategy) as Box<dyn Strategy>
}
