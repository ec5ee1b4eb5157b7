//! Daily price bars and the merged per-date price records the simulation
//! replays.

use chrono::NaiveDate;
use log::warn;
use std::collections::BTreeMap;

use crate::domain::error::SimError;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub instrument: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// All instruments' bars for a single trading date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub bars: BTreeMap<String, PriceBar>,
}

impl PriceRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bars: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, bar: PriceBar) {
        self.bars.insert(bar.instrument.clone(), bar);
    }

    pub fn close(&self, instrument: &str) -> Option<f64> {
        self.bars.get(instrument).map(|bar| bar.close)
    }

    pub fn has_all(&self, instruments: &[String]) -> bool {
        instruments.iter().all(|i| self.bars.contains_key(i))
    }
}

/// Merge per-instrument bar series into date-ordered records.
///
/// Only dates on which every instrument has a bar are kept, so every record
/// can price the whole universe. A second bar for the same instrument and
/// date is `MalformedData`.
pub fn merge_bars(
    instruments: &[String],
    series: Vec<Vec<PriceBar>>,
) -> Result<Vec<PriceRecord>, SimError> {
    let mut by_date: BTreeMap<NaiveDate, PriceRecord> = BTreeMap::new();
    for bars in series {
        for bar in bars {
            let date = bar.date;
            let record = by_date
                .entry(date)
                .or_insert_with(|| PriceRecord::new(date));
            if record.bars.contains_key(&bar.instrument) {
                return Err(SimError::MalformedData {
                    reason: format!("duplicate bar for {} on {}", bar.instrument, date),
                });
            }
            record.insert(bar);
        }
    }

    let total = by_date.len();
    let records: Vec<PriceRecord> = by_date
        .into_values()
        .filter(|record| record.has_all(instruments))
        .collect();

    if records.len() < total {
        warn!(
            "dropped {} of {} dates missing a bar for at least one instrument",
            total - records.len(),
            total
        );
    }
    Ok(records)
}

/// Fetch every instrument's bars from the data port and merge them.
///
/// Fails with `DataUnavailable` when the port has nothing in the window and
/// with `NoTradingDays` when no single date prices the whole universe.
pub fn load_price_records(
    data_port: &dyn DataPort,
    instruments: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<PriceRecord>, SimError> {
    let mut series = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let bars = data_port.fetch_ohlcv(instrument, start_date, end_date)?;
        series.push(bars);
    }

    if series.iter().all(Vec::is_empty) {
        return Err(SimError::DataUnavailable {
            instruments: instruments.join(", "),
            start_date,
            end_date,
        });
    }

    let records = merge_bars(instruments, series)?;
    if records.is_empty() {
        return Err(SimError::NoTradingDays {
            start_date,
            end_date,
        });
    }
    Ok(records)
}

/// Check that records are non-empty, strictly ascending, inside the
/// requested window, and price every instrument.
pub fn validate_records(
    records: &[PriceRecord],
    instruments: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), SimError> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(SimError::DataUnavailable {
            instruments: instruments.join(", "),
            start_date,
            end_date,
        });
    };

    if let Some(pair) = records.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(SimError::MalformedData {
            reason: format!(
                "dates out of order: {} follows {}",
                pair[1].date, pair[0].date
            ),
        });
    }

    if first.date < start_date || last.date > end_date {
        return Err(SimError::MalformedData {
            reason: format!(
                "records span {} to {}, outside {} to {}",
                first.date, last.date, start_date, end_date
            ),
        });
    }

    for record in records {
        for instrument in instruments {
            match record.close(instrument) {
                Some(close) if close.is_finite() && close > 0.0 => {}
                Some(close) => {
                    return Err(SimError::MalformedData {
                        reason: format!(
                            "close for {} on {} is {}",
                            instrument, record.date, close
                        ),
                    });
                }
                None => {
                    return Err(SimError::MalformedData {
                        reason: format!("no close for {} on {}", instrument, record.date),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Parse a close/open/high/low field that may arrive as a padded string.
pub fn parse_price(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    raw.trim().trim_matches('"').trim().parse::<f64>()
}
