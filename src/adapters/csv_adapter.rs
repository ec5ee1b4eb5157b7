//! CSV directory data adapter.
//!
//! Each instrument lives in `<base_path>/<INSTRUMENT>.csv` with a
//! `Date,Open,High,Low,Close,Volume` header. File names match instrument
//! codes without regard to case, and codes are reported uppercased. A
//! missing file reads as an instrument with no data.

use crate::domain::error::SimError;
use crate::domain::price::{PriceBar, parse_price};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// The instrument's file: the exact name first, then any `.csv` whose
    /// stem matches ignoring case.
    fn csv_path(&self, instrument: &str) -> Result<Option<PathBuf>, SimError> {
        let exact = self.base_path.join(format!("{}.csv", instrument));
        if exact.is_file() {
            return Ok(Some(exact));
        }
        if !self.base_path.is_dir() {
            return Ok(None);
        }

        let entries = fs::read_dir(&self.base_path).map_err(|e| SimError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let matches = name
                .to_string_lossy()
                .strip_suffix(".csv")
                .is_some_and(|stem| stem.eq_ignore_ascii_case(instrument));
            if matches {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Every bar in the instrument's file, sorted by date. Bars carry the
    /// uppercased instrument code.
    pub fn read_all(&self, instrument: &str) -> Result<Vec<PriceBar>, SimError> {
        let Some(path) = self.csv_path(instrument)? else {
            debug!("no csv file for {} in {}", instrument, self.base_path.display());
            return Ok(Vec::new());
        };
        let code = instrument.to_uppercase();
        let content = fs::read_to_string(&path).map_err(|e| SimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SimError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            bars.push(parse_row(&code, &record)?);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn column<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, SimError> {
    record.get(index).ok_or_else(|| SimError::Data {
        reason: format!("missing {} column", name),
    })
}

fn price_column(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, SimError> {
    parse_price(column(record, index, name)?).map_err(|e| SimError::Data {
        reason: format!("invalid {} value: {}", name, e),
    })
}

fn parse_row(instrument: &str, record: &csv::StringRecord) -> Result<PriceBar, SimError> {
    let date_str = column(record, 0, "date")?;
    let date = NaiveDate::parse_from_str(date_str.trim_matches('"'), "%Y-%m-%d").map_err(|e| {
        SimError::Data {
            reason: format!("invalid date format '{}': {}", date_str, e),
        }
    })?;

    // Volume sometimes arrives as a float ("1200.0").
    let volume = parse_price(column(record, 5, "volume")?).map_err(|e| SimError::Data {
        reason: format!("invalid volume value: {}", e),
    })? as i64;

    Ok(PriceBar {
        instrument: instrument.to_string(),
        date,
        open: price_column(record, 1, "open")?,
        high: price_column(record, 2, "high")?,
        low: price_column(record, 3, "low")?,
        close: price_column(record, 4, "close")?,
        volume,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SimError> {
        let mut bars = self.read_all(instrument)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, SimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SimError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                instruments.push(code.to_uppercase());
            }
        }

        instruments.sort();
        instruments.dedup();
        Ok(instruments)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SimError> {
        let bars = self.read_all(instrument)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
