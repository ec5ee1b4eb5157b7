//! Instrument universe parsing and data coverage checks.

use chrono::NaiveDate;

use crate::domain::error::SimError;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty instrument list")]
    Empty,

    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

/// Split a comma-separated instrument list, trimming and upper-casing each
/// entry.
pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut instruments: Vec<String> = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let instrument = trimmed.to_uppercase();
        if instruments.contains(&instrument) {
            return Err(UniverseError::DuplicateInstrument(instrument));
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}

/// Stored data range of one instrument, as reported by the data port.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub instrument: String,
    pub range: Option<(NaiveDate, NaiveDate, usize)>,
}

impl Coverage {
    /// True when stored data overlaps the requested window.
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        match self.range {
            Some((first, last, count)) => count > 0 && first <= end_date && last >= start_date,
            None => false,
        }
    }
}

pub fn check_coverage(
    data_port: &dyn DataPort,
    instruments: &[String],
) -> Result<Vec<Coverage>, SimError> {
    instruments
        .iter()
        .map(|instrument| {
            Ok(Coverage {
                instrument: instrument.clone(),
                range: data_port.get_data_range(instrument)?,
            })
        })
        .collect()
}
