//! Evaluation series as a CSV table.

use crate::domain::error::SimError;
use crate::domain::evaluation::EvaluationReport;
use crate::ports::report_port::ReportPort;

/// Writes `index,date,samples,mean` rows, one per resampled point.
pub struct CsvReportAdapter;

fn write_error(e: impl std::fmt::Display) -> SimError {
    SimError::Io(std::io::Error::other(e.to_string()))
}

impl ReportPort for CsvReportAdapter {
    fn render(&self, report: &EvaluationReport) -> Result<String, SimError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["index", "date", "samples", "mean"])
            .map_err(write_error)?;

        for point in &report.points {
            wtr.write_record([
                point.index.to_string(),
                point.date.format("%Y-%m-%d").to_string(),
                point.samples.to_string(),
                format!("{:.2}", point.mean),
            ])
            .map_err(write_error)?;
        }

        let bytes = wtr.into_inner().map_err(write_error)?;
        String::from_utf8(bytes).map_err(write_error)
    }
}
