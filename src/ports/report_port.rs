//! Evaluation report output port.

use crate::domain::error::SimError;
use crate::domain::evaluation::EvaluationReport;
use std::path::Path;

/// Writes a resampled evaluation series to some presentation format.
pub trait ReportPort {
    fn render(&self, report: &EvaluationReport) -> Result<String, SimError>;

    fn write(&self, report: &EvaluationReport, output_path: &Path) -> Result<(), SimError> {
        let content = self.render(report)?;
        std::fs::write(output_path, content)?;
        Ok(())
    }
}
