//! Portfolio valuation samples per date and their daily/monthly/yearly
//! resampling.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Valuations collected at one date, one sample per completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPoint {
    pub date: NaiveDate,
    pub samples: Vec<f64>,
}

impl EvaluationPoint {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleMode {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl fmt::Display for ResampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleMode::Daily => write!(f, "daily"),
            ResampleMode::Monthly => write!(f, "monthly"),
            ResampleMode::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for ResampleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ResampleMode::Daily),
            "monthly" => Ok(ResampleMode::Monthly),
            "yearly" => Ok(ResampleMode::Yearly),
            other => Err(format!(
                "unknown mode '{other}', expected daily, monthly or yearly"
            )),
        }
    }
}

impl ResampleMode {
    fn same_bucket(self, a: NaiveDate, b: NaiveDate) -> bool {
        match self {
            ResampleMode::Daily => false,
            ResampleMode::Monthly => a.year() == b.year() && a.month() == b.month(),
            ResampleMode::Yearly => a.year() == b.year(),
        }
    }
}

/// Keep the first point and every point that opens a new bucket relative to
/// the last kept point. Daily keeps everything.
pub fn resample(points: &[EvaluationPoint], mode: ResampleMode) -> Vec<&EvaluationPoint> {
    let mut kept: Vec<&EvaluationPoint> = Vec::new();
    for point in points {
        let opens_bucket = kept
            .last()
            .is_none_or(|last| !mode.same_bucket(last.date, point.date));
        if opens_bucket {
            kept.push(point);
        }
    }
    kept
}

/// One row of a resampled evaluation series.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPoint {
    /// 1-based position in the resampled series.
    pub index: usize,
    pub date: NaiveDate,
    pub samples: usize,
    pub mean: f64,
}

/// The resampled, averaged evaluation series consumed by report writers.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub mode: ResampleMode,
    pub points: Vec<ReportPoint>,
}

impl EvaluationReport {
    /// Points without samples (no run has completed) are left out.
    pub fn build(points: &[EvaluationPoint], mode: ResampleMode) -> Self {
        let points = resample(points, mode)
            .into_iter()
            .filter_map(|point| point.mean().map(|mean| (point, mean)))
            .enumerate()
            .map(|(i, (point, mean))| ReportPoint {
                index: i + 1,
                date: point.date,
                samples: point.samples.len(),
                mean,
            })
            .collect();
        Self { mode, points }
    }

    pub fn x_label(&self) -> String {
        format!("Time ({})", self.mode)
    }

    pub fn y_label(&self) -> &'static str {
        "Capital"
    }

    pub fn means(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(x, mean)` pairs with x counting from 1, ready for plotting.
    pub fn chart_series(&self) -> Vec<(f64, f64)> {
        chart_series(&self.points)
    }
}

pub fn chart_series(points: &[ReportPoint]) -> Vec<(f64, f64)> {
    points.iter().map(|p| (p.index as f64, p.mean)).collect()
}
