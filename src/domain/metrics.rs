//! Profit metrics for a single run and summaries across repeated runs.

use chrono::NaiveDate;

use super::simulation::RunResult;

const DAYS_PER_YEAR: f64 = 365.25;

/// Total return as a percentage of the initial balance.
pub fn profit_percentage(initial_balance: f64, final_balance: f64) -> f64 {
    if initial_balance > 0.0 {
        (final_balance - initial_balance) / initial_balance * 100.0
    } else {
        0.0
    }
}

pub fn days_between(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days()
}

/// Scale a total percentage return to a one-year equivalent:
/// `profit_percentage / (days / 365.25)`. A window of zero days yields 0.
pub fn annualized_profit_percentage(
    profit_percentage: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> f64 {
    let days = days_between(start_date, end_date);
    if days <= 0 {
        return 0.0;
    }
    profit_percentage / (days as f64 / DAYS_PER_YEAR)
}

/// Largest peak-to-trough decline of a value series, as a fraction of the
/// peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in values {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub runs: usize,
    pub mean_profit: f64,
    pub mean_profit_percentage: f64,
    pub mean_annualized_profit_percentage: f64,
    pub best_profit: f64,
    pub worst_profit: f64,
}

impl RunSummary {
    pub fn compute(results: &[RunResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let n = results.len() as f64;
        let mean = |f: fn(&RunResult) -> f64| results.iter().map(f).sum::<f64>() / n;

        Some(RunSummary {
            runs: results.len(),
            mean_profit: mean(|r| r.profit),
            mean_profit_percentage: mean(|r| r.profit_percentage),
            mean_annualized_profit_percentage: mean(|r| r.annualized_profit_percentage),
            best_profit: results
                .iter()
                .map(|r| r.profit)
                .fold(f64::NEG_INFINITY, f64::max),
            worst_profit: results
                .iter()
                .map(|r| r.profit)
                .fold(f64::INFINITY, f64::min),
        })
    }
}
