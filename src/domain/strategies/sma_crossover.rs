//! Simple moving average crossover.
//!
//! Buys a fixed number of shares when the fast average crosses above the slow
//! one and sells the whole holding when it crosses back below.

use std::collections::BTreeMap;

use super::StrategyParams;
use crate::domain::price::PriceRecord;
use crate::domain::simulation::StepContext;
use crate::domain::strategy::Strategy;

/// O(n) sliding-window SMA aligned to `values`; the first `period - 1`
/// entries are `None`.
pub fn simple_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window_sum = 0.0;
    for (i, &value) in values.iter().enumerate() {
        window_sum += value;
        if i >= period {
            window_sum -= values[i - period];
        }
        out.push((i + 1 >= period).then(|| window_sum / period as f64));
    }
    out
}

#[derive(Debug, Clone, Default)]
struct Averages {
    fast: Vec<Option<f64>>,
    slow: Vec<Option<f64>>,
}

impl Averages {
    fn spread(&self, i: usize) -> Option<f64> {
        Some(self.fast.get(i).copied()?? - self.slow.get(i).copied()??)
    }
}

pub struct SmaCrossoverStrategy {
    instruments: Vec<String>,
    fast: usize,
    slow: usize,
    amount: u64,
    averages: BTreeMap<String, Averages>,
}

impl SmaCrossoverStrategy {
    pub fn new(instruments: &[String], params: &StrategyParams) -> Self {
        Self {
            instruments: instruments.to_vec(),
            fast: params.fast,
            slow: params.slow,
            amount: params.amount,
            averages: BTreeMap::new(),
        }
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn preprocess_data(&mut self, records: &[PriceRecord]) {
        self.averages = self
            .instruments
            .iter()
            .map(|instrument| {
                let closes: Vec<f64> = records
                    .iter()
                    .map(|r| r.close(instrument).unwrap_or(f64::NAN))
                    .collect();
                let averages = Averages {
                    fast: simple_moving_average(&closes, self.fast),
                    slow: simple_moving_average(&closes, self.slow),
                };
                (instrument.clone(), averages)
            })
            .collect();
    }

    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        let i = ctx.iteration();
        if i == 0 {
            return;
        }

        for (instrument, averages) in &self.averages {
            let (Some(prev), Some(curr)) = (averages.spread(i - 1), averages.spread(i)) else {
                continue;
            };
            if prev <= 0.0 && curr > 0.0 {
                ctx.buy(instrument, self.amount);
            } else if prev >= 0.0 && curr < 0.0 {
                let held = ctx.shares(instrument);
                if held > 0 {
                    ctx.sell(instrument, held);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup_and_values() {
        let sma = simple_moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let sma = simple_moving_average(&[7.0, 8.0], 1);
        assert_eq!(sma, vec![Some(7.0), Some(8.0)]);
    }

    #[test]
    fn sma_period_longer_than_series() {
        assert_eq!(simple_moving_average(&[1.0, 2.0], 5), vec![None, None]);
    }

    #[test]
    fn sma_zero_period() {
        assert_eq!(simple_moving_average(&[1.0], 0), vec![None]);
    }

    #[test]
    fn spread_requires_both_averages() {
        let averages = Averages {
            fast: vec![Some(2.0), Some(3.0)],
            slow: vec![None, Some(2.5)],
        };
        assert_eq!(averages.spread(0), None);
        assert_eq!(averages.spread(1), Some(0.5));
        assert_eq!(averages.spread(2), None);
    }
}
