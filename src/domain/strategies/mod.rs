//! Built-in strategies and the name-based factory used by the CLI.

pub mod buy_and_hold;
pub mod hold;
pub mod sma_crossover;

pub use buy_and_hold::BuyAndHoldStrategy;
pub use hold::HoldStrategy;
pub use sma_crossover::SmaCrossoverStrategy;

use crate::domain::error::SimError;
use crate::domain::strategy::Strategy;

/// Tunables read from the `[strategy]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub fast: usize,
    pub slow: usize,
    pub amount: u64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            fast: 10,
            slow: 30,
            amount: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Hold,
    BuyAndHold,
    SmaCrossover,
}

impl StrategyKind {
    pub const NAMES: [&'static str; 3] = ["hold", "buy_and_hold", "sma_crossover"];

    pub fn from_name(name: &str) -> Result<Self, SimError> {
        match name.trim().to_lowercase().as_str() {
            "hold" => Ok(StrategyKind::Hold),
            "buy_and_hold" => Ok(StrategyKind::BuyAndHold),
            "sma_crossover" => Ok(StrategyKind::SmaCrossover),
            _ => Err(SimError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }

    pub fn build(self, instruments: &[String], params: &StrategyParams) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Hold => Box::new(HoldStrategy),
            StrategyKind::BuyAndHold => Box::new(BuyAndHoldStrategy::new(instruments)),
            StrategyKind::SmaCrossover => Box::new(SmaCrossoverStrategy::new(instruments, params)),
        }
    }
}

pub fn create_strategy(
    name: &str,
    instruments: &[String],
    params: &StrategyParams,
) -> Result<Box<dyn Strategy>, SimError> {
    Ok(StrategyKind::from_name(name)?.build(instruments, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        vec!["AAPL".to_string()]
    }

    #[test]
    fn every_listed_name_builds() {
        for name in StrategyKind::NAMES {
            let strategy = create_strategy(name, &universe(), &StrategyParams::default()).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(
            StrategyKind::from_name("Buy_And_Hold").unwrap(),
            StrategyKind::BuyAndHold
        );
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = create_strategy("martingale", &universe(), &StrategyParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, SimError::UnknownStrategy { name } if name == "martingale"));
    }
}
