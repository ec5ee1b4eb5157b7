//! Cash and share bookkeeping for a single run.
//!
//! Orders fill completely or not at all. A rejected order leaves the ledger
//! untouched and is reported only through the `false` return value.

use log::debug;
use std::collections::BTreeMap;

use super::price::PriceRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    cash: f64,
    initial_balance: f64,
    positions: BTreeMap<String, u64>,
}

impl Ledger {
    pub fn new(initial_balance: f64, instruments: &[String]) -> Self {
        Ledger {
            cash: initial_balance,
            initial_balance,
            positions: instruments.iter().map(|i| (i.clone(), 0)).collect(),
        }
    }

    /// Spend `price * amount` on `amount` shares.
    ///
    /// Rejected when the cost exceeds cash, the amount is zero, the price is
    /// not a positive finite number, or the instrument is outside the universe.
    pub fn buy(&mut self, instrument: &str, price: f64, amount: u64) -> bool {
        if !Self::valid_order(price, amount) {
            debug!("rejected buy of {amount} {instrument} at {price}: invalid order");
            return false;
        }
        let cost = price * amount as f64;
        if cost > self.cash {
            debug!(
                "rejected buy of {amount} {instrument} at {price}: cost {cost} exceeds cash {}",
                self.cash
            );
            return false;
        }
        let Some(held) = self.positions.get_mut(instrument) else {
            debug!("rejected buy of {instrument}: not in universe");
            return false;
        };
        *held += amount;
        self.cash -= cost;
        true
    }

    /// Sell `amount` held shares for `price * amount`.
    ///
    /// Rejected when fewer than `amount` shares are held, or under the same
    /// amount/price/universe conditions as [`Ledger::buy`].
    pub fn sell(&mut self, instrument: &str, price: f64, amount: u64) -> bool {
        if !Self::valid_order(price, amount) {
            debug!("rejected sell of {amount} {instrument} at {price}: invalid order");
            return false;
        }
        let Some(held) = self.positions.get_mut(instrument) else {
            debug!("rejected sell of {instrument}: not in universe");
            return false;
        };
        if *held < amount {
            debug!("rejected sell of {amount} {instrument}: only {held} held");
            return false;
        }
        *held -= amount;
        self.cash += price * amount as f64;
        true
    }

    fn valid_order(price: f64, amount: u64) -> bool {
        amount > 0 && price.is_finite() && price > 0.0
    }

    pub fn balance(&self) -> f64 {
        self.cash
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn positions(&self) -> &BTreeMap<String, u64> {
        &self.positions
    }

    pub fn shares(&self, instrument: &str) -> u64 {
        self.positions.get(instrument).copied().unwrap_or(0)
    }

    /// Instruments with a non-zero holding, sorted by instrument.
    pub fn open_positions(&self) -> Vec<(String, u64)> {
        self.positions
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(instrument, &amount)| (instrument.clone(), amount))
            .collect()
    }

    /// Cash plus every holding marked at the record's close.
    pub fn total_value(&self, record: &PriceRecord) -> f64 {
        let holdings: f64 = self
            .positions
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .filter_map(|(instrument, &amount)| {
                record.close(instrument).map(|close| close * amount as f64)
            })
            .sum();
        self.cash + holdings
    }

    pub fn reset(&mut self) {
        self.cash = self.initial_balance;
        for amount in self.positions.values_mut() {
            *amount = 0;
        }
    }
}
