//! Executed order records.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "Bought"),
            TradeAction::Sell => write!(f, "Sold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeLogEntry {
    pub action: TradeAction,
    pub date: NaiveDate,
    pub instrument: String,
    pub price: f64,
    pub amount: u64,
}

/// `"\t{action} {amount} stocks of {instrument} with price {price} at {date}\n"`
impl fmt::Display for TradeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\t{} {} stocks of {} with price {} at {}",
            self.action,
            self.amount,
            self.instrument,
            price_repr(self.price),
            self.date
        )
    }
}

/// Shortest round-trip rendering of a price, always with a fractional part
/// or an exponent. Exponents carry a sign and at least two digits
/// (`1e+16`, `1.5e-05`).
pub fn price_repr(price: f64) -> String {
    let debug = format!("{:?}", price);
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        Err(_) => debug,
    }
}

/// Concatenate the rendered lines of a trade log.
pub fn format_logs(logs: &[TradeLogEntry]) -> String {
    logs.iter().map(ToString::to_string).collect()
}
