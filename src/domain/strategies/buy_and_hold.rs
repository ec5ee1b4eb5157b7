use crate::domain::simulation::StepContext;
use crate::domain::strategy::Strategy;

/// Spends an equal share of cash on every instrument on the first step of
/// each run and holds until liquidation.
pub struct BuyAndHoldStrategy {
    instruments: Vec<String>,
}

impl BuyAndHoldStrategy {
    pub fn new(instruments: &[String]) -> Self {
        Self {
            instruments: instruments.to_vec(),
        }
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn execute(&mut self, ctx: &mut StepContext<'_>) {
        if ctx.iteration() != 0 || self.instruments.is_empty() {
            return;
        }

        let budget = ctx.balance() / self.instruments.len() as f64;
        for instrument in &self.instruments {
            let Some(price) = ctx.current_price(instrument) else {
                continue;
            };
            let amount = (budget / price).floor() as u64;
            if amount > 0 {
                ctx.buy(instrument, amount);
            }
        }
    }
}
