use crate::domain::simulation::StepContext;
use crate::domain::strategy::Strategy;

/// Never places an order; the portfolio stays in cash.
pub struct HoldStrategy;

impl Strategy for HoldStrategy {
    fn name(&self) -> &str {
        "hold"
    }

    fn execute(&mut self, _ctx: &mut StepContext<'_>) {}
}
