//! Pluggable trading strategy interface.

use crate::domain::price::PriceRecord;
use crate::domain::simulation::StepContext;

/// A trading model driven by the simulation once per simulated date.
///
/// Implementations are built by a factory that receives the instrument
/// universe. `preprocess_data` sees the whole loaded price series before any
/// run starts; `execute` may place any number of orders through the context.
pub trait Strategy {
    fn name(&self) -> &str;

    fn preprocess_data(&mut self, _records: &[PriceRecord]) {}

    fn execute(&mut self, ctx: &mut StepContext<'_>);
}
