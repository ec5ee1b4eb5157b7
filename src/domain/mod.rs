//! Core domain types and logic.

pub mod price;
pub mod ledger;
pub mod trade_log;
pub mod strategy;
pub mod strategies;
pub mod simulation;
pub mod evaluation;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
