//! Configuration validation.
//!
//! Validates every config field before a simulation is built.

use crate::domain::error::SimError;
use crate::domain::evaluation::ResampleMode;
use crate::domain::strategies::StrategyKind;
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), SimError> {
    parse_number::<i64>(config, "simulation", "id")?;
    validate_initial_balance(config)?;
    validate_dates(config)?;
    validate_instruments(config)?;
    validate_runs(config)?;
    validate_data_source(config)?;
    validate_report_mode(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SimError> {
    if let Some(name) = config.get_non_empty("simulation", "strategy") {
        StrategyKind::from_name(&name)?;
    }
    validate_averages(config)?;
    validate_amount(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SimError {
    SimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse an optional numeric key. A key that is set but does not parse is
/// `ConfigInvalid`, never the caller's default.
pub fn parse_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SimError> {
    match config.get_non_empty(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), SimError> {
    let value =
        parse_number::<f64>(config, "simulation", "initial_balance")?.unwrap_or(10_000.0);
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(
            "simulation",
            "initial_balance",
            "initial_balance must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SimError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if end_date < start_date {
        return Err(invalid(
            "simulation",
            "end_date",
            "end_date must not be before start_date",
        ));
    }
    Ok(())
}

/// Parse a required `[simulation]` date in YYYY-MM-DD form.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, SimError> {
    match config.get_non_empty("simulation", field) {
        None => Err(SimError::ConfigMissing {
            section: "simulation".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
            invalid(
                "simulation",
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), SimError> {
    let Some(list) = config.get_non_empty("simulation", "instruments") else {
        return Err(SimError::ConfigMissing {
            section: "simulation".to_string(),
            key: "instruments".to_string(),
        });
    };
    parse_instruments(&list)
        .map(|_| ())
        .map_err(|e| invalid("simulation", "instruments", e.to_string()))
}

fn validate_runs(config: &dyn ConfigPort) -> Result<(), SimError> {
    if parse_number::<i64>(config, "simulation", "runs")?.unwrap_or(1) < 1 {
        return Err(invalid("simulation", "runs", "runs must be at least 1"));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), SimError> {
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();
    match source.as_str() {
        "csv" | "sqlite" => {}
        _ => {
            return Err(invalid(
                "data",
                "source",
                format!("unknown source '{source}', expected csv or sqlite"),
            ));
        }
    }
    if config.get_non_empty("data", "path").is_none() {
        return Err(SimError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }
    Ok(())
}

fn validate_report_mode(config: &dyn ConfigPort) -> Result<(), SimError> {
    if let Some(mode) = config.get_non_empty("report", "mode") {
        mode.parse::<ResampleMode>()
            .map_err(|reason| invalid("report", "mode", reason))?;
    }
    Ok(())
}

fn validate_averages(config: &dyn ConfigPort) -> Result<(), SimError> {
    let fast = parse_number::<i64>(config, "strategy", "fast")?.unwrap_or(10);
    let slow = parse_number::<i64>(config, "strategy", "slow")?.unwrap_or(30);
    if fast < 1 {
        return Err(invalid("strategy", "fast", "fast must be at least 1"));
    }
    if slow <= fast {
        return Err(invalid("strategy", "slow", "slow must be greater than fast"));
    }
    Ok(())
}

fn validate_amount(config: &dyn ConfigPort) -> Result<(), SimError> {
    if parse_number::<i64>(config, "strategy", "amount")?.unwrap_or(10) < 1 {
        return Err(invalid("strategy", "amount", "amount must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn valid_entries() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("simulation", "initial_balance", "1000"),
            ("simulation", "start_date", "2020-01-01"),
            ("simulation", "end_date", "2020-12-31"),
            ("simulation", "instruments", "AAPL,MSFT"),
            ("data", "path", "/tmp/prices"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str, &'static str)]) -> MapConfig {
        let mut entries = valid_entries();
        for e in extra {
            entries.retain(|(s, k, _)| !(s == &e.0 && k == &e.1));
            entries.push(*e);
        }
        MapConfig::new(&entries)
    }

    fn invalid_key(err: SimError) -> String {
        match err {
            SimError::ConfigInvalid { key, .. } | SimError::ConfigMissing { key, .. } => key,
            other => panic!("expected config error, got {other}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_simulation_config(&with(&[])).is_ok());
        assert!(validate_strategy_config(&with(&[])).is_ok());
    }

    #[test]
    fn negative_balance_rejected() {
        let err = validate_simulation_config(&with(&[("simulation", "initial_balance", "-5")]))
            .unwrap_err();
        assert_eq!(invalid_key(err), "initial_balance");
    }

    #[test]
    fn unparseable_balance_rejected() {
        let err = validate_simulation_config(&with(&[("simulation", "initial_balance", "1,000")]))
            .unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "initial_balance"));
    }

    #[test]
    fn unparseable_runs_rejected() {
        let err =
            validate_simulation_config(&with(&[("simulation", "runs", "three")])).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "runs"));
    }

    #[test]
    fn unparseable_strategy_amount_rejected() {
        let err = validate_strategy_config(&with(&[("strategy", "amount", "ten")])).unwrap_err();
        assert_eq!(invalid_key(err), "amount");
    }

    #[test]
    fn blank_numeric_keys_use_defaults() {
        assert_eq!(
            parse_number::<i64>(&with(&[("simulation", "runs", "  ")]), "simulation", "runs")
                .unwrap(),
            None
        );
        assert!(validate_simulation_config(&with(&[("simulation", "runs", "")])).is_ok());
    }

    #[test]
    fn end_before_start_rejected() {
        let err = validate_simulation_config(&with(&[("simulation", "end_date", "2019-12-31")]))
            .unwrap_err();
        assert_eq!(invalid_key(err), "end_date");
    }

    #[test]
    fn same_start_and_end_allowed() {
        assert!(
            validate_simulation_config(&with(&[("simulation", "end_date", "2020-01-01")])).is_ok()
        );
    }

    #[test]
    fn bad_date_format_rejected() {
        let err = validate_simulation_config(&with(&[("simulation", "start_date", "01/01/2020")]))
            .unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_instruments_rejected() {
        let mut entries = valid_entries();
        entries.retain(|(_, k, _)| *k != "instruments");
        let err = validate_simulation_config(&MapConfig::new(&entries)).unwrap_err();
        assert!(matches!(err, SimError::ConfigMissing { key, .. } if key == "instruments"));
    }

    #[test]
    fn duplicate_instruments_rejected() {
        let err = validate_simulation_config(&with(&[("simulation", "instruments", "AAPL,aapl")]))
            .unwrap_err();
        assert_eq!(invalid_key(err), "instruments");
    }

    #[test]
    fn zero_runs_rejected() {
        let err =
            validate_simulation_config(&with(&[("simulation", "runs", "0")])).unwrap_err();
        assert_eq!(invalid_key(err), "runs");
    }

    #[test]
    fn unknown_source_rejected() {
        let err = validate_simulation_config(&with(&[("data", "source", "parquet")])).unwrap_err();
        assert_eq!(invalid_key(err), "source");
    }

    #[test]
    fn missing_data_path_rejected() {
        let mut entries = valid_entries();
        entries.retain(|(s, _, _)| *s != "data");
        let err = validate_simulation_config(&MapConfig::new(&entries)).unwrap_err();
        assert!(matches!(err, SimError::ConfigMissing { section, .. } if section == "data"));
    }

    #[test]
    fn bad_report_mode_rejected() {
        let err = validate_simulation_config(&with(&[("report", "mode", "hourly")])).unwrap_err();
        assert_eq!(invalid_key(err), "mode");
    }

    #[test]
    fn unknown_strategy_rejected() {
        let err =
            validate_strategy_config(&with(&[("simulation", "strategy", "oracle")])).unwrap_err();
        assert!(matches!(err, SimError::UnknownStrategy { .. }));
    }

    #[test]
    fn slow_must_exceed_fast() {
        let err = validate_strategy_config(&with(&[
            ("strategy", "fast", "20"),
            ("strategy", "slow", "20"),
        ]))
        .unwrap_err();
        assert_eq!(invalid_key(err), "slow");
    }

    #[test]
    fn zero_amount_rejected() {
        let err = validate_strategy_config(&with(&[("strategy", "amount", "0")])).unwrap_err();
        assert_eq!(invalid_key(err), "amount");
    }
}
