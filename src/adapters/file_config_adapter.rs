//! INI file configuration adapter.

use crate::domain::error::SimError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// `[section] key = value` configuration loaded through `configparser`.
///
/// Section and key names are case-insensitive.
pub struct FileConfigAdapter {
    ini: Ini,
    origin: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let origin = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        ini.load(path.as_ref())
            .map_err(|reason| SimError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { ini, origin })
    }

    pub fn from_string(content: &str) -> Result<Self, SimError> {
        let origin = "<string>".to_string();
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| SimError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { ini, origin })
    }

    /// Where the configuration was read from, for messages.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_non_empty(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_non_empty(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_non_empty(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[simulation]
id = 7
initial_balance = 2500.5
start_date = 2020-01-01
end_date = 2020-12-31
instruments = AAPL, MSFT
strategy = sma_crossover
runs = 3

[data]
source = sqlite
path = /var/cache/prices.db

[report]
mode = monthly
chart_path = out/chart.svg

[strategy]
fast = 5
slow = 20
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_all_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("simulation", "id", 0), 7);
        assert_eq!(
            adapter.get_double("simulation", "initial_balance", 0.0),
            2500.5
        );
        assert_eq!(
            adapter.get_string("simulation", "instruments"),
            Some("AAPL, MSFT".to_string())
        );
        assert_eq!(adapter.get_string("data", "source"), Some("sqlite".to_string()));
        assert_eq!(adapter.get_string("report", "mode"), Some("monthly".to_string()));
        assert_eq!(adapter.get_int("strategy", "slow", 0), 20);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("report", "evaluations_path"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[simulation]
runs = many
").unwrap();
        assert_eq!(adapter.get_int("simulation", "runs", 1), 1);
        assert_eq!(adapter.get_int("simulation", "id", 42), 42);
    }

    #[test]
    fn get_double_returns_default_for_missing_or_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[simulation]
initial_balance = lots
").unwrap();
        assert_eq!(
            adapter.get_double("simulation", "initial_balance", 99.9),
            99.9
        );
        assert_eq!(adapter.get_double("simulation", "missing", 1.5), 1.5);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[report]
a = true
b = yes
c = 1
d = false
e = no
f = 0
",
        )
        .unwrap();
        assert!(adapter.get_bool("report", "a", false));
        assert!(adapter.get_bool("report", "b", false));
        assert!(adapter.get_bool("report", "c", false));
        assert!(!adapter.get_bool("report", "d", true));
        assert!(!adapter.get_bool("report", "e", true));
        assert!(!adapter.get_bool("report", "f", true));
        assert!(adapter.get_bool("report", "missing", true));
    }

    #[test]
    fn blank_value_is_not_non_empty() {
        let adapter = FileConfigAdapter::from_string("[report]
chart_path =   
").unwrap();
        assert_eq!(adapter.get_non_empty("report", "chart_path"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.origin(), file.path().display().to_string());
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/var/cache/prices.db".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        match result {
            Err(SimError::ConfigParse { file, .. }) => {
                assert_eq!(file, "/nonexistent/path/config.ini")
            }
            _ => panic!("expected ConfigParse error"),
        }
    }
}
