//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgChartAdapter;
use crate::domain::config_validation::{
    parse_date, parse_number, validate_simulation_config, validate_strategy_config,
};
use crate::domain::error::SimError;
use crate::domain::evaluation::ResampleMode;
use crate::domain::metrics::max_drawdown;
use crate::domain::simulation::{Simulation, SimulationConfig};
use crate::domain::strategies::{StrategyKind, StrategyParams};
use crate::domain::universe::{Coverage, check_coverage, parse_instruments};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stocksim", about = "Historical stock strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Number of repeated runs (overrides [simulation] runs)
        #[arg(short, long)]
        runs: Option<usize>,
        /// Resampling mode for reports: daily, monthly or yearly
        #[arg(short, long)]
        mode: Option<String>,
        #[arg(short, long)]
        strategy: Option<String>,
        /// SVG chart output path
        #[arg(long)]
        chart: Option<PathBuf>,
        /// CSV evaluation table output path
        #[arg(long)]
        evaluations: Option<PathBuf>,
        /// Print every run's trade log to stdout
        #[arg(long)]
        logs: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored data range for the configured instruments
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Cache a CSV directory into the configured SQLite database
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        csv_dir: PathBuf,
    },
}

/// Command line overrides for the `simulate` pipeline.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    pub runs: Option<usize>,
    pub mode: Option<String>,
    pub strategy: Option<String>,
    pub chart: Option<PathBuf>,
    pub evaluations: Option<PathBuf>,
    pub logs: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            runs,
            mode,
            strategy,
            chart,
            evaluations,
            logs,
        } => run_simulate(
            &config,
            &SimulateOptions {
                runs,
                mode,
                strategy,
                chart,
                evaluations,
                logs,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, instrument } => run_info(&config, instrument.as_deref()),
        #[cfg(feature = "sqlite")]
        Command::Import { config, csv_dir } => run_import(&config, &csv_dir),
    }
}

fn fail(err: SimError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

pub fn build_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, SimError> {
    let list = config
        .get_non_empty("simulation", "instruments")
        .ok_or_else(|| SimError::ConfigMissing {
            section: "simulation".into(),
            key: "instruments".into(),
        })?;
    let instruments = parse_instruments(&list).map_err(|e| SimError::ConfigInvalid {
        section: "simulation".into(),
        key: "instruments".into(),
        reason: e.to_string(),
    })?;

    Ok(SimulationConfig {
        id: parse_number(config, "simulation", "id")?.unwrap_or(0),
        initial_balance: parse_number(config, "simulation", "initial_balance")?
            .unwrap_or(10_000.0),
        instruments,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    })
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> StrategyParams {
    let defaults = StrategyParams::default();
    StrategyParams {
        fast: config.get_int("strategy", "fast", defaults.fast as i64).max(1) as usize,
        slow: config.get_int("strategy", "slow", defaults.slow as i64).max(1) as usize,
        amount: config.get_int("strategy", "amount", defaults.amount as i64).max(1) as u64,
    }
}

/// Data source named by `[data] source`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, SimError> {
    let path = config
        .get_non_empty("data", "path")
        .ok_or_else(|| SimError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let source = config
        .get_non_empty("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => Ok(Box::new(CsvAdapter::new(PathBuf::from(path)))),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        other => Err(SimError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unsupported source '{other}' in this build"),
        }),
    }
}

fn resolve_mode(config: &dyn ConfigPort, opts: &SimulateOptions) -> Result<ResampleMode, SimError> {
    match opts
        .mode
        .clone()
        .or_else(|| config.get_non_empty("report", "mode"))
    {
        None => Ok(ResampleMode::default()),
        Some(mode) => mode.parse().map_err(|reason| SimError::ConfigInvalid {
            section: "report".into(),
            key: "mode".into(),
            reason,
        }),
    }
}

fn run_simulate(config_path: &Path, opts: &SimulateOptions) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_simulation_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Open data source
    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    run_simulation_pipeline(data_port.as_ref(), &adapter, opts)
}

/// Build, execute and report a simulation against an already opened data
/// source. Config must have passed validation.
pub fn run_simulation_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    opts: &SimulateOptions,
) -> ExitCode {
    // Stage 3: Resolve simulation parameters
    let sim_config = match build_simulation_config(config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let strategy_name = opts
        .strategy
        .clone()
        .or_else(|| config.get_non_empty("simulation", "strategy"))
        .unwrap_or_else(|| "hold".to_string());
    let kind = match StrategyKind::from_name(&strategy_name) {
        Ok(k) => k,
        Err(e) => return fail(e),
    };
    let params = build_strategy_params(config);
    let mode = match resolve_mode(config, opts) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };
    let runs = opts
        .runs
        .unwrap_or_else(|| config.get_int("simulation", "runs", 1).max(1) as usize);
    if runs == 0 {
        eprintln!("error: runs must be at least 1");
        return ExitCode::from(2);
    }

    // Stage 4: Load prices and build the engine
    eprintln!(
        "Loading prices for {} from {} to {}",
        sim_config.instruments.join(", "),
        sim_config.start_date,
        sim_config.end_date
    );
    let mut simulation = match Simulation::new(sim_config, data_port, |instruments| {
        kind.build(instruments, &params)
    }) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // Stage 5: Execute
    eprintln!(
        "Running {} x{}: {} trading days ({} to {})",
        simulation.strategy_name(),
        runs,
        simulation.records().len(),
        simulation.actual_start_date(),
        simulation.actual_end_date()
    );
    simulation.execute(runs);

    // Stage 6: Summary on stderr, trade logs on stdout
    let report = simulation.report(mode);
    let drawdown = max_drawdown(&simulation.report(ResampleMode::Daily).means());
    print_summary(&simulation, drawdown);

    if opts.logs {
        for run in 0..simulation.results().len() {
            if let Some(logs) = simulation.logs_str(run) {
                println!("Run {}:", run + 1);
                print!("{}", logs);
            }
        }
    }

    // Stage 7: Reports
    let chart_path = opts
        .chart
        .clone()
        .or_else(|| config.get_non_empty("report", "chart_path").map(PathBuf::from));
    let evaluations_path = opts.evaluations.clone().or_else(|| {
        config
            .get_non_empty("report", "evaluations_path")
            .map(PathBuf::from)
    });

    let outputs: [(Option<PathBuf>, &dyn ReportPort); 2] = [
        (chart_path, &SvgChartAdapter::default()),
        (evaluations_path, &CsvReportAdapter),
    ];
    for (path, writer) in outputs {
        let Some(path) = path else { continue };
        if let Err(e) = writer.write(&report, &path) {
            return fail(e);
        }
        eprintln!("Report written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn print_summary(simulation: &Simulation, drawdown: f64) {
    let Some(summary) = simulation.summary() else {
        return;
    };

    eprintln!("\n=== Simulation {} ===", simulation.id());
    eprintln!("Strategy:         {}", simulation.strategy_name());
    eprintln!("Initial Balance:  {:.2}", simulation.initial_balance());
    eprintln!("Runs:             {}", summary.runs);
    eprintln!("Mean Profit:      {:.2}", summary.mean_profit);
    eprintln!("Mean Return:      {:.2}%", summary.mean_profit_percentage);
    eprintln!(
        "Annualized:       {:.2}%",
        summary.mean_annualized_profit_percentage
    );
    eprintln!("Best / Worst:     {:.2} / {:.2}", summary.best_profit, summary.worst_profit);
    eprintln!("Max Drawdown:     -{:.1}%", drawdown * 100.0);

    if summary.runs > 1 {
        eprintln!("\n=== Per-Run Summary ===");
        for (i, result) in simulation.results().iter().enumerate() {
            let sign = if result.profit >= 0.0 { "+" } else { "" };
            eprintln!(
                "  run {}:  {} trades, {}{:.2} ({:.2}%)",
                i + 1,
                result.logs.len(),
                sign,
                result.profit,
                result.profit_percentage,
            );
        }
    }
}

pub fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }
    let sim_config = match build_simulation_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let strategy = adapter
        .get_non_empty("simulation", "strategy")
        .unwrap_or_else(|| "hold".to_string());
    eprintln!("\nSimulation:");
    eprintln!("  id:          {}", sim_config.id);
    eprintln!("  balance:     {:.2}", sim_config.initial_balance);
    eprintln!("  window:      {} to {}", sim_config.start_date, sim_config.end_date);
    eprintln!("  instruments: {}", sim_config.instruments.join(", "));
    eprintln!("  strategy:    {}", strategy.to_lowercase());

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, instrument: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let instruments = match instrument {
        Some(i) => vec![i.trim().to_uppercase()],
        None => match adapter.get_non_empty("simulation", "instruments") {
            Some(list) => match parse_instruments(&list) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("error: failed to parse instruments: {e}");
                    return ExitCode::from(2);
                }
            },
            None => match data_port.list_instruments() {
                Ok(v) => v,
                Err(e) => return fail(e),
            },
        },
    };

    let window = match (
        parse_date(&adapter, "start_date"),
        parse_date(&adapter, "end_date"),
    ) {
        (Ok(start), Ok(end)) => Some((start, end)),
        _ => None,
    };
    print_coverage(data_port.as_ref(), &instruments, window)
}

/// Print each instrument's stored range, flagging ranges that miss `window`.
pub fn print_coverage(
    data_port: &dyn DataPort,
    instruments: &[String],
    window: Option<(NaiveDate, NaiveDate)>,
) -> ExitCode {
    let coverage = match check_coverage(data_port, instruments) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    for entry in &coverage {
        match coverage_line(entry, window) {
            Some(line) => println!("{line}"),
            None => eprintln!("{}: no data", entry.instrument),
        }
    }
    ExitCode::SUCCESS
}

fn coverage_line(entry: &Coverage, window: Option<(NaiveDate, NaiveDate)>) -> Option<String> {
    let (first, last, count) = entry.range?;
    let mut line = format!("{}\t{}\t{}\t{}", entry.instrument, first, last, count);
    if let Some((start, end)) = window
        && !entry.overlaps(start, end)
    {
        line.push_str(&format!("\tno data between {start} and {end}"));
    }
    Some(line)
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, csv_dir: &Path) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let cache = match SqliteAdapter::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    match import_csv_dir(&CsvAdapter::new(csv_dir.to_path_buf()), &cache) {
        Ok(total) => {
            eprintln!("Imported {} bars from {}", total, csv_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Copy every instrument of a CSV directory into the SQLite cache.
#[cfg(feature = "sqlite")]
pub fn import_csv_dir(
    source: &CsvAdapter,
    cache: &crate::adapters::sqlite_adapter::SqliteAdapter,
) -> Result<usize, SimError> {
    let mut total = 0;
    for instrument in source.list_instruments()? {
        let bars = source.read_all(&instrument)?;
        eprintln!("  {}: {} bars", instrument, bars.len());
        total += cache.insert_bars(&bars)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_overrides() {
        let cli = Cli::try_parse_from([
            "stocksim", "simulate", "-c", "sim.ini", "--runs", "5", "--mode", "monthly", "--logs",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate {
                config, runs, mode, logs, ..
            } => {
                assert_eq!(config, PathBuf::from("sim.ini"));
                assert_eq!(runs, Some(5));
                assert_eq!(mode.as_deref(), Some("monthly"));
                assert!(logs);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn simulate_requires_config() {
        assert!(Cli::try_parse_from(["stocksim", "simulate"]).is_err());
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn coverage_line_flags_range_outside_window() {
        let entry = Coverage {
            instrument: "AAA".into(),
            range: Some((ymd(2019, 1, 1), ymd(2019, 12, 31), 250)),
        };

        assert_eq!(
            coverage_line(&entry, Some((ymd(2019, 6, 1), ymd(2020, 6, 1)))).unwrap(),
            "AAA\t2019-01-01\t2019-12-31\t250"
        );
        assert_eq!(
            coverage_line(&entry, Some((ymd(2020, 1, 1), ymd(2020, 6, 1)))).unwrap(),
            "AAA\t2019-01-01\t2019-12-31\t250\tno data between 2020-01-01 and 2020-06-01"
        );
        assert_eq!(
            coverage_line(&entry, None).unwrap(),
            "AAA\t2019-01-01\t2019-12-31\t250"
        );
    }

    #[test]
    fn coverage_line_is_none_without_data() {
        let entry = Coverage {
            instrument: "AAA".into(),
            range: None,
        };
        assert_eq!(coverage_line(&entry, Some((ymd(2020, 1, 1), ymd(2020, 6, 1)))), None);
    }
}
