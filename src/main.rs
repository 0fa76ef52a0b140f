//! Command-line entry point.

use anomaly_forecast::config::ForecastConfig;
use anomaly_forecast::data::{load_history, read_gistemp, EnsoClient};
use anomaly_forecast::error::{ForecastError, Result};
use anomaly_forecast::models::sarimax::{ModelSelector, Sarimax};
use anomaly_forecast::pipeline::{run_adaptive_forecast, Report};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ANOMALY_FORECAST_LOG";

const GISTEMP_URL: &str = "https://data.giss.nasa.gov/gistemp/tabledata_v4/GLB.Ts+dSST.txt";

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
enum ExitCode {
    /// Forecast produced
    Success = 0,

    /// Local anomaly table missing; download it and rerun
    MissingDataFile = 2,

    /// Configuration or command-line error
    ConfigError = 10,

    /// Input data could not be fetched or parsed
    DataError = 11,

    /// No usable model
    ModelError = 12,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&ForecastError> for ExitCode {
    fn from(err: &ForecastError) -> Self {
        match err {
            ForecastError::DataFileNotFound(_) => ExitCode::MissingDataFile,
            ForecastError::Config(_) | ForecastError::HorizonMismatch { .. } => {
                ExitCode::ConfigError
            }
            e if e.is_data_error() => ExitCode::DataError,
            ForecastError::NoViableModel(_)
            | ForecastError::InsufficientHistory { .. }
            | ForecastError::InsufficientData { .. }
            | ForecastError::ComputationError(_) => ExitCode::ModelError,
            _ => ExitCode::InternalError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Forecast the monthly global temperature anomaly with an ENSO covariate.
#[derive(Debug, Parser)]
#[command(name = "anomaly-forecast", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short = 'c', env = "ANOMALY_FORECAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Target month as YYYYMM
    #[arg(long, value_name = "YYYYMM")]
    target: Option<String>,

    /// GISTEMP table (GLB.Ts+dSST.txt)
    #[arg(long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// ENSO feed URL
    #[arg(long, value_name = "URL")]
    enso_url: Option<String>,

    /// Backtest window lengths in months
    #[arg(long, value_delimiter = ',', value_name = "MONTHS")]
    windows: Option<Vec<usize>>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Result<ForecastConfig> {
        let mut config = match &self.config {
            Some(path) => ForecastConfig::load(path)?,
            None => ForecastConfig::default(),
        };
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(path) = &self.data_file {
            config.data_file = path.clone();
        }
        if let Some(url) = &self.enso_url {
            config.enso_url = url.clone();
        }
        if let Some(windows) = &self.windows {
            config.window_lengths = windows.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<String> {
    let config = cli.config()?;
    let target = config.target_month()?;

    let anomaly = read_gistemp(&config.data_file)?;
    let enso = EnsoClient::new(config.http_timeout())?.fetch(&config.enso_url)?;
    let history = load_history(&anomaly, &enso, config.history_start_month()?)?;

    let fitter = Sarimax::new();
    let selector = ModelSelector::new(&fitter);
    let output = run_adaptive_forecast(
        &selector,
        &history,
        target,
        &config.backtest(),
        &config.bins,
    )?;
    info!(
        stage = "report",
        champion = output.backtest.champion.window,
        mean = output.forecast.probabilities.mean,
        "forecast complete"
    );

    let report = Report::new(&output.backtest, &output.forecast, &config.reference);
    match cli.format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => report.to_json(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::Success
        }
        Err(err) => {
            error!("{err}");
            if let ForecastError::DataFileNotFound(path) = &err {
                eprintln!("Download the GISTEMP table from {GISTEMP_URL}");
                eprintln!("and save it as {path}, then rerun.");
            }
            ExitCode::from(&err)
        }
    };
    std::process::exit(code.as_i32());
}
