//! Taiji CLI - Command-line driver for Taiji Form
//!
//! Commands:
//! - run: Score a stream of snapshot records from stdin (streaming mode)
//! - evaluate: Score a single snapshot against one action
//! - actions: List the action catalog
//! - validate: Validate catalog and configuration files
//! - doctor: Diagnose engine health and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taiji_form::stream::{EvaluationRecord, SnapshotRecord, TimelineDriver};
use taiji_form::{
    ActionCatalog, EngineConfig, EngineError, PoseEvaluator, PoseSnapshot, SessionTracker,
    PRODUCER_NAME, TAIJI_VERSION,
};

/// Taiji - On-device scoring for Tai Chi posture practice
#[derive(Parser)]
#[command(name = "taiji")]
#[command(version = TAIJI_VERSION)]
#[command(
    about = "Score body landmark snapshots against Tai Chi reference forms",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score snapshot records from stdin (streaming mode)
    Run {
        /// Action catalog file (JSON array); built-in catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Action to start on (defaults to the first catalog action)
        #[arg(long)]
        action: Option<String>,

        /// Advance to the next action whenever one completes
        #[arg(long)]
        auto_advance: bool,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Do not flush output after each record
        #[arg(long = "no-flush", action = clap::ArgAction::SetFalse)]
        flush: bool,
    },

    /// Score a single snapshot against one action
    Evaluate {
        /// Snapshot file, a JSON array of 33 landmarks (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Action name
        #[arg(short, long)]
        action: String,

        /// Action catalog file (JSON array)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// List the action catalog
    Actions {
        /// Action catalog file (JSON array)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate catalog and configuration files
    Validate {
        /// Action catalog file (JSON array)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), TaijiCliError> {
    match cli.command {
        Commands::Run {
            catalog,
            config,
            action,
            auto_advance,
            output_format,
            flush,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let config = load_config(config.as_deref())?;
            cmd_run(&catalog, config, action.as_deref(), auto_advance, &output_format, flush)
        }

        Commands::Evaluate {
            input,
            action,
            catalog,
            config,
            output_format,
        } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let config = load_config(config.as_deref())?;
            cmd_evaluate(&input, &action, &catalog, &config, &output_format)
        }

        Commands::Actions { catalog, json } => {
            let catalog = load_catalog(catalog.as_deref())?;
            cmd_actions(&catalog, json)
        }

        Commands::Validate {
            catalog,
            config,
            json,
        } => cmd_validate(catalog.as_deref(), config.as_deref(), json),

        Commands::Doctor {
            catalog,
            config,
            json,
        } => cmd_doctor(catalog.as_deref(), config.as_deref(), json),
    }
}

fn cmd_run(
    catalog: &ActionCatalog,
    config: EngineConfig,
    action: Option<&str>,
    auto_advance: bool,
    output_format: &OutputFormat,
    flush: bool,
) -> Result<(), TaijiCliError> {
    let mut session = SessionTracker::with_config(catalog, config)?;
    session.start();
    if let Some(name) = action {
        session.select_action(name)?;
    }

    let mut driver = TimelineDriver::new(session).with_auto_advance(auto_advance);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buffered: Vec<EvaluationRecord> = Vec::new();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let record = SnapshotRecord::parse_line(trimmed).map_err(|e| {
            TaijiCliError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        let output = driver.process(record);

        match output_format {
            OutputFormat::Ndjson => {
                writeln!(stdout, "{}", serde_json::to_string(&output)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => buffered.push(output),
        }
    }

    match output_format {
        OutputFormat::Ndjson => {}
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string(&buffered)?)?,
        OutputFormat::JsonPretty => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&buffered)?)?
        }
    }
    stdout.flush()?;

    let history = driver.session().history();
    tracing::info!(
        snapshots = history.len(),
        average = history.average().unwrap_or(0.0),
        best = history.best().unwrap_or(0),
        combo = driver.session().state().combo_count,
        "stream finished"
    );

    Ok(())
}

fn cmd_evaluate(
    input: &Path,
    action_name: &str,
    catalog: &ActionCatalog,
    config: &EngineConfig,
    output_format: &OutputFormat,
) -> Result<(), TaijiCliError> {
    let input_data = read_input(input)?;
    let snapshot: PoseSnapshot = serde_json::from_str(&input_data)?;

    let action = catalog
        .get(action_name)
        .ok_or_else(|| EngineError::UnknownAction(action_name.to_string()))?;

    let evaluation = PoseEvaluator::new(config.visibility_threshold).evaluate(&snapshot, action);

    let output = match output_format {
        OutputFormat::Ndjson | OutputFormat::Json => serde_json::to_string(&evaluation)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&evaluation)?,
    };
    println!("{}", output);

    Ok(())
}

fn cmd_actions(catalog: &ActionCatalog, json: bool) -> Result<(), TaijiCliError> {
    if json {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }

    println!("Action Catalog");
    println!("==============");
    for action in catalog.iter() {
        println!();
        println!("{} ({}s)", action.name, action.duration_seconds);
        println!("  {}", action.description);
        println!("  Keypoints:");
        for kp in &action.keypoints {
            println!("    - {}: {}° ± {}°", kp.name, kp.target_angle, kp.tolerance);
        }
        println!("  Stages:");
        for stage in &action.stages {
            println!(
                "    - [{:.2}, {:.2}) {}: {}",
                stage.progress.0, stage.progress.1, stage.name, stage.description
            );
        }
    }

    Ok(())
}

fn cmd_validate(
    catalog: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), TaijiCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    if catalog.is_none() && config.is_none() {
        return Err(TaijiCliError::NothingToValidate);
    }

    if let Some(path) = catalog {
        checks.push(check_catalog(path));
    }
    if let Some(path) = config {
        checks.push(check_config(path));
    }

    let failed = checks
        .iter()
        .filter(|c| matches!(c.status, CheckStatus::Error))
        .count();

    let report = ValidationReport {
        total_files: checks.len(),
        valid_files: checks.len() - failed,
        invalid_files: failed,
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total files:   {}", report.total_files);
        println!("Valid files:   {}", report.valid_files);
        println!("Invalid files: {}", report.invalid_files);

        for check in &report.checks {
            println!("  - {}: {}", check.name, check.message);
        }
    }

    if report.invalid_files > 0 {
        Err(TaijiCliError::ValidationFailed(report.invalid_files))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    catalog: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), TaijiCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "taiji_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Taiji Form version {}", TAIJI_VERSION),
    });

    let builtin = ActionCatalog::builtin();
    checks.push(DoctorCheck {
        name: "builtin_catalog".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} built-in actions: {}", builtin.len(), builtin.names().join(", ")),
    });

    match catalog {
        Some(path) if path.exists() => checks.push(check_catalog(path)),
        Some(_) => checks.push(DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Warning,
            message: "Catalog file does not exist".to_string(),
        }),
        None => {}
    }

    match config {
        Some(path) if path.exists() => checks.push(check_config(path)),
        Some(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        None => {}
    }

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TAIJI_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Taiji Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(TaijiCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TaijiCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_catalog(path: Option<&Path>) -> Result<ActionCatalog, TaijiCliError> {
    match path {
        Some(path) => Ok(ActionCatalog::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ActionCatalog::builtin().clone()),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, TaijiCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn check_catalog(path: &Path) -> DoctorCheck {
    let result = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read catalog file: {}", e))
        .and_then(|content| ActionCatalog::from_json(&content).map_err(|e| e.to_string()));

    match result {
        Ok(catalog) => DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Ok,
            message: format!("Catalog valid ({} actions)", catalog.len()),
        },
        Err(message) => DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Error,
            message,
        },
    }
}

fn check_config(path: &Path) -> DoctorCheck {
    let result = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file: {}", e))
        .and_then(|content| EngineConfig::from_json(&content).map_err(|e| e.to_string()));

    match result {
        Ok(config) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Config valid (visibility >= {}, combo >= {})",
                config.visibility_threshold, config.combo_threshold
            ),
        },
        Err(message) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message,
        },
    }
}

// Error types

#[derive(Debug)]
enum TaijiCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    ParseError(String),
    NothingToValidate,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for TaijiCliError {
    fn from(e: io::Error) -> Self {
        TaijiCliError::Io(e)
    }
}

impl From<EngineError> for TaijiCliError {
    fn from(e: EngineError) -> Self {
        TaijiCliError::Engine(e)
    }
}

impl From<serde_json::Error> for TaijiCliError {
    fn from(e: serde_json::Error) -> Self {
        TaijiCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TaijiCliError> for CliError {
    fn from(e: TaijiCliError) -> Self {
        match e {
            TaijiCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TaijiCliError::Engine(EngineError::UnknownAction(name)) => CliError {
                code: "UNKNOWN_ACTION".to_string(),
                message: format!("Unknown action: {}", name),
                hint: Some("Run 'taiji actions' to list available actions".to_string()),
            },
            TaijiCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'taiji validate' on your catalog and config".to_string()),
            },
            TaijiCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Snapshots must be JSON arrays of 33 landmarks".to_string()),
            },
            TaijiCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be a record with timestamp and landmarks".to_string()),
            },
            TaijiCliError::NothingToValidate => CliError {
                code: "NOTHING_TO_VALIDATE".to_string(),
                message: "No files given".to_string(),
                hint: Some("Pass --catalog and/or --config".to_string()),
            },
            TaijiCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} files failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            TaijiCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_files: usize,
    valid_files: usize,
    invalid_files: usize,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
