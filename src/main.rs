// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use pairport::app_config::{self, Config};
use pairport::{AppError, Controller, RunOptions, RunOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for pairport
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// pairport - grounded translation of one module at a time
///
/// Translates a single file into its counterpart language, after feeding the
/// engine every already translated dependency of that file.
#[derive(Parser, Debug)]
#[command(name = "pairport")]
#[command(version)]
#[command(about = "Translate one file, grounded in its translated dependencies")]
#[command(long_about = "pairport asks an AI engine to write or revise the counterpart of one file.

The file's dependencies are listed with the configured per-language tool. Every
dependency must already exist in both languages; otherwise pairport stops and
prints the complete list of missing files before contacting the engine.

EXAMPLES:
    pairport Nat/add.agda              # Write or revise Nat/add.kind
    pairport -m o Nat/add.agda         # Use the model with key 'o'
    pairport --dry-run Nat/add.agda    # Only save the prompt transcript
    pairport --list-models             # Show configured model keys
    pairport completions bash > pairport.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not
    exist, a default one is created. API keys are read from the credential file
    of the selected vendor (default ~/.config/<vendor>.token).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File to translate; its extension selects the source language
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Model selector key
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Resolve and assemble the prompt without calling the engine
    #[arg(long)]
    dry_run: bool,

    /// Print the configured model keys and exit
    #[arg(long)]
    list_models: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The logger accepts everything; the effective level is set via max_level
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "pairport", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(options: CommandLineOptions) -> Result<ExitCode> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    config.validate().context("Configuration validation failed")?;

    if options.list_models {
        for entry in &config.models {
            let marker = if entry.key == config.default_model { " (default)" } else { "" };
            println!("{:<4} {}/{}{}", entry.key, entry.vendor, entry.model, marker);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let file = options
        .file
        .context("FILE is required when no subcommand is specified")?;

    let run_options = RunOptions {
        dry_run: options.dry_run,
    };
    let controller = Controller::from_config(config, options.model.as_deref(), run_options)
        .map_err(|e| report_app_error(&e))?;

    let outcome = controller.run(&file).await.map_err(|e| report_app_error(&e))?;

    match outcome {
        RunOutcome::Written(report) => {
            for path in &report.written {
                info!("Success: {:?}", path);
            }
            if report.has_failures() {
                return Ok(ExitCode::from(1));
            }
        }
        RunOutcome::NothingWritten(report) => {
            if !report.skipped.is_empty() {
                warn!("Ignored {} record(s) in the other language", report.skipped.len());
            }
            if report.has_failures() {
                return Ok(ExitCode::from(1));
            }
        }
        RunOutcome::DryRun { transcript, context } => {
            match transcript {
                Some(path) => info!("Prompt saved to {:?}", path),
                None => println!("{}", context),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_app_error(e: &AppError) -> anyhow::Error {
    match e {
        AppError::Config(pairport::ConfigError::UnknownModel(key)) => {
            anyhow::anyhow!("Invalid model selector '{}'; run with --list-models to see the options", key)
        }
        other => anyhow::anyhow!("{}", other),
    }
}
