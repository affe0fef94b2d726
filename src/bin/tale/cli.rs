//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for Tale.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Struct containing the CLI configuration for Tale.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the engine.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of Tale.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// Also log warnings, such as a program falling back to a dialect guess.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the pipeline stage currently running.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the translator and executor.
    #[value(alias("3"))]
    Debug,

    /// Log extra information, including per-line rewrite decisions.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a TALE program against a fixed tape of inputs.
    Run(RunArgs),

    /// Translate a TALE program and report the first problem found, without
    /// running it.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// The path to the TALE source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// A file holding one input value per line, fed to each `ask` in order.
    #[arg(long)]
    pub inputs: Option<std::path::PathBuf>,

    /// Pretty-print the JSON result instead of emitting it on one line.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// The path to the TALE source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// Pretty-print the JSON result instead of emitting it on one line.
    #[arg(long)]
    pub pretty: bool,
}
