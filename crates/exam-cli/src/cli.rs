//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "exam-cli",
    version,
    about = "Exam engine - validate exam schemas, render cards, format and parse values",
    long_about = "Works on the JSON documents of the eye-care exam engine.\n\n\
                  Validates schemas, renders exam summary cards, and formats or\n\
                  parses single field values against their definitions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient values in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Engine options (JSON).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Code tables (JSON) added to the built-in ones.
    #[arg(long = "codes", value_name = "PATH", global = true)]
    pub codes: Option<PathBuf>,

    /// Localisation labels (JSON).
    #[arg(long = "labels", value_name = "PATH", global = true)]
    pub labels: Option<PathBuf>,

    /// Reject option text that matches no code, even for freestyle fields.
    #[arg(long = "strict", global = true)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check exam schemas for structural problems.
    Validate(ValidateArgs),

    /// Render the summary card of an exam.
    Card(CardArgs),

    /// Format a stored value of a schema field for display.
    Format(FormatArgs),

    /// Parse entered text of a schema field into its stored value.
    Parse(ParseArgs),

    /// List the display texts of a code table.
    Codes(CodesArgs),
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Exam schema files.
    #[arg(value_name = "SCHEMA", required = true)]
    pub schemas: Vec<PathBuf>,

    /// Visit and patient field definitions (JSON).
    #[arg(long = "items", value_name = "PATH")]
    pub items: Option<PathBuf>,

    /// Require every mapped field to name a path of the given schemas or items.
    #[arg(long = "check-mapped")]
    pub check_mapped: bool,
}

#[derive(Parser)]
pub struct CardArgs {
    /// The exam to render (JSON with its definition and values).
    #[arg(value_name = "EXAM")]
    pub exam: PathBuf,

    /// Other exams of the same visit.
    #[arg(long = "with", value_name = "EXAM")]
    pub others: Vec<PathBuf>,

    /// Exam schemas for exam types the visit holds no exam of.
    #[arg(long = "schema", value_name = "SCHEMA")]
    pub schemas: Vec<PathBuf>,

    #[arg(long = "visit", value_name = "PATH")]
    pub visit: Option<PathBuf>,

    #[arg(long = "patient", value_name = "PATH")]
    pub patient: Option<PathBuf>,

    /// Visit and patient field definitions (JSON).
    #[arg(long = "items", value_name = "PATH")]
    pub items: Option<PathBuf>,

    /// Print the card as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct FormatArgs {
    /// Exam schema holding the field.
    #[arg(long = "schema", value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Field path inside the schema, e.g. `Wear Rx.od.sph`.
    #[arg(long = "field", value_name = "PATH")]
    pub field: String,

    /// Stored value as JSON; anything that is not JSON is taken as text.
    #[arg(value_name = "VALUE")]
    pub value: String,
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Exam schema holding the field.
    #[arg(long = "schema", value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Field path inside the schema.
    #[arg(long = "field", value_name = "PATH")]
    pub field: String,

    /// Entered text.
    #[arg(value_name = "TEXT")]
    pub text: String,
}

#[derive(Parser)]
pub struct CodesArgs {
    /// Table reference, optionally with an identifier (`table.identifier`).
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Attribute filters as `key=value`.
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
