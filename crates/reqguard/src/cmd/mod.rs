use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check;
pub mod operations;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate one request against a schema without sending it.
    Check(CheckArgs),
    /// List the operations a schema declares.
    Operations(OperationsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Check(args) => check::run(args, format),
        Command::Operations(args) => operations::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// OpenAPI document (YAML or JSON).
    #[arg(long, value_name = "FILE", env = "REQGUARD_SCHEMA")]
    pub schema: PathBuf,
    /// Request method.
    #[arg(long, short = 'X', default_value = "POST")]
    pub method: String,
    /// Request URI, absolute or path-only.
    pub target: String,
    /// Request header as `Name: value`. Repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
    pub headers: Vec<String>,
    /// Inline request body.
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,
    /// Read the request body from a file.
    #[arg(long, value_name = "FILE", conflicts_with = "body")]
    pub body_file: Option<PathBuf>,
    /// Block invalid requests instead of only logging them.
    #[arg(long)]
    pub strict: bool,
    /// Reject body properties the schema does not declare.
    #[arg(long)]
    pub deny_unknown_properties: bool,
    /// Only check the body, not path, query or header parameters.
    #[arg(long)]
    pub skip_parameters: bool,
}

#[derive(Args, Debug)]
pub struct OperationsArgs {
    /// OpenAPI document (YAML or JSON).
    #[arg(long, value_name = "FILE", env = "REQGUARD_SCHEMA")]
    pub schema: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
