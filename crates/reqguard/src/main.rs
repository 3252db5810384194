mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "reqguard",
    version,
    about = "Check HTTP requests against an OpenAPI document"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_subcommand() {
        let cli = Cli::try_parse_from([
            "reqguard",
            "check",
            "--schema",
            "openapi.yaml",
            "-X",
            "post",
            "/orders",
            "-H",
            "Accept-Language: de-DE",
            "--body",
            "{}",
            "--strict",
        ])
        .expect("check args should parse");

        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(args.strict);
        assert_eq!(args.headers, vec!["Accept-Language: de-DE"]);
        assert_eq!(args.target, "/orders");
    }

    #[test]
    fn rejects_conflicting_body_args() {
        let err = Cli::try_parse_from([
            "reqguard",
            "check",
            "--schema",
            "openapi.yaml",
            "/orders",
            "--body",
            "{}",
            "--body-file",
            "body.json",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_operations_subcommand() {
        let cli = Cli::try_parse_from([
            "reqguard",
            "--format",
            "json",
            "operations",
            "--schema",
            "openapi.yaml",
        ])
        .expect("operations args should parse");
        assert!(matches!(cli.command, Command::Operations(_)));
    }
}
