use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use reqguard_schema::OperationRef;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of running one request through the validation stage.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub method: String,
    pub target: String,
    pub strict: bool,
    pub valid: bool,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckReport {
    fn verdict(&self) -> &'static str {
        match (self.valid, self.blocked) {
            (true, _) => "valid",
            (false, true) => "blocked",
            (false, false) => "logged",
        }
    }
}

pub fn print_check(report: &CheckReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METHOD", "TARGET", "RESULT", "CATEGORY", "MESSAGE"])
                .add_row(vec![
                    report.method.clone(),
                    report.target.clone(),
                    report.verdict().to_string(),
                    report.category.unwrap_or("-").to_string(),
                    report.message.clone().unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} {}: {}", report.method, report.target, report.verdict());
            if let Some(message) = &report.message {
                println!("  {message}");
            }
        }
    }
}

#[derive(Serialize)]
struct OperationOutput<'a> {
    method: &'a str,
    path: &'a str,
    operation_id: Option<&'a str>,
}

pub fn print_operations(operations: &[OperationRef], format: OutputFormat) {
    let rows: Vec<OperationOutput<'_>> = operations
        .iter()
        .map(|op| OperationOutput {
            method: op.method.as_str(),
            path: &op.path,
            operation_id: op.operation_id.as_deref(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METHOD", "PATH", "OPERATION"]);
            for row in &rows {
                table.add_row(vec![
                    row.method,
                    row.path,
                    row.operation_id.unwrap_or("-"),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                match row.operation_id {
                    Some(id) => println!("{:<7} {} ({id})", row.method, row.path),
                    None => println!("{:<7} {}", row.method, row.path),
                }
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
