use std::fmt;

use reqguard_pipeline::PipelineError;
use reqguard_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match err {
        SchemaError::LoadFailed(_) => FAILURE,
        SchemaError::Yaml(_)
        | SchemaError::Json(_)
        | SchemaError::InvalidDocument(_)
        | SchemaError::CompileFailed { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn pipeline_error(context: &str, err: PipelineError) -> CliError {
    match err {
        PipelineError::Schema(err) => schema_error(context, err),
        PipelineError::Validation(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        PipelineError::Dispatch(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_schema_is_a_plain_failure() {
        let err = schema_error("load", SchemaError::LoadFailed("missing".to_string()));
        assert_eq!(err.code, FAILURE);
        assert_eq!(err.to_string(), "load: failed to load schema: missing");
    }

    #[test]
    fn malformed_schema_is_invalid_data() {
        let err = pipeline_error(
            "check",
            PipelineError::Schema(SchemaError::InvalidDocument("no paths".to_string())),
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
