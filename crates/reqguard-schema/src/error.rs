/// Errors that can occur while loading or compiling a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema document is not valid YAML.
    #[error("schema is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The schema document is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but is not a usable OpenAPI 3 document.
    #[error("invalid OpenAPI document: {0}")]
    InvalidDocument(String),

    /// A request schema could not be compiled.
    #[error("failed to compile schema for {operation}: {message}")]
    CompileFailed { operation: String, message: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
