use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::pipeline::Request;

/// A request rejected by the validation stage in strict mode.
pub struct ValidationError {
    message: String,
    request: Box<Request>,
    cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl ValidationError {
    pub fn new(
        message: impl Into<String>,
        request: Request,
        cause: Option<Arc<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            request: Box::new(request),
            cause,
        }
    }

    /// The rendered diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The request that failed validation. It was never sent.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Take back ownership of the rejected request.
    pub fn into_request(self) -> Request {
        *self.request
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationError")
            .field("message", &self.message)
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("cause", &self.cause)
            .finish()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Errors surfaced by a request pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The request does not match the schema and strict mode is on.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The offending value of a mismatch could not be rendered.
    #[error("failed to render validation diagnostic: {0}")]
    DiagnosticRendering(#[source] serde_json::Error),

    /// The schema document could not be loaded or compiled.
    #[error("request schema unavailable: {0}")]
    Schema(#[from] reqguard_schema::SchemaError),

    /// The terminal dispatcher failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] Box<dyn Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
