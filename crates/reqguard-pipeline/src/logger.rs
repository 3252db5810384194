use std::sync::Arc;

use reqguard_schema::SchemaFailure;

/// Sink for validation failures.
pub trait FailureLogger: Send + Sync {
    /// Record a failed validation. `failure` is the full failure as context.
    fn error(&self, message: &str, failure: &SchemaFailure);
}

/// Emits failures as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl FailureLogger for TracingLogger {
    fn error(&self, message: &str, failure: &SchemaFailure) {
        tracing::error!(
            category = %failure.category,
            exception = ?failure,
            "{message}"
        );
    }
}

impl<T: FailureLogger + ?Sized> FailureLogger for Arc<T> {
    fn error(&self, message: &str, failure: &SchemaFailure) {
        (**self).error(message, failure);
    }
}
