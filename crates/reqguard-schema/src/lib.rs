//! OpenAPI request validation for outbound HTTP requests.
//!
//! Load an OpenAPI 3 document once, compile the request schemas of every
//! operation, then check each outgoing request's path, parameters and body.
//! Failures come back as a [`ValidationOutcome`] rather than an error, with
//! the location and value of a body mismatch preserved for diagnostics.

pub mod config;
pub mod document;
pub mod error;
pub mod outcome;
mod routing;
mod strict;
pub mod validator;

pub use config::ValidatorConfig;
pub use document::{OperationRef, SchemaDocument, SchemaSource};
pub use error::{Result, SchemaError};
pub use outcome::{
    Breadcrumb, FailureCategory, SchemaFailure, SchemaMismatch, Segment, ValidationOutcome,
};
pub use validator::RequestValidator;
