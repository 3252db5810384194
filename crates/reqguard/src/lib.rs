//! Validate outbound HTTP requests against an OpenAPI document before they
//! are sent.
//!
//! # Crate Structure
//!
//! - [`schema`]: OpenAPI document loading and per-request validation
//! - [`pipeline`]: outbound request pipeline and the validation stage
//!
//! ```no_run
//! use reqguard::pipeline::{Loopback, Pipeline, RequestValidationInterceptor, TracingLogger};
//! use reqguard::schema::SchemaSource;
//!
//! let stage = RequestValidationInterceptor::new(
//!     TracingLogger,
//!     true,
//!     SchemaSource::Path("openapi.yaml".into()),
//! );
//! let pipeline = Pipeline::new(Loopback).with_stage(stage);
//! # let _ = pipeline;
//! ```

/// Re-export schema types.
pub mod schema {
    pub use reqguard_schema::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use reqguard_pipeline::*;
}
