//! Outbound HTTP request pipeline with OpenAPI request validation.
//!
//! A [`Pipeline`] runs each request through an ordered chain of [`Stage`]s
//! before a [`Dispatch`] puts it on the wire. [`RequestValidationInterceptor`]
//! is the stage that checks requests against an OpenAPI document and either
//! logs mismatches (lenient) or rejects the request before it is sent (strict).

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod interceptor;
pub mod logger;
pub mod pipeline;

pub use config::InterceptorConfig;
pub use diagnostic::{render_diagnostic, render_path};
pub use error::{PipelineError, Result, ValidationError};
pub use interceptor::RequestValidationInterceptor;
pub use logger::{FailureLogger, TracingLogger};
pub use pipeline::{Dispatch, Loopback, Next, Pipeline, Request, Stage, StageFuture};
