use std::fs;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, Uri};
use reqguard_pipeline::{
    FailureLogger, InterceptorConfig, Loopback, Pipeline, PipelineError, Request,
    RequestValidationInterceptor, TracingLogger,
};
use reqguard_schema::{SchemaFailure, SchemaSource, ValidatorConfig};

use crate::cmd::CheckArgs;
use crate::exit::{pipeline_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_check, CheckReport, OutputFormat};

/// Forwards to `tracing` and keeps the last failure for the report.
#[derive(Default)]
struct ReportingLogger {
    last: Mutex<Option<(String, &'static str)>>,
}

impl ReportingLogger {
    fn take(&self) -> Option<(String, &'static str)> {
        self.last.lock().ok().and_then(|mut last| last.take())
    }
}

impl FailureLogger for ReportingLogger {
    fn error(&self, message: &str, failure: &SchemaFailure) {
        TracingLogger.error(message, failure);
        if let Ok(mut last) = self.last.lock() {
            *last = Some((message.to_string(), failure.category.as_str()));
        }
    }
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let request = build_request(&args)?;
    let method = request.method().clone();
    let target = request.uri().to_string();

    let logger = Arc::new(ReportingLogger::default());
    let config = InterceptorConfig {
        strict: args.strict,
        ..InterceptorConfig::default()
    }
    .with_methods(&[method.clone()]);
    let stage = RequestValidationInterceptor::with_config(
        Arc::clone(&logger),
        config,
        SchemaSource::Path(args.schema.clone()),
    )
    .with_validator_config(ValidatorConfig {
        deny_unknown_properties: args.deny_unknown_properties,
        validate_parameters: !args.skip_parameters,
        ..ValidatorConfig::default()
    });
    let pipeline = Pipeline::new(Loopback).with_stage(stage);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))?;

    let blocked = match runtime.block_on(pipeline.send(request)) {
        Ok(_) => false,
        Err(PipelineError::Validation(_)) => true,
        Err(err) => return Err(pipeline_error("check failed", err)),
    };
    let failure = logger.take();

    let report = CheckReport {
        method: method.to_string(),
        target,
        strict: args.strict,
        valid: failure.is_none(),
        blocked,
        category: failure.as_ref().map(|(_, category)| *category),
        message: failure.map(|(message, _)| message),
    };
    print_check(&report, format);

    Ok(if report.blocked { DATA_INVALID } else { SUCCESS })
}

fn build_request(args: &CheckArgs) -> CliResult<Request> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|err| CliError::new(USAGE, format!("invalid method {:?}: {err}", args.method)))?;
    let uri: Uri = args
        .target
        .parse()
        .map_err(|err| CliError::new(USAGE, format!("invalid target {:?}: {err}", args.target)))?;

    let body = resolve_body(args)?;
    let has_body = !body.is_empty();
    let mut request = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .map_err(|err| CliError::new(USAGE, format!("invalid request: {err}")))?;

    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request.headers_mut().append(name, value);
    }
    if has_body && !request.headers().contains_key(CONTENT_TYPE) {
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(request)
}

fn resolve_body(args: &CheckArgs) -> CliResult<Bytes> {
    if let Some(body) = &args.body {
        return Ok(Bytes::from(body.clone()));
    }
    if let Some(path) = &args.body_file {
        return fs::read(path).map(Bytes::from).map_err(|err| {
            CliError::new(USAGE, format!("failed reading {}: {err}", path.display()))
        });
    }
    Ok(Bytes::new())
}

fn parse_header(raw: &str) -> CliResult<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| CliError::new(USAGE, format!("header must be NAME:VALUE, got {raw:?}")))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|err| CliError::new(USAGE, format!("invalid header name in {raw:?}: {err}")))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|err| CliError::new(USAGE, format!("invalid header value in {raw:?}: {err}")))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(target: &str) -> CheckArgs {
        CheckArgs {
            schema: PathBuf::from("openapi.yaml"),
            method: "post".to_string(),
            target: target.to_string(),
            headers: vec!["Accept-Language: de-DE".to_string()],
            body: Some("{}".to_string()),
            body_file: None,
            strict: false,
            deny_unknown_properties: false,
            skip_parameters: false,
        }
    }

    #[test]
    fn builds_request_with_default_content_type() {
        let request = build_request(&args("/orders?validate=true")).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().query(), Some("validate=true"));
        assert_eq!(request.headers()["accept-language"], "de-DE");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.body().as_ref(), b"{}");
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let mut args = args("/orders");
        args.headers.push("Content-Type: application/problem+json".to_string());
        let request = build_request(&args).unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/problem+json");
    }

    #[test]
    fn malformed_header_is_a_usage_error() {
        let err = parse_header("no-separator").unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_body_file_is_a_usage_error() {
        let mut args = args("/orders");
        args.body = None;
        args.body_file = Some(PathBuf::from("/nonexistent/reqguard/body.json"));
        assert_eq!(build_request(&args).unwrap_err().code, USAGE);
    }
}
