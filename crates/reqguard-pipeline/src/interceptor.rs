use std::sync::Arc;

use once_cell::sync::OnceCell;
use reqguard_schema::{
    RequestValidator, SchemaError, SchemaSource, ValidationOutcome, ValidatorConfig,
};

use crate::config::InterceptorConfig;
use crate::diagnostic::render_diagnostic;
use crate::error::{PipelineError, ValidationError};
use crate::logger::FailureLogger;
use crate::pipeline::{Next, Request, Stage, StageFuture};

/// Pipeline stage that checks outgoing requests against an OpenAPI document.
///
/// Every failure is logged once. In strict mode the request is then rejected
/// with [`PipelineError::Validation`] and never reaches the rest of the
/// pipeline; in lenient mode it is forwarded unchanged.
///
/// The validator is compiled on the first validated request and reused for
/// the lifetime of the stage, so one instance can serve concurrent requests.
pub struct RequestValidationInterceptor {
    logger: Arc<dyn FailureLogger>,
    config: InterceptorConfig,
    source: Option<SchemaSource>,
    validator_config: ValidatorConfig,
    validator: OnceCell<Arc<RequestValidator>>,
}

impl RequestValidationInterceptor {
    /// Validate `POST` requests against the document at `source`.
    pub fn new(logger: impl FailureLogger + 'static, strict: bool, source: SchemaSource) -> Self {
        let config = InterceptorConfig {
            strict,
            ..InterceptorConfig::default()
        };
        Self::with_config(logger, config, source)
    }

    pub fn with_config(
        logger: impl FailureLogger + 'static,
        config: InterceptorConfig,
        source: SchemaSource,
    ) -> Self {
        Self {
            logger: Arc::new(logger),
            config,
            source: Some(source),
            validator_config: ValidatorConfig::default(),
            validator: OnceCell::new(),
        }
    }

    /// Use an already compiled validator, typically shared between stages.
    pub fn with_validator(
        logger: impl FailureLogger + 'static,
        config: InterceptorConfig,
        validator: Arc<RequestValidator>,
    ) -> Self {
        let validator_config = *validator.config();
        Self {
            logger: Arc::new(logger),
            config,
            source: None,
            validator_config,
            validator: OnceCell::with_value(validator),
        }
    }

    /// Options used when the validator is compiled lazily.
    pub fn with_validator_config(mut self, validator_config: ValidatorConfig) -> Self {
        self.validator_config = validator_config;
        self
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    pub fn is_strict(&self) -> bool {
        self.config.strict
    }

    fn validator(&self) -> Result<&Arc<RequestValidator>, SchemaError> {
        self.validator.get_or_try_init(|| {
            let source = self.source.as_ref().ok_or_else(|| {
                SchemaError::LoadFailed("no schema source configured".to_string())
            })?;
            let document = source.load(self.validator_config.max_document_size)?;
            tracing::debug!(
                title = document.title(),
                version = document.version(),
                "compiling request validator"
            );
            let validator = RequestValidator::new(Arc::new(document), self.validator_config)?;
            Ok(Arc::new(validator))
        })
    }

    /// Validate `request`, returning it when it may continue down the pipeline.
    fn check(&self, request: Request) -> Result<Request, PipelineError> {
        let validator = self.validator()?;
        let outcome = validator.validate_request(
            request.method(),
            request.uri(),
            request.headers(),
            request.body(),
        );

        let failure = match outcome {
            ValidationOutcome::Valid => {
                tracing::debug!(method = %request.method(), uri = %request.uri(), "request valid");
                return Ok(request);
            }
            ValidationOutcome::Invalid(failure) => failure,
        };

        let message = match render_diagnostic(&failure) {
            Ok(message) => message,
            Err(err) => {
                self.logger.error(&failure.message, &failure);
                return Err(PipelineError::DiagnosticRendering(err));
            }
        };
        self.logger.error(&message, &failure);

        if self.config.strict {
            return Err(ValidationError::new(message, request, failure.cause).into());
        }
        Ok(request)
    }
}

impl Stage for RequestValidationInterceptor {
    fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> StageFuture<'a> {
        Box::pin(async move {
            if !self.config.validates(request.method()) {
                return next.run(request).await;
            }
            let request = self.check(request)?;
            next.run(request).await
        })
    }
}

impl std::fmt::Debug for RequestValidationInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidationInterceptor")
            .field("config", &self.config)
            .field("source", &self.source)
            .field("compiled", &self.validator.get().is_some())
            .finish()
    }
}
