use http::Method;

/// Policy of the request validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorConfig {
    /// When true, invalid requests are rejected instead of only logged.
    pub strict: bool,
    /// Methods whose requests are validated. Others pass through untouched.
    pub validated_methods: Vec<Method>,
}

impl InterceptorConfig {
    /// Reject invalid requests.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Log invalid requests and send them anyway.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Replace the set of validated methods.
    pub fn with_methods(mut self, methods: &[Method]) -> Self {
        self.validated_methods = methods.to_vec();
        self
    }

    pub fn validates(&self, method: &Method) -> bool {
        self.validated_methods.contains(method)
    }
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            strict: false,
            validated_methods: vec![Method::POST],
        }
    }
}
