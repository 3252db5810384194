use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// One step of a [`Breadcrumb`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Ordered location of a mismatch inside a request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Breadcrumb(Vec<Segment>);

impl Breadcrumb {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Build a breadcrumb from a JSON Pointer into `document`.
    ///
    /// A token is an [`Segment::Index`] only when the value it is applied to
    /// is an array, so numeric object keys stay keys.
    pub fn from_pointer(pointer: &str, document: &Value) -> Self {
        let mut segments = Vec::new();
        let mut current = Some(document);

        for token in pointer.split('/').skip(1) {
            let token = token.replace("~1", "/").replace("~0", "~");
            match current {
                Some(Value::Array(items)) => match token.parse::<usize>() {
                    Ok(index) => {
                        current = items.get(index);
                        segments.push(Segment::Index(index));
                    }
                    Err(_) => {
                        current = None;
                        segments.push(Segment::Key(token));
                    }
                },
                Some(Value::Object(map)) => {
                    current = map.get(&token);
                    segments.push(Segment::Key(token));
                }
                _ => {
                    current = None;
                    segments.push(Segment::Key(token));
                }
            }
        }

        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove and return the innermost segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.0.pop()
    }

    /// Render back into a JSON Pointer.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.0 {
            pointer.push('/');
            match segment {
                Segment::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
                Segment::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }
}

impl FromIterator<Segment> for Breadcrumb {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Segment>> for Breadcrumb {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// What part of the request failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// No operation in the document matches the method and path.
    NoOperation,
    /// A path or query parameter is missing or malformed.
    Parameter,
    /// A header parameter is missing or malformed.
    Header,
    /// The body is missing, unparsable, or does not match its schema.
    Body,
    /// The body media type is not declared for the operation.
    ContentType,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::NoOperation => "no_operation",
            FailureCategory::Parameter => "parameter",
            FailureCategory::Header => "header",
            FailureCategory::Body => "body",
            FailureCategory::ContentType => "content_type",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural mismatch between a body value and its schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct SchemaMismatch {
    /// Constraint the value violated, as reported by the schema engine.
    pub message: String,
    /// Where in the body the offending value lives.
    pub breadcrumb: Breadcrumb,
    /// The offending value itself.
    pub value: Value,
}

/// Why a request failed validation.
#[derive(Debug, Clone)]
pub struct SchemaFailure {
    pub message: String,
    pub category: FailureCategory,
    pub mismatch: Option<SchemaMismatch>,
    pub cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl SchemaFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            mismatch: None,
            cause: None,
        }
    }

    /// Attach a located mismatch. The mismatch also becomes the cause.
    pub fn with_mismatch(mut self, mismatch: SchemaMismatch) -> Self {
        self.cause = Some(Arc::new(mismatch.clone()));
        self.mismatch = Some(mismatch);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }
}

impl fmt::Display for SchemaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.category)
    }
}

/// Result of running one request through the validator.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid,
    Invalid(SchemaFailure),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn failure(&self) -> Option<&SchemaFailure> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(failure) => Some(failure),
        }
    }
}
