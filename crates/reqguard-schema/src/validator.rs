use std::borrow::Cow;
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Uri};
use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};

use crate::config::ValidatorConfig;
use crate::document::{SchemaDocument, METHODS};
use crate::error::{Result, SchemaError};
use crate::outcome::{Breadcrumb, FailureCategory, SchemaFailure, SchemaMismatch, ValidationOutcome};
use crate::routing::{candidate_paths, PathTemplate};
use crate::strict::{all_of_targets, close_nested_schemas, close_object_schemas};

// Header parameters with these names are ignored by OpenAPI.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Path,
    Query,
    Header,
    Cookie,
}

impl Location {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(Location::Path),
            "query" => Some(Location::Query),
            "header" => Some(Location::Header),
            "cookie" => Some(Location::Cookie),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        }
    }

    fn category(self) -> FailureCategory {
        match self {
            Location::Header => FailureCategory::Header,
            _ => FailureCategory::Parameter,
        }
    }
}

struct Parameter {
    name: String,
    location: Location,
    required: bool,
    schema: Option<Value>,
    validator: Option<Validator>,
}

struct MediaType {
    name: String,
    validator: Option<Validator>,
}

struct RequestBody {
    required: bool,
    media_types: Vec<MediaType>,
}

struct Route {
    template: PathTemplate,
    method: Method,
    parameters: Vec<Parameter>,
    body: Option<RequestBody>,
}

/// Validates outbound requests against the operations of a [`SchemaDocument`].
///
/// All request schemas are compiled once, in [`RequestValidator::new`]. The
/// validator is immutable afterwards and can be shared across threads.
pub struct RequestValidator {
    document: Arc<SchemaDocument>,
    config: ValidatorConfig,
    routes: Vec<Route>,
}

impl RequestValidator {
    /// Compile a validator for every operation in the document.
    pub fn new(document: Arc<SchemaDocument>, config: ValidatorConfig) -> Result<Self> {
        let compiler = Compiler::new(&document, config);
        let mut routes = Vec::new();

        if let Some(paths) = document.paths() {
            for (raw_path, item) in paths {
                let item = document.resolve(item);
                let shared_parameters = item.get("parameters");

                for method_name in METHODS {
                    let Some(operation) = item.get(method_name) else {
                        continue;
                    };
                    let Ok(method) = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes())
                    else {
                        continue;
                    };
                    let label = format!("[{raw_path},{method_name}]");

                    let parameters = compiler.parameters(
                        &label,
                        shared_parameters,
                        operation.get("parameters"),
                    )?;
                    let body = match operation.get("requestBody") {
                        Some(body) => Some(compiler.request_body(&label, body)?),
                        None => None,
                    };

                    routes.push(Route {
                        template: PathTemplate::parse(raw_path),
                        method,
                        parameters,
                        body,
                    });
                }
            }
        }

        tracing::debug!(
            title = document.title(),
            version = document.version(),
            operations = routes.len(),
            "compiled request validators"
        );

        Ok(Self {
            document,
            config,
            routes,
        })
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate an `http::Request` whose body is available as bytes.
    pub fn validate<B: AsRef<[u8]>>(&self, request: &http::Request<B>) -> ValidationOutcome {
        self.validate_request(
            request.method(),
            request.uri(),
            request.headers(),
            request.body().as_ref(),
        )
    }

    /// Validate one request: operation lookup, parameters, then body.
    pub fn validate_request(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: &[u8],
    ) -> ValidationOutcome {
        let path = uri.path();
        let request_label = format!("Request [{} {path}]", method.as_str().to_ascii_lowercase());

        let Some((route, captures)) = self.find_route(method, path) else {
            return ValidationOutcome::Invalid(SchemaFailure::new(
                FailureCategory::NoOperation,
                format!(
                    "OpenAPI spec contains no such operation [{path},{}]",
                    method.as_str().to_ascii_lowercase()
                ),
            ));
        };

        if self.config.validate_parameters {
            if let Some(failure) =
                check_parameters(route, &captures, uri.query(), headers, &request_label)
            {
                return ValidationOutcome::Invalid(failure);
            }
        }

        match &route.body {
            Some(declared) => match check_body(declared, headers, body, &request_label) {
                Some(failure) => ValidationOutcome::Invalid(failure),
                None => ValidationOutcome::Valid,
            },
            None => ValidationOutcome::Valid,
        }
    }

    fn find_route(&self, method: &Method, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        let mut best: Option<(&Route, Vec<(String, String)>)> = None;

        for candidate in candidate_paths(path, self.document.base_paths()) {
            for route in self.routes.iter().filter(|route| &route.method == method) {
                let Some(captures) = route.template.captures(candidate) else {
                    continue;
                };
                let better = match &best {
                    Some((current, _)) => {
                        route.template.specificity() > current.template.specificity()
                    }
                    None => true,
                };
                if better {
                    best = Some((route, captures));
                }
            }
        }

        if let Some((route, _)) = &best {
            tracing::trace!(template = route.template.raw(), %method, path, "matched operation");
        }
        best
    }
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("title", &self.document.title())
            .field("version", &self.document.version())
            .field("operations", &self.routes.len())
            .field("config", &self.config)
            .finish()
    }
}

fn check_parameters(
    route: &Route,
    captures: &[(String, String)],
    query: Option<&str>,
    headers: &HeaderMap,
    request_label: &str,
) -> Option<SchemaFailure> {
    let query_pairs = parse_query(query.unwrap_or_default());

    for parameter in &route.parameters {
        let raw: Option<Cow<'_, str>> = match parameter.location {
            Location::Path => captures
                .iter()
                .find(|(name, _)| name == &parameter.name)
                .map(|(_, value)| Cow::Borrowed(value.as_str())),
            Location::Query => query_pairs
                .iter()
                .find(|(name, _)| name == &parameter.name)
                .map(|(_, value)| Cow::Borrowed(value.as_str())),
            Location::Header => headers
                .get(parameter.name.as_str())
                .map(|value| String::from_utf8_lossy(value.as_bytes())),
            Location::Cookie => continue,
        };

        let Some(raw) = raw else {
            if parameter.required {
                return Some(SchemaFailure::new(
                    parameter.location.category(),
                    format!(
                        "Missing required {} parameter \"{}\" for {request_label}",
                        parameter.location.as_str(),
                        parameter.name
                    ),
                ));
            }
            continue;
        };

        let Some(validator) = &parameter.validator else {
            continue;
        };
        let value = coerce_parameter(&raw, parameter.schema.as_ref());
        let first_error = validator.iter_errors(&value).next().map(|error| error.to_string());
        if let Some(message) = first_error {
            return Some(
                SchemaFailure::new(
                    parameter.location.category(),
                    format!(
                        "Value \"{raw}\" for {} parameter \"{}\" is invalid for {request_label}: {message}",
                        parameter.location.as_str(),
                        parameter.name
                    ),
                ),
            );
        }
    }

    None
}

fn check_body(
    declared: &RequestBody,
    headers: &HeaderMap,
    body: &[u8],
    request_label: &str,
) -> Option<SchemaFailure> {
    if body.is_empty() {
        if declared.required {
            return Some(SchemaFailure::new(
                FailureCategory::Body,
                format!("Required body is missing for {request_label}"),
            ));
        }
        return None;
    }

    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(essence)
    else {
        return Some(SchemaFailure::new(
            FailureCategory::ContentType,
            format!("Missing Content-Type header for {request_label}"),
        ));
    };

    let Some(media) = select_media_type(&declared.media_types, &content_type) else {
        return Some(SchemaFailure::new(
            FailureCategory::ContentType,
            format!("Content-Type \"{content_type}\" is not expected for {request_label}"),
        ));
    };

    if !is_json_media(&content_type) {
        return None;
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            return Some(
                SchemaFailure::new(
                    FailureCategory::Body,
                    format!("JSON parsing failed with \"{err}\" for {request_label}"),
                )
                .with_cause(err),
            )
        }
    };

    let validator = media.validator.as_ref()?;
    let mut errors = validator.iter_errors(&value);
    let first = errors.next()?;
    let pointer = first.instance_path.to_string();
    let message = first.to_string();
    let remaining = errors.count();
    if remaining > 0 {
        tracing::debug!(remaining, "further body mismatches not reported");
    }

    let mismatch = SchemaMismatch {
        message,
        breadcrumb: Breadcrumb::from_pointer(&pointer, &value),
        value: value.pointer(&pointer).cloned().unwrap_or(Value::Null),
    };

    Some(
        SchemaFailure::new(
            FailureCategory::Body,
            format!(
                "Body does not match schema for content-type \"{content_type}\" for {request_label}"
            ),
        )
        .with_mismatch(mismatch),
    )
}

/// Lowercased media type without parameters, e.g. `application/json`.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn select_media_type<'a>(media_types: &'a [MediaType], content_type: &str) -> Option<&'a MediaType> {
    let wildcard = content_type
        .split_once('/')
        .map(|(kind, _)| format!("{kind}/*"));

    media_types
        .iter()
        .find(|media| media.name == content_type)
        .or_else(|| {
            wildcard
                .as_deref()
                .and_then(|wildcard| media_types.iter().find(|media| media.name == wildcard))
        })
        .or_else(|| media_types.iter().find(|media| media.name == "*/*"))
}

fn is_json_media(name: &str) -> bool {
    name == "application/json" || name.ends_with("+json")
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    }
}

/// Turn a raw parameter string into the JSON type its schema expects.
fn coerce_parameter(raw: &str, schema: Option<&Value>) -> Value {
    let kind = schema.and_then(|schema| schema.get("type")).and_then(Value::as_str);
    match kind {
        Some("integer") => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        Some("array") => {
            let items = schema.and_then(|schema| schema.get("items"));
            Value::Array(
                raw.split(',')
                    .map(|item| coerce_parameter(item, items))
                    .collect(),
            )
        }
        _ => Value::String(raw.to_string()),
    }
}

/// Builds `jsonschema` validators for schemas embedded in the document.
struct Compiler<'a> {
    document: &'a SchemaDocument,
    config: ValidatorConfig,
    legacy: bool,
    components: Value,
}

impl<'a> Compiler<'a> {
    fn new(document: &'a SchemaDocument, config: ValidatorConfig) -> Self {
        // OpenAPI 3.0 schemas follow JSON Schema draft 4; 3.1 aligns with 2020-12.
        let legacy = !document.openapi().starts_with("3.1");

        let mut components = document
            .root()
            .get("components")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        if legacy {
            lift_nullable(&mut components);
        }
        if config.deny_unknown_properties {
            let composed = all_of_targets(document.root());
            if let Some(Value::Object(schemas)) = components.get_mut("schemas") {
                for (name, schema) in schemas.iter_mut() {
                    if composed.contains(&format!("#/components/schemas/{name}")) {
                        close_nested_schemas(schema);
                    } else {
                        close_object_schemas(schema);
                    }
                }
            }
        }

        Self {
            document,
            config,
            legacy,
            components,
        }
    }

    /// Compile `schema` with the document components reachable through `#/components/...`.
    fn compile(&self, label: &str, schema: &Value, close: bool) -> Result<Validator> {
        let mut root = schema.clone();
        if self.legacy {
            lift_nullable(&mut root);
        }
        if close && self.config.deny_unknown_properties {
            close_object_schemas(&mut root);
        }
        if let Value::Object(map) = &mut root {
            map.insert("components".to_string(), self.components.clone());
        } else {
            // Boolean schemas cannot carry the components container.
            root = serde_json::json!({ "allOf": [root], "components": self.components.clone() });
        }

        let mut options = jsonschema::options();
        options.with_draft(if self.legacy {
            Draft::Draft4
        } else {
            Draft::Draft202012
        });
        options
            .build(&root)
            .map_err(|err| SchemaError::CompileFailed {
                operation: label.to_string(),
                message: err.to_string(),
            })
    }

    fn parameters(
        &self,
        label: &str,
        shared: Option<&Value>,
        own: Option<&Value>,
    ) -> Result<Vec<Parameter>> {
        let mut declared: Vec<&Value> = Vec::new();
        for list in [shared, own].into_iter().flatten() {
            for raw in list.as_array().into_iter().flatten() {
                let parameter = self.document.resolve(raw);
                let key = parameter_key(parameter);
                // Operation-level parameters override path-level ones.
                declared.retain(|existing| parameter_key(existing) != key);
                declared.push(parameter);
            }
        }

        let mut parameters = Vec::new();
        for parameter in declared {
            let Some(name) = parameter.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(location) = parameter
                .get("in")
                .and_then(Value::as_str)
                .and_then(Location::parse)
            else {
                continue;
            };
            if location == Location::Header
                && RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str())
            {
                continue;
            }

            let schema = parameter
                .get("schema")
                .map(|schema| self.document.resolve(schema).clone());
            let validator = match &schema {
                Some(schema) => Some(self.compile(label, schema, false)?),
                None => None,
            };

            parameters.push(Parameter {
                name: name.to_string(),
                location,
                required: location == Location::Path
                    || parameter
                        .get("required")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                schema,
                validator,
            });
        }

        Ok(parameters)
    }

    fn request_body(&self, label: &str, body: &Value) -> Result<RequestBody> {
        let body = self.document.resolve(body);
        let mut media_types = Vec::new();

        if let Some(content) = body.get("content").and_then(Value::as_object) {
            for (name, media) in content {
                let name = name.to_ascii_lowercase();
                let checkable = is_json_media(&name) || name.ends_with("/*");
                let validator = match media.get("schema") {
                    Some(schema) if checkable => Some(self.compile(label, schema, true)?),
                    _ => None,
                };
                media_types.push(MediaType { name, validator });
            }
        }

        Ok(RequestBody {
            required: body
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            media_types,
        })
    }
}

fn parameter_key(parameter: &Value) -> (Option<&str>, Option<&str>) {
    (
        parameter.get("name").and_then(Value::as_str),
        parameter.get("in").and_then(Value::as_str),
    )
}

/// Rewrite OpenAPI 3.0 `nullable: true` into a `"null"` type member.
fn lift_nullable(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("nullable") == Some(&Value::Bool(true)) {
                match map.get_mut("type") {
                    Some(Value::String(kind)) => {
                        let kind = Value::String(std::mem::take(kind));
                        map.insert(
                            "type".to_string(),
                            Value::Array(vec![kind, Value::String("null".to_string())]),
                        );
                    }
                    Some(Value::Array(kinds)) => {
                        let null = Value::String("null".to_string());
                        if !kinds.contains(&null) {
                            kinds.push(null);
                        }
                    }
                    _ => {}
                }
                if let Some(Value::Array(options)) = map.get_mut("enum") {
                    if !options.contains(&Value::Null) {
                        options.push(Value::Null);
                    }
                }
            }
            for child in map.values_mut() {
                lift_nullable(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                lift_nullable(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
    }

    #[test]
    fn media_type_selection_prefers_exact() {
        let media_types = vec![
            MediaType {
                name: "*/*".to_string(),
                validator: None,
            },
            MediaType {
                name: "application/*".to_string(),
                validator: None,
            },
            MediaType {
                name: "application/json".to_string(),
                validator: None,
            },
        ];

        let exact = select_media_type(&media_types, "application/json").unwrap();
        assert_eq!(exact.name, "application/json");
        let wildcard = select_media_type(&media_types, "application/pdf").unwrap();
        assert_eq!(wildcard.name, "application/*");
        let any = select_media_type(&media_types, "text/plain").unwrap();
        assert_eq!(any.name, "*/*");
    }

    #[test]
    fn coerces_parameters_by_schema_type() {
        assert_eq!(coerce_parameter("12", Some(&json!({"type": "integer"}))), json!(12));
        assert_eq!(coerce_parameter("1.5", Some(&json!({"type": "number"}))), json!(1.5));
        assert_eq!(coerce_parameter("true", Some(&json!({"type": "boolean"}))), json!(true));
        assert_eq!(
            coerce_parameter("abc", Some(&json!({"type": "integer"}))),
            json!("abc")
        );
        assert_eq!(
            coerce_parameter("1,2", Some(&json!({"type": "array", "items": {"type": "integer"}}))),
            json!([1, 2])
        );
        assert_eq!(coerce_parameter("x", None), json!("x"));
    }

    #[test]
    fn query_components_are_decoded() {
        assert_eq!(
            parse_query("docFormat=PDF&note=a+b%21&flag"),
            vec![
                ("docFormat".to_string(), "PDF".to_string()),
                ("note".to_string(), "a b!".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn nullable_becomes_null_type() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "name2": {"type": "string", "nullable": true},
                "kind": {"type": "string", "enum": ["A", "B"], "nullable": true}
            }
        });
        lift_nullable(&mut schema);
        assert_eq!(schema["properties"]["name2"]["type"], json!(["string", "null"]));
        assert_eq!(schema["properties"]["kind"]["enum"], json!(["A", "B", null]));
        assert_eq!(schema["type"], json!("object"));
    }
}
