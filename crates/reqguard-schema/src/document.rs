use std::io::Read;
use std::path::{Path, PathBuf};

use http::Method;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

pub(crate) const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A parsed OpenAPI 3 document. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    root: Value,
    openapi: String,
    title: String,
    version: String,
    base_paths: Vec<String>,
}

/// One method + path template pair declared by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRef {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
}

impl SchemaDocument {
    /// Parse a YAML document. JSON is accepted too, since it is valid YAML.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)?;
        Self::from_value(root)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content)?;
        Self::from_value(root)
    }

    /// Load a document from disk; `.json` files use the JSON parser, anything else YAML.
    pub fn from_path(path: &Path, max_bytes: usize) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| {
            SchemaError::LoadFailed(format!("failed opening {}: {err}", path.display()))
        })?;

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_bytes {
            return Err(SchemaError::LoadFailed(format!(
                "schema document too large (max {max_bytes} bytes): {}",
                path.display()
            )));
        }

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Wrap an already parsed document.
    pub fn from_value(root: Value) -> Result<Self> {
        let Value::Object(map) = &root else {
            return Err(SchemaError::InvalidDocument(
                "document root must be an object".to_string(),
            ));
        };

        let openapi = match map.get("openapi").and_then(scalar_text) {
            Some(version) if version.starts_with("3.") => version,
            Some(version) => {
                return Err(SchemaError::InvalidDocument(format!(
                    "unsupported openapi version {version}"
                )))
            }
            None => {
                return Err(SchemaError::InvalidDocument(
                    "missing `openapi` version field".to_string(),
                ))
            }
        };

        if !matches!(map.get("paths"), Some(Value::Object(_))) {
            return Err(SchemaError::InvalidDocument(
                "missing `paths` object".to_string(),
            ));
        }

        let info = map.get("info");
        let title = info
            .and_then(|info| info.get("title"))
            .and_then(scalar_text)
            .unwrap_or_default();
        let version = info
            .and_then(|info| info.get("version"))
            .and_then(scalar_text)
            .unwrap_or_default();
        let base_paths = collect_base_paths(map);

        Ok(Self {
            root,
            openapi,
            title,
            version,
            base_paths,
        })
    }

    /// The `openapi` version field, e.g. `3.0.3`.
    pub fn openapi(&self) -> &str {
        &self.openapi
    }

    /// API title from `info.title`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// API version from `info.version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Path prefixes taken from `servers[].url`, longest first.
    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }

    /// Resolve a local `#/...` reference, following chained references.
    pub(crate) fn resolve<'a>(&'a self, value: &'a Value) -> &'a Value {
        let mut current = value;
        // Bounded to stop reference cycles.
        for _ in 0..16 {
            match current
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|reference| reference.strip_prefix('#'))
                .and_then(|pointer| self.root.pointer(pointer))
            {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// Every operation declared under `paths`, sorted by path then method.
    pub fn operations(&self) -> Vec<OperationRef> {
        let mut operations = Vec::new();
        let Some(paths) = self.paths() else {
            return operations;
        };

        for (path, item) in paths {
            let item = self.resolve(item);
            for method in METHODS {
                let Some(operation) = item.get(method) else {
                    continue;
                };
                let Ok(parsed) = Method::from_bytes(method.to_ascii_uppercase().as_bytes()) else {
                    continue;
                };
                operations.push(OperationRef {
                    method: parsed,
                    path: path.clone(),
                    operation_id: operation
                        .get("operationId")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }

        operations.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        operations
    }
}

/// Where to load the schema document from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// A document compiled into the binary, typically via `include_str!`.
    Embedded(&'static str),
    /// A YAML or JSON file on disk.
    Path(PathBuf),
}

impl SchemaSource {
    pub fn load(&self, max_bytes: usize) -> Result<SchemaDocument> {
        match self {
            SchemaSource::Embedded(content) => SchemaDocument::from_yaml_str(content),
            SchemaSource::Path(path) => SchemaDocument::from_path(path, max_bytes),
        }
    }
}

// YAML reads `3.0` or `1.0` as numbers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn collect_base_paths(map: &Map<String, Value>) -> Vec<String> {
    let mut base_paths: Vec<String> = map
        .get("servers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|server| server.get("url").and_then(Value::as_str))
        .map(server_path)
        .filter(|path| !path.is_empty())
        .collect();

    base_paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    base_paths.dedup();
    base_paths
}

fn server_path(url: &str) -> String {
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => url,
    };
    without_scheme.trim_end_matches('/').to_string()
}
