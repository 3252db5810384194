//! Closing object schemas so that unknown body fields are rejected.

use std::collections::HashSet;

use serde_json::{Map, Value};

const OBJECT_KEYWORDS: [&str; 5] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "required",
    "propertyNames",
];

const SCHEMA_MAPS: [&str; 3] = ["properties", "patternProperties", "dependentSchemas"];

const SCHEMA_SINGLES: [&str; 9] = [
    "propertyNames",
    "additionalProperties",
    "items",
    "contains",
    "additionalItems",
    "not",
    "if",
    "then",
    "else",
];

const SCHEMA_ARRAYS: [&str; 3] = ["prefixItems", "anyOf", "oneOf"];

/// Add `additionalProperties: false` to every object schema that leaves it unset.
///
/// `allOf` members are left open: each member only sees its own properties,
/// so closing them would reject fields contributed by their siblings.
pub(crate) fn close_object_schemas(value: &mut Value) {
    close(value, true);
}

/// Close the objects nested in `value` but leave `value` itself open.
///
/// Used for shared schemas that are pulled into an `allOf` by `$ref`.
pub(crate) fn close_nested_schemas(value: &mut Value) {
    close(value, false);
}

/// Every `$ref` used directly as an `allOf` member anywhere in `document`.
pub(crate) fn all_of_targets(document: &Value) -> HashSet<String> {
    let mut targets = HashSet::new();
    collect_all_of_targets(document, &mut targets);
    targets
}

fn collect_all_of_targets(value: &Value, targets: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(members)) = map.get("allOf") {
                targets.extend(
                    members
                        .iter()
                        .filter_map(|member| member.get("$ref"))
                        .filter_map(Value::as_str)
                        .map(str::to_string),
                );
            }
            for child in map.values() {
                collect_all_of_targets(child, targets);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_all_of_targets(item, targets);
            }
        }
        _ => {}
    }
}

fn close(value: &mut Value, closable: bool) {
    match value {
        Value::Object(map) => {
            if closable
                && is_object_schema(map)
                && !map.contains_key("additionalProperties")
                && !map.contains_key("allOf")
                && !map.contains_key("$ref")
            {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }

            for key in SCHEMA_MAPS {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    for child in children.values_mut() {
                        close(child, true);
                    }
                }
            }
            for key in SCHEMA_SINGLES {
                if let Some(child) = map.get_mut(key) {
                    close(child, true);
                }
            }
            for key in SCHEMA_ARRAYS {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    for child in children {
                        close(child, true);
                    }
                }
            }
            if let Some(Value::Array(members)) = map.get_mut("allOf") {
                for member in members {
                    close(member, false);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                close(item, closable);
            }
        }
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds
            .iter()
            .any(|kind| matches!(kind, Value::String(kind) if kind == "object")),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}
