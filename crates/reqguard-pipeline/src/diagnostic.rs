//! Human-readable rendering of validation failures.

use std::fmt::Write;

use reqguard_schema::{Breadcrumb, SchemaFailure, Segment};
use serde_json::Value;

/// Render the message logged and raised for a failed validation.
///
/// Located body mismatches become
/// `<mismatch>. Value: "<value>". Path: "<path>"`; every other failure keeps
/// its raw message. Objects and arrays are rendered as compact JSON and the
/// last breadcrumb segment, which names the rendered value itself, is dropped.
pub fn render_diagnostic(failure: &SchemaFailure) -> Result<String, serde_json::Error> {
    let Some(mismatch) = &failure.mismatch else {
        return Ok(failure.message.clone());
    };

    let mut breadcrumb = mismatch.breadcrumb.clone();
    let value = match &mismatch.value {
        Value::Object(_) | Value::Array(_) => {
            breadcrumb.pop();
            render_structured(&mismatch.value)?
        }
        Value::String(text) => text.clone(),
        Value::Number(number) => render_number(number),
        scalar => scalar.to_string(),
    };

    Ok(format!(
        "{}. Value: \"{value}\". Path: \"{}\"",
        mismatch.message,
        render_path(&breadcrumb)
    ))
}

/// `["items", 2, "weight"]` renders as `items[2].weight`.
pub fn render_path(breadcrumb: &Breadcrumb) -> String {
    let mut path = String::new();
    for segment in breadcrumb.segments() {
        match segment {
            Segment::Key(key) => {
                path.push('.');
                path.push_str(key);
            }
            Segment::Index(index) => {
                let _ = write!(path, "[{index}]");
            }
        }
    }
    path.trim_matches('.').to_string()
}

// Whole floats drop the fraction, so `2.0` reads as `2`.
fn render_number(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.is_finite() && float.fract() == 0.0 => {
            format!("{float:.0}")
        }
        _ => number.to_string(),
    }
}

fn render_structured<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use reqguard_schema::{FailureCategory, SchemaMismatch};
    use serde_json::json;

    use super::*;

    fn located(message: &str, segments: Vec<Segment>, value: Value) -> SchemaFailure {
        SchemaFailure::new(FailureCategory::Body, "Body does not match schema").with_mismatch(
            SchemaMismatch {
                message: message.to_string(),
                breadcrumb: Breadcrumb::new(segments),
                value,
            },
        )
    }

    #[test]
    fn scalar_value_keeps_full_path() {
        let failure = located(
            "-5 is less than the minimum of 0",
            vec![Segment::from("items"), Segment::Index(2), Segment::from("weight")],
            json!(-5),
        );
        assert_eq!(
            render_diagnostic(&failure).unwrap(),
            "-5 is less than the minimum of 0. Value: \"-5\". Path: \"items[2].weight\""
        );
    }

    #[test]
    fn structured_value_drops_last_segment() {
        let failure = located(
            "\"abc\" does not match \"^[0-9]{5}$\"",
            vec![Segment::from("shipper"), Segment::from("address")],
            json!({"zip": "abc"}),
        );
        assert_eq!(
            render_diagnostic(&failure).unwrap(),
            "\"abc\" does not match \"^[0-9]{5}$\". Value: \"{\"zip\":\"abc\"}\". Path: \"shipper\""
        );
    }

    #[test]
    fn strings_are_rendered_unquoted() {
        let failure = located(
            "\"V99\" is not one of [\"V01PAK\"]",
            vec![Segment::from("shipments"), Segment::Index(0), Segment::from("product")],
            json!("V99"),
        );
        assert_eq!(
            render_diagnostic(&failure).unwrap(),
            "\"V99\" is not one of [\"V01PAK\"]. Value: \"V99\". Path: \"shipments[0].product\""
        );
    }

    #[test]
    fn arrays_are_structured_too() {
        let failure = located(
            "[] has less than 1 item",
            vec![Segment::from("shipments")],
            json!([]),
        );
        assert_eq!(
            render_diagnostic(&failure).unwrap(),
            "[] has less than 1 item. Value: \"[]\". Path: \"\""
        );
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        let whole = located("too heavy", vec![Segment::from("w")], json!(2.0));
        assert_eq!(
            render_diagnostic(&whole).unwrap(),
            "too heavy. Value: \"2\". Path: \"w\""
        );
        let fractional = located("too heavy", vec![Segment::from("w")], json!(2.5));
        assert_eq!(
            render_diagnostic(&fractional).unwrap(),
            "too heavy. Value: \"2.5\". Path: \"w\""
        );
    }

    #[test]
    fn booleans_and_null_use_json_text() {
        let flag = located("flag", vec![Segment::from("a")], json!(false));
        assert_eq!(
            render_diagnostic(&flag).unwrap(),
            "flag. Value: \"false\". Path: \"a\""
        );
        let null = located("null", vec![Segment::from("b")], Value::Null);
        assert_eq!(
            render_diagnostic(&null).unwrap(),
            "null. Value: \"null\". Path: \"b\""
        );
    }

    #[test]
    fn unlocated_failure_keeps_raw_message() {
        let failure = SchemaFailure::new(
            FailureCategory::NoOperation,
            "OpenAPI spec contains no such operation [/x,post]",
        );
        assert_eq!(
            render_diagnostic(&failure).unwrap(),
            "OpenAPI spec contains no such operation [/x,post]"
        );
    }

    #[test]
    fn path_rendering_trims_dots() {
        assert_eq!(render_path(&Breadcrumb::default()), "");
        assert_eq!(
            render_path(&Breadcrumb::new(vec![Segment::Index(0), Segment::from("a")])),
            "[0].a"
        );
        assert_eq!(render_path(&Breadcrumb::new(vec![Segment::from("a")])), "a");
    }

    #[test]
    fn unserializable_values_surface_an_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), 3);
        assert!(render_structured(&map).is_err());
    }
}
