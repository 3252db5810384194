#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{json, Value};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../reqguard-schema/tests/fixtures/shipping.yaml")
}

fn order_body(weight: i64) -> String {
    let address = json!({
        "name1": "Maria Musterfrau",
        "addressStreet": "Kurt-Schumacher-Str. 20",
        "postalCode": "53113",
        "city": "Bonn",
        "country": "DEU"
    });
    json!({
        "shipments": [{
            "product": "V01PAK",
            "billingNumber": "33333333330102",
            "shipper": address,
            "consignee": address,
            "details": { "weight": { "uom": "g", "value": weight } }
        }]
    })
    .to_string()
}

fn reqguard(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reqguard"))
        .args(["--log-level", "off", "--format", "json"])
        .args(args)
        .env_remove("REQGUARD_SCHEMA")
        .output()
        .expect("reqguard should run")
}

fn check(weight: i64, strict: bool) -> Output {
    let schema = fixture();
    let body = order_body(weight);
    let mut args = vec![
        "check",
        "--schema",
        schema.to_str().expect("fixture path should be UTF-8"),
        "https://api.example.com/parcel/de/shipping/v2/orders",
        "-H",
        "Accept-Language: de-DE",
        "--body",
        &body,
    ];
    if strict {
        args.push("--strict");
    }
    reqguard(&args)
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn valid_request_passes() {
    let output = check(500, true);
    assert_eq!(output.status.code(), Some(0));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], true);
    assert_eq!(report["blocked"], false);
    assert!(report.get("message").is_none());
}

#[test]
fn strict_invalid_request_exits_60() {
    let output = check(-5, true);
    assert_eq!(output.status.code(), Some(60));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], false);
    assert_eq!(report["blocked"], true);
    assert_eq!(report["category"], "body");
    assert_eq!(
        report["message"],
        "-5 is less than the minimum of 0. Value: \"-5\". Path: \"shipments[0].details.weight.value\""
    );
}

#[test]
fn lenient_invalid_request_is_reported_but_passes() {
    let output = check(-5, false);
    assert_eq!(output.status.code(), Some(0));

    let report = stdout_json(&output);
    assert_eq!(report["valid"], false);
    assert_eq!(report["blocked"], false);
}

#[test]
fn operations_are_listed() {
    let schema = fixture();
    let output = reqguard(&[
        "operations",
        "--schema",
        schema.to_str().expect("fixture path should be UTF-8"),
    ]);
    assert!(output.status.success());

    let listed = stdout_json(&output);
    let ids: Vec<&str> = listed
        .as_array()
        .expect("operations should be an array")
        .iter()
        .filter_map(|op| op["operation_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["createManifest", "cancelOrder", "createOrders", "getLabel"]);
}

#[test]
fn missing_schema_file_fails() {
    let output = reqguard(&[
        "check",
        "--schema",
        "/nonexistent/reqguard/shipping.yaml",
        "/orders",
        "--body",
        "{}",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load schema"));
}

#[test]
fn version_prints_package_version() {
    let output = reqguard(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("reqguard {}", env!("CARGO_PKG_VERSION"))
    );
}
