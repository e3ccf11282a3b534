//! Runs the binary on inputs that are rejected before any network call.

use serde_json::Value;
use std::process::Command;

fn predict(symbol: &str, interval: &str) -> (bool, Value) {
    let output = Command::new(env!("CARGO_BIN_EXE_market-pulse"))
        .args([
            "predict",
            "--symbol",
            symbol,
            "--interval",
            interval,
            "--config",
            "does-not-exist.toml",
        ])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8(output.stdout).expect("stdout is not utf-8");
    let envelope: Value = serde_json::from_str(stdout.trim()).expect("stdout is not JSON");
    (output.status.success(), envelope)
}

#[test]
fn test_invalid_symbol_prints_error_envelope() {
    let (ok, envelope) = predict("../etc", "5m");

    assert!(!ok);
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["code"], "INVALID_SYMBOL");
    assert!(envelope["timestamp"].is_string());
}

#[test]
fn test_invalid_interval_prints_error_envelope() {
    let (ok, envelope) = predict("AAPL", "2h");

    assert!(!ok);
    assert_eq!(envelope["code"], "INVALID_INTERVAL");
    assert!(envelope["error"].as_str().unwrap().contains("2h"));
}
