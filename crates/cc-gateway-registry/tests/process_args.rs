//! Runs the chaincode binary the way a node would spawn it.

#![cfg(unix)]

use serde_json::Value;
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::process::Command;

#[test]
fn test_non_utf8_argument_exits_with_validation_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_gateway-registry"))
        .env("CHAINCODE_LEDGER_ADDRESS", "http://127.0.0.1:1")
        .env("CHAINCODE_FUNCTION", "getGateway")
        .env_remove("CHAINCODE_POINT_TIMEOUT_MS")
        .env_remove("CHAINCODE_RANGE_TIMEOUT_MS")
        .env_remove("CHAINCODE_PAGE_SIZE")
        .arg(OsString::from_vec(vec![0x67, 0xff, 0x77]))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let summary: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(summary["status"], 500);
    assert_eq!(summary["kind"], "validation");
}
