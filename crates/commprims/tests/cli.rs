#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "commprims-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn commprims(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_commprims"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("commprims should run")
}

fn encode_raw(kind: &str, payload: &str, extra: &[&str]) -> Vec<u8> {
    let mut args = vec!["--format", "raw", "encode", "--kind", kind, "--payload", payload];
    args.extend_from_slice(extra);
    let output = commprims(&args);
    assert!(output.status.success(), "encode failed: {output:?}");
    output.stdout
}

#[test]
fn encode_raw_writes_wire_bytes() {
    let bytes = encode_raw("0x07", "01 02 03 04 05", &[]);
    assert_eq!(bytes, vec![0x21, 0x07, 0x01, 0x02, 0x03, 0x04, 0x05, 0x0A]);
}

#[test]
fn encode_json_describes_frame() {
    let output = commprims(&["--format", "json", "encode", "-k", "3", "-p", "aa bb"]);
    assert!(output.status.success());
    let line = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("json output");
    assert_eq!(value["kind"], 3);
    assert_eq!(value["payload"], "AA BB");
    assert!(value["schema_id"]
        .as_str()
        .is_some_and(|id| id.ends_with("frame.schema.json")));
}

#[test]
fn encode_rejects_bad_hex_with_usage_code() {
    let output = commprims(&["encode", "--kind", "1", "--payload", "zz"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not valid hex"));
}

#[test]
fn encode_rejects_equal_sentinels() {
    let output = commprims(&["encode", "-k", "1", "--header", "0x0A", "--trailer", "10"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn scan_recovers_misaligned_file() {
    let dir = unique_temp_dir("scan");
    let path = dir.join("stream.bin");

    let mut stream = vec![0x00, 0x5A, 0x13];
    for kind in ["1", "2", "3"] {
        stream.extend(encode_raw(kind, "10 20 30 40 50", &[]));
    }
    stream.extend([0x00; 5]);
    std::fs::write(&path, &stream).expect("stream file should be writable");

    let path_arg = path.to_string_lossy().into_owned();
    let output = commprims(&["--format", "json", "scan", &path_arg]);
    assert!(output.status.success(), "scan failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let kinds: Vec<u64> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["kind"].as_u64().expect("kind")
        })
        .collect();
    assert_eq!(kinds, vec![1, 2, 3]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_reads_stdin_with_checksum() {
    let mut stream = encode_raw("9", "01 02 03 04", &["--checksum"]);
    let mut corrupt = encode_raw("8", "01 02 03 04", &["--checksum"]);
    corrupt[3] ^= 0xFF;
    stream.extend(corrupt);
    stream.extend(encode_raw("7", "01 02 03 04", &["--checksum"]));

    let mut child = Command::new(env!("CARGO_BIN_EXE_commprims"))
        .args(["--log-level", "error", "--format", "pretty", "scan", "--checksum"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("scan should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&stream)
        .expect("stream should be written");
    let output = child.wait_with_output().expect("scan should finish");

    assert!(output.status.success(), "scan failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "corrupted frame must be skipped: {stdout}");
    assert!(lines[0].contains("kind=0x09"));
    assert!(lines[1].contains("kind=0x07"));
}

#[test]
fn scan_of_noise_exits_with_failure() {
    let dir = unique_temp_dir("noise");
    let path = dir.join("noise.bin");
    std::fs::write(&path, vec![0x55u8; 64]).expect("noise file should be writable");

    let path_arg = path.to_string_lossy().into_owned();
    let output = commprims(&["--format", "json", "scan", &path_arg]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_missing_file_reports_not_found() {
    let output = commprims(&["scan", "/nonexistent/commprims/stream.bin"]);
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn exchange_reports_monotonic_samples() {
    let output = commprims(&[
        "--format",
        "json",
        "exchange",
        "--count",
        "1000",
        "--samples",
        "10",
    ]);
    assert!(output.status.success(), "exchange failed: {output:?}");

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("exchange json output");
    assert_eq!(value["pushed"], 1000);
    assert_eq!(value["monotonic"], true);
    let samples = value["samples"].as_array().expect("samples array");
    assert_eq!(samples.len(), 10);
    assert!(samples
        .iter()
        .filter_map(|s| s.as_u64())
        .all(|v| v <= 999));
}

#[test]
fn version_prints_package_version() {
    let output = commprims(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("commprims {}", env!("CARGO_PKG_VERSION")));
}
