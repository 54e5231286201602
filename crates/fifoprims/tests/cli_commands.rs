#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/fifocli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn fifoprims() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fifoprims"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn create(path: &Path) -> Output {
    fifoprims()
        .arg("--format")
        .arg("json")
        .arg("create")
        .arg(path)
        .output()
        .expect("create should run")
}

#[test]
fn create_info_unlink_lifecycle() {
    let dir = unique_temp_dir("lifecycle");
    let path = dir.join("nested/deeper/chan.fifo");

    let output = create(&path);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"is_fifo\":true"));

    // Creating again reuses the existing pipe.
    assert!(create(&path).status.success());

    let output = fifoprims()
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg(&path)
        .output()
        .expect("info should run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"exists\":true"));

    let output = fifoprims()
        .arg("unlink")
        .arg(&path)
        .output()
        .expect("unlink should run");
    assert!(output.status.success());
    assert!(!path.exists());

    let output = fifoprims()
        .arg("--format")
        .arg("json")
        .arg("info")
        .arg(&path)
        .output()
        .expect("info should run");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"exists\":false"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn produce_and_consume_exchange_elements() {
    let dir = unique_temp_dir("exchange");
    let path = dir.join("chan.fifo");
    assert!(create(&path).status.success());

    let consumer = fifoprims()
        .arg("--format")
        .arg("raw")
        .arg("consume")
        .arg(&path)
        .arg("--size")
        .arg("4")
        .arg("--count")
        .arg("3")
        .arg("--timeout")
        .arg("10s")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("consume should start");

    let producer = fifoprims()
        .arg("produce")
        .arg(&path)
        .arg("--size")
        .arg("4")
        .arg("--text")
        .arg("abcdefghijkl")
        .arg("--timeout")
        .arg("10s")
        .output()
        .expect("produce should run");
    assert!(
        producer.status.success(),
        "produce failed: {}",
        String::from_utf8_lossy(&producer.stderr)
    );

    let output = consumer.wait_with_output().expect("consume should finish");
    assert!(
        output.status.success(),
        "consume failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.stdout, b"abcdefghijkl");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn consume_json_reports_hex() {
    let dir = unique_temp_dir("json");
    let path = dir.join("chan.fifo");
    assert!(create(&path).status.success());

    let consumer = fifoprims()
        .arg("--format")
        .arg("json")
        .arg("consume")
        .arg(&path)
        .arg("-s")
        .arg("2")
        .arg("--timeout")
        .arg("10s")
        .stdout(Stdio::piped())
        .spawn()
        .expect("consume should start");

    let producer = fifoprims()
        .arg("produce")
        .arg(&path)
        .arg("-s")
        .arg("2")
        .arg("--hex")
        .arg("ff00")
        .arg("--timeout")
        .arg("10s")
        .output()
        .expect("produce should run");
    assert!(producer.status.success());

    let output = consumer.wait_with_output().expect("consume should finish");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"hex\":\"ff00\""));
    assert!(stdout.contains("\"size\":2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn consume_without_producer_times_out_with_124() {
    let dir = unique_temp_dir("timeout");
    let path = dir.join("chan.fifo");
    assert!(create(&path).status.success());

    let output = fifoprims()
        .arg("consume")
        .arg(&path)
        .arg("--size")
        .arg("4")
        .arg("--timeout")
        .arg("200ms")
        .output()
        .expect("consume should run");
    assert_eq!(output.status.code(), Some(124));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn produce_rejects_partial_element_payload() {
    let dir = unique_temp_dir("partial");
    let path = dir.join("chan.fifo");

    let output = fifoprims()
        .arg("produce")
        .arg(&path)
        .arg("--size")
        .arg("4")
        .arg("--text")
        .arg("abc")
        .output()
        .expect("produce should run");
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("whole number"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn open_of_missing_pipe_is_a_transport_error() {
    let dir = unique_temp_dir("missing");
    let path = dir.join("absent.fifo");

    let output = fifoprims()
        .arg("consume")
        .arg(&path)
        .arg("--size")
        .arg("4")
        .output()
        .expect("consume should run");
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("open failed"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unlink_refuses_regular_files() {
    let dir = unique_temp_dir("regular");
    let path = dir.join("plain.txt");
    std::fs::write(&path, b"keep me").expect("file should be writable");

    let output = fifoprims()
        .arg("unlink")
        .arg(&path)
        .output()
        .expect("unlink should run");
    assert_eq!(output.status.code(), Some(64));
    assert!(path.exists());

    let output = create(&path);
    assert_eq!(output.status.code(), Some(3));

    let _ = std::fs::remove_dir_all(&dir);
}
