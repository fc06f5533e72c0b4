use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_rsdelta").to_string()
}

#[test]
fn cli_signature_delta_patch_roundtrip() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.bin");
    let sig = dir.path().join("base.sig");
    let new = dir.path().join("new.bin");
    let delta = dir.path().join("new.delta");
    let output = dir.path().join("restored.bin");

    std::fs::write(&base, b"abcde12345abcde12345").unwrap();
    std::fs::write(&new, b"abcdeXXXXXabcde12345!").unwrap();

    let st = Command::new(bin())
        .args(["signature", "--block-size", "5", "--output"])
        .arg(&sig)
        .arg(&base)
        .status()
        .unwrap();
    assert!(st.success());

    let st = Command::new(bin())
        .args(["delta", "--output"])
        .arg(&delta)
        .arg(&sig)
        .arg(&new)
        .status()
        .unwrap();
    assert!(st.success());

    let st = Command::new(bin())
        .args(["patch", "--output"])
        .arg(&output)
        .arg(&base)
        .arg(&delta)
        .status()
        .unwrap();
    assert!(st.success());

    assert_eq!(
        std::fs::read(&output).unwrap(),
        std::fs::read(&new).unwrap()
    );
}

#[test]
fn cli_writes_to_stdout_by_default() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.bin");
    std::fs::write(&base, b"stdout test data").unwrap();

    let out = Command::new(bin())
        .arg("signature")
        .arg(&base)
        .output()
        .unwrap();
    assert!(out.status.success());
    // Signature header: magic + block size + strong length.
    assert_eq!(&out.stdout[..4], &[0x72, 0x73, 0x01, 0x36]);
    assert_eq!(&out.stdout[4..8], &2048u32.to_be_bytes());
    assert_eq!(&out.stdout[8..12], &8u32.to_be_bytes());
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.bin");
    let sig = dir.path().join("base.sig");
    std::fs::write(&base, b"data").unwrap();
    std::fs::write(&sig, b"already here").unwrap();

    let st = Command::new(bin())
        .args(["signature", "--output"])
        .arg(&sig)
        .arg(&base)
        .status()
        .unwrap();
    assert!(!st.success());

    let st = Command::new(bin())
        .args(["--force", "signature", "--output"])
        .arg(&sig)
        .arg(&base)
        .status()
        .unwrap();
    assert!(st.success());
}

#[test]
fn cli_unknown_verb_exits_nonzero() {
    let st = Command::new(bin()).arg("frobnicate").status().unwrap();
    assert!(!st.success());
}

#[test]
fn cli_missing_input_exits_nonzero() {
    let dir = tempdir().unwrap();
    let st = Command::new(bin())
        .arg("signature")
        .arg(dir.path().join("does-not-exist"))
        .status()
        .unwrap();
    assert!(!st.success());
}

#[test]
fn cli_corrupt_delta_exits_nonzero() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.bin");
    let delta = dir.path().join("bogus.delta");
    std::fs::write(&base, b"base").unwrap();
    std::fs::write(&delta, [0x72, 0x73, 0x02, 0x36, 0x55]).unwrap();

    let out = Command::new(bin())
        .arg("patch")
        .arg(&base)
        .arg(&delta)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("reserved"), "stderr: {stderr}");
}

#[test]
fn cli_json_stats_on_stderr() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.bin");
    let sig = dir.path().join("base.sig");
    std::fs::write(&base, b"json stats test").unwrap();

    let out = Command::new(bin())
        .args(["--json", "signature", "--output"])
        .arg(&sig)
        .arg(&base)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("\"command\": \"signature\""), "stderr: {stderr}");
}
