use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn sign_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin!("duspay"));
    cmd.env_clear()
        .env("IYZICO_API_KEY", "sandbox-api-key")
        .env("IYZICO_SECRET_KEY", "sandbox-secret-key");
    cmd
}

#[test]
fn test_sign_prints_both_headers() {
    let mut cmd = sign_cmd();
    cmd.args([
        "sign",
        "--path",
        "/payment/iyzipos/checkoutform/auth/ecom/detail",
        "--body",
        "{\"token\":\"iyz-1700000000000\"}",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Authorization: IYZWSv2 "))
        .stdout(predicate::str::contains("x-iyzi-rnd: "));
}

#[test]
fn test_sign_with_fixed_nonce_is_reproducible() {
    let run = || {
        let mut cmd = sign_cmd();
        cmd.args([
            "sign",
            "--path",
            "/payment/test",
            "--body",
            "{}",
            "--nonce",
            "00112233445566778899aabbccddeeff",
        ]);
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_sign_body_file_signs_the_file_bytes() {
    let body = "{\"token\":\"iyz-1700000000000\"}";
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();

    let nonce = "00112233445566778899aabbccddeeff";
    let run = |args: &[&str]| {
        let mut cmd = sign_cmd();
        cmd.args(["sign", "--path", "/payment/test", "--nonce", nonce]);
        cmd.args(args);
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    // Same bytes, same nonce: the file-based invocation must produce the
    // same headers as the inline body.
    let from_file = run(&["--body-file", file.path().to_str().unwrap()]);
    let inline = run(&["--body", body]);
    assert_eq!(from_file, inline);
}

#[test]
fn test_sign_rejects_body_and_body_file_together() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{}").unwrap();

    let mut cmd = sign_cmd();
    cmd.args([
        "sign",
        "--path",
        "/payment/test",
        "--body",
        "{}",
        "--body-file",
        file.path().to_str().unwrap(),
    ]);

    cmd.assert().failure();
}

#[test]
fn test_sign_missing_body_file_fails() {
    let mut cmd = sign_cmd();
    cmd.args([
        "sign",
        "--path",
        "/payment/test",
        "--body-file",
        "/nonexistent/payload.json",
    ]);

    cmd.assert().failure();
}

#[test]
fn test_sign_without_credentials_fails() {
    let mut cmd = Command::new(cargo_bin!("duspay"));
    cmd.env_clear()
        .args(["sign", "--path", "/payment/test"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("IYZICO_API_KEY"));
}

#[test]
fn test_sign_never_echoes_the_secret() {
    let mut cmd = sign_cmd();
    cmd.args(["sign", "--path", "/payment/test", "--body", "{}"]);

    let output = cmd.output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!stdout.contains("sandbox-secret-key"));
    assert!(!stderr.contains("sandbox-secret-key"));
}
