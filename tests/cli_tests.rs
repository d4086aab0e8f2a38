use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    _dir: TempDir,
    config_path: PathBuf,
    cipher_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_path = dir.path().join("attack.json");
        let cipher_path = dir.path().join("cipher.txt");

        let mut config = File::create(&config_path).unwrap();
        writeln!(
            config,
            r#"{{ "cycles": 1, "phase1_trials": 1, "seed": 3, "sa": {{ "sa_sweeps": 2 }} }}"#
        )
        .unwrap();

        let mut cipher = File::create(&cipher_path).unwrap();
        writeln!(cipher, "QZNVK XOPLR MTAAW HJEUC BYDSI FGQTE ZPLMN OWXKA").unwrap();

        Self {
            _dir: dir,
            config_path,
            cipher_path,
        }
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_m209-analyzer"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute binary")
}

#[test]
fn simulate_prints_json_summary() {
    let ctx = TestContext::new();
    let output = run(&[
        "simulate",
        "--config",
        ctx.config_path.to_str().unwrap(),
        "--json",
        "--simulation-length",
        "40",
        "--simulation-crib-length",
        "20",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["attack_type"], "Known-Plaintext");
    assert_eq!(json["original_score"], 1000.0);
    assert!(!json["entries"].as_array().unwrap().is_empty());
}

#[test]
fn attack_prints_best_list_table() {
    let ctx = TestContext::new();
    let output = run(&[
        "attack",
        "--config",
        ctx.config_path.to_str().unwrap(),
        "--ciphertext-file",
        ctx.cipher_path.to_str().unwrap(),
        "--crib",
        "THE",
        "--best-list-size",
        "3",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let row = Regex::new(r"\|\s*1\s*\|\s*(-?[0-9]+\.[0-9]+)\s*\|").unwrap();
    let score: f64 = row
        .captures(&stdout)
        .unwrap_or_else(|| panic!("no result row in:\n{}", stdout))[1]
        .parse()
        .unwrap();
    assert!(score > 0.0 && score <= 1000.0);
    assert!(stdout.contains("Lugs: "));
}

#[test]
fn attack_without_ciphertext_fails() {
    let output = run(&["attack"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--ciphertext"));
}

#[test]
fn unknown_machine_version_is_rejected() {
    let output = run(&["simulate", "--machine-version", "enigma"]);
    assert!(!output.status.success());
}
