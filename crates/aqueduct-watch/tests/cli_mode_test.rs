/*
[INPUT]:  Built aqueduct-watch binary and example configuration
[OUTPUT]: Exit status checks for dry-run and invalid invocations
[POS]:    Integration tests - command line mode
[UPDATE]: When CLI flags or config validation change
*/

use std::process::Command;

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_aqueduct-watch"));
    command
        .env("RUST_LOG", "error")
        .env_remove("AQUEDUCT_HOST")
        .env_remove("AQUEDUCT_API_KEY_ID");
    command
}

#[test]
fn cli_mode_with_config_and_dry_run_works() {
    let config_path = format!("{}/examples/watch.yaml", env!("CARGO_MANIFEST_DIR"));

    let output = binary()
        .arg("--config")
        .arg(config_path)
        .arg("--dry-run")
        .output()
        .expect("Failed to start aqueduct-watch binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_mode_with_flags_only_and_dry_run_works() {
    let output = binary()
        .args(["--account", "0xabc", "--pair", "0xmaker:0xtaker", "--ticker"])
        .args(["--socket-url", "ws://127.0.0.1:9"])
        .arg("--dry-run")
        .output()
        .expect("Failed to start aqueduct-watch binary");

    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_mode_without_targets_fails() {
    let output = binary()
        .arg("--dry-run")
        .output()
        .expect("Failed to start aqueduct-watch binary");

    assert!(!output.status.success());
}

#[test]
fn cli_mode_with_malformed_pair_fails() {
    let output = binary()
        .args(["--pair", "0xmaker", "--dry-run"])
        .output()
        .expect("Failed to start aqueduct-watch binary");

    assert!(!output.status.success());
}
