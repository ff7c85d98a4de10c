use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// `botdesk` with its config and session file inside `dir`
#[allow(dead_code)]
pub fn botdesk(dir: &TempDir, config_path: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("botdesk").expect("botdesk binary");
    for var in [
        "BOTDESK_API_URL",
        "BOTDESK_API_KEY",
        "BOTDESK_MODE",
        "BOTDESK_TIMEOUT_SECONDS",
        "BOTDESK_AUTH_URL",
        "BOTDESK_SESSION_FILE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--config")
        .arg(config_path)
        .arg("--session-file")
        .arg(dir.path().join("session.json"));
    cmd
}
