#![allow(deprecated)]

//! End-to-end CLI tests
//!
//! Runs the `botdesk` binary against the demo data source with a session
//! file inside a temporary directory.

use predicates::prelude::*;
mod common;

const DEMO_CONFIG: &str = "backend:\n  mode: demo\n";

#[test]
fn test_stats_without_session_fails() {
    let (dir, config_path) = common::temp_config_file(DEMO_CONFIG);

    common::botdesk(&dir, &config_path)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active session"))
        .stderr(predicate::str::contains("botdesk login"));
}

#[test]
fn test_demo_login_then_whoami() {
    let (dir, config_path) = common::temp_config_file(DEMO_CONFIG);

    common::botdesk(&dir, &config_path)
        .args(["login", "--demo", "--chatbot-id", "bot-9"])
        .assert()
        .success();

    common::botdesk(&dir, &config_path)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("bot-9"));
}

#[test]
fn test_demo_stats_json() {
    let (dir, config_path) = common::temp_config_file(DEMO_CONFIG);
    common::botdesk(&dir, &config_path)
        .args(["login", "--demo"])
        .assert()
        .success();

    common::botdesk(&dir, &config_path)
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalConversations\": 1248"));
}

#[test]
fn test_demo_sources_list() {
    let (dir, config_path) = common::temp_config_file(DEMO_CONFIG);
    common::botdesk(&dir, &config_path)
        .args(["login", "--demo"])
        .assert()
        .success();

    common::botdesk(&dir, &config_path)
        .args(["sources", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FAQ Document"))
        .stdout(predicate::str::contains("Company Website"));
}

#[test]
fn test_logout_forgets_session() {
    let (dir, config_path) = common::temp_config_file(DEMO_CONFIG);
    common::botdesk(&dir, &config_path)
        .args(["login", "--demo"])
        .assert()
        .success();
    common::botdesk(&dir, &config_path)
        .arg("logout")
        .assert()
        .success();

    common::botdesk(&dir, &config_path)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active session"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (dir, config_path) = common::temp_config_file("backend:\n  timeout_seconds: 0\n");

    common::botdesk(&dir, &config_path)
        .arg("whoami")
        .assert()
        .failure();
}
