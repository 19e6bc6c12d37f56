//! Integration tests for `cimon config`.

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

fn setting<'a>(json: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    json["settings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["key"] == key)
        .unwrap()
}

#[test]
fn test_config_path_uses_override() {
    let env = TestEnv::new();

    let output = env.cimon().args(["config", "path"]).output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["exists"], false);
    assert_eq!(
        json["path"].as_str().unwrap(),
        env.config_path().to_str().unwrap()
    );

    env.write_config("");
    env.cimon()
        .args(["config", "path", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.kdl"));
}

#[test]
fn test_config_show_defaults() {
    let env = TestEnv::new();

    let output = env.cimon().args(["config", "show"]).output().unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);

    let interval = setting(&json, "refresh-interval");
    assert_eq!(interval["value"], "30");
    assert_eq!(interval["source"], "default");
    assert!(setting(&json, "jenkins-url")["value"].is_null());
}

#[test]
fn test_config_show_precedence() {
    let env = TestEnv::new();
    env.write_config(
        "jenkins-url \"https://ci.file.example\"\nusername \"file-user\"\nrefresh-interval 45\n",
    );

    let output = env
        .cimon()
        .args(["config", "show"])
        .env("JENKINS_URL", "https://ci.env.example")
        .env("JENKINS_API_TOKEN", "abcd1234efgh5678")
        .output()
        .unwrap();
    let json = parse_json(&output.stdout);

    let url = setting(&json, "jenkins-url");
    assert_eq!(url["value"], "https://ci.env.example");
    assert_eq!(url["source"], "env:JENKINS_URL");

    let username = setting(&json, "username");
    assert_eq!(username["value"], "file-user");
    assert_eq!(username["source"], "file");

    assert_eq!(setting(&json, "refresh-interval")["value"], "45");

    let token = setting(&json, "api-token");
    assert_eq!(token["value"], "abcd...5678");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("abcd1234efgh5678"));
}

#[test]
fn test_config_show_human() {
    let env = TestEnv::new();
    env.write_config("folder \"platform\"\n");

    env.cimon()
        .args(["-H", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file:"))
        .stdout(predicate::str::contains("platform"))
        .stdout(predicate::str::contains("(file)"))
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_config_show_rejects_malformed_file() {
    let env = TestEnv::new();
    env.write_config("jenkins-url \"unterminated\n");

    env.cimon()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_config_show_rejects_bad_url_scheme() {
    let env = TestEnv::new();
    env.write_config("jenkins-url \"ftp://ci.example\"\n");

    env.cimon()
        .args(["-H", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config error"));
}
