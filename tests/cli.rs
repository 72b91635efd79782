//
//  bb-cloud
//  tests/cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Binary-level tests. Each test gets its own config directory and talks to
//! a local mock server through `BB_API_URL`.

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "BB_TOKEN",
    "BITBUCKET_TOKEN",
    "BB_USERNAME",
    "BB_REPO",
    "BB_WORKSPACE",
    "BB_API_URL",
    "BB_NO_PROMPT",
    "BB_DEBUG",
    "XDG_CONFIG_HOME",
];

fn bb(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bb").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("BB_CONFIG_DIR", config_dir.path());
    cmd
}

fn authed(config_dir: &TempDir, server: &mockito::ServerGuard) -> Command {
    let mut cmd = bb(config_dir);
    cmd.env("BB_TOKEN", "secret").env("BB_API_URL", server.url());
    cmd
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bb version "));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bitbucket Cloud"))
        .stdout(predicate::str::contains("pipeline"))
        .stdout(predicate::str::contains("snippet"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let dir = TempDir::new().unwrap();
    bb(&dir).arg("frobnicate").assert().code(2);
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();

    bb(&dir)
        .args(["config", "set", "default_workspace", "acme"])
        .assert()
        .success();

    bb(&dir)
        .args(["config", "get", "default_workspace"])
        .assert()
        .success()
        .stdout("acme\n");

    assert!(dir.path().join("config.yml").exists());
}

#[test]
fn test_config_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("git_protocol=ssh"))
        .stdout(predicate::str::contains("http_timeout=30"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yml"));
}

#[test]
fn test_auth_token_from_env() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .args(["auth", "token"])
        .env("BB_TOKEN", "abc123")
        .assert()
        .success()
        .stdout("abc123\n");
}

#[test]
fn test_missing_token_exits_with_auth_code() {
    let dir = TempDir::new().unwrap();
    bb(&dir)
        .args(["issue", "list", "-R", "acme/widgets"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("bb auth login"));
}

#[test]
fn test_api_get_prints_body() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/user")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"username":"jdoe","display_name":"Jane Doe"}"#)
        .create();

    authed(&dir, &server)
        .args(["api", "/user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"username\": \"jdoe\""));

    mock.assert();
}

#[test]
fn test_api_fields_post_json_body() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/repositories/acme/widgets/issues")
        .match_body(Matcher::Json(serde_json::json!({
            "title": "Bug",
            "content": {"raw": "Broken"}
        })))
        .with_status(201)
        .with_body(r#"{"id": 12}"#)
        .create();

    authed(&dir, &server)
        .args([
            "api",
            "/2.0/repositories/acme/widgets/issues",
            "-F",
            "title=Bug",
            "-F",
            "content.raw=Broken",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": 12"));

    mock.assert();
}

#[test]
fn test_not_found_exits_with_not_found_code() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/repositories/acme/widgets/issues/99")
        .with_status(404)
        .with_body(r#"{"type":"error","error":{"message":"Issue not found"}}"#)
        .create();

    authed(&dir, &server)
        .args(["issue", "view", "99", "-R", "acme/widgets"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("Issue not found"));

    mock.assert();
}

#[test]
fn test_rejected_token_exits_with_auth_code() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/repositories/acme")
        .match_query(Matcher::Any)
        .with_status(401)
        .create();

    authed(&dir, &server)
        .args(["repo", "list", "-w", "acme"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unauthorized"));
}

#[test]
fn test_issue_list_table_and_json() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let body = r#"{
        "size": 1, "page": 1, "pagelen": 30,
        "values": [{"id": 3, "title": "Crash on start", "state": "open", "kind": "bug", "priority": "major"}]
    }"#;
    let mock = server
        .mock("GET", "/repositories/acme/widgets/issues")
        .match_query(Matcher::UrlEncoded("pagelen".into(), "30".into()))
        .with_status(200)
        .with_body(body)
        .expect(2)
        .create();

    authed(&dir, &server)
        .args(["issue", "list", "-R", "acme/widgets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crash on start"));

    let output = authed(&dir, &server)
        .args(["issue", "list", "-R", "acme/widgets", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["title"], "Crash on start");

    mock.assert();
}

#[test]
fn test_default_workspace_resolves_bare_slug() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/repositories/acme/widgets")
        .with_status(200)
        .with_body(r#"{"full_name": "acme/widgets", "is_private": true}"#)
        .create();

    bb(&dir)
        .args(["config", "set", "default_workspace", "acme"])
        .assert()
        .success();

    authed(&dir, &server)
        .args(["repo", "view", "widgets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/widgets"))
        .stdout(predicate::str::contains("private"));

    mock.assert();
}

#[test]
fn test_delete_without_yes_refuses_when_not_interactive() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/repositories/acme/widgets")
        .expect(0)
        .create();

    authed(&dir, &server)
        .args(["repo", "delete", "acme/widgets"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--yes"));

    mock.assert();
}

#[test]
fn test_api_paginate_follows_next_links() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let next = format!("{}/items/next?page=2", server.url());
    let first = server
        .mock("GET", "/items")
        .match_header("x-trace", "abc")
        .with_status(200)
        .with_body(serde_json::json!({"page": 1, "values": [1, 2], "next": next}).to_string())
        .create();
    let second = server
        .mock("GET", "/items/next")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .match_header("authorization", "Bearer secret")
        .match_header("x-trace", "abc")
        .with_status(200)
        .with_body(r#"{"page": 2, "values": [3]}"#)
        .create();

    let output = authed(&dir, &server)
        .args(["api", "/items", "--paginate", "-H", "X-Trace: abc"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let merged: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(merged, serde_json::json!([1, 2, 3]));
    first.assert();
    second.assert();
}

#[test]
fn test_api_paginate_requires_values() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/user")
        .with_status(200)
        .with_body(r#"{"username": "jdoe"}"#)
        .create();

    authed(&dir, &server)
        .args(["api", "/user", "--paginate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("values"));

    mock.assert();
}
