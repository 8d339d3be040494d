#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;

const AUTH_ENVS: [&str; 5] = [
    "CLOUDKIT_PROVIDER",
    "CLOUDKIT_ACCESS_KEY",
    "CLOUDKIT_SECRET_KEY",
    "CLOUDKIT_SECURITY_TOKEN",
    "CLOUDKIT_REGION",
];

/// 一時的な CLOUDKIT_HOME を使うコマンド
fn cloudkit(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("cloudkit").unwrap();
    cmd.env("CLOUDKIT_HOME", home);
    for key in AUTH_ENVS {
        cmd.env_remove(key);
    }
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("cloudkit").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("棚卸し"))
        .stdout(predicate::str::contains("cloudlist"))
        .stdout(predicate::str::contains("exec-command"))
        .stdout(predicate::str::contains("bucket"))
        .stdout(predicate::str::contains("creds"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("cloudkit").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudkit"));
}

/// cloudlistのヘルプに種別オプションが表示されることを確認
#[test]
fn test_cloudlist_help() {
    let mut cmd = Command::cargo_bin("cloudkit").unwrap();
    cmd.arg("cloudlist")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--kinds"))
        .stdout(predicate::str::contains("--access-key"));
}

/// 存在しないコマンドはエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("cloudkit").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

/// アクセスキーが無ければ通信せずに失敗することを確認
#[test]
fn test_cloudlist_without_access_key() {
    let home = tempfile::tempdir().unwrap();
    cloudkit(home.path())
        .args(["cloudlist", "--provider", "alibaba", "--secret-key", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("access_key"));
}

/// 未対応のプロバイダはエラーになることを確認
#[test]
fn test_cloudlist_unknown_provider() {
    let home = tempfile::tempdir().unwrap();
    cloudkit(home.path())
        .args(["cloudlist", "--provider", "gcp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gcp"));
}

/// 空のキャッシュでも creds list は成功することを確認
#[test]
fn test_creds_list_empty() {
    let home = tempfile::tempdir().unwrap();
    cloudkit(home.path())
        .args(["creds", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("クレデンシャルはありません"));
}

/// 未登録のフィンガープリントは削除できないことを確認
#[test]
fn test_creds_delete_unknown() {
    let home = tempfile::tempdir().unwrap();
    cloudkit(home.path())
        .args(["creds", "delete", "0123456789abcdef"])
        .assert()
        .failure();
}

/// exec-command はコマンド本体が必須であることを確認
#[test]
fn test_exec_command_requires_command() {
    let home = tempfile::tempdir().unwrap();
    cloudkit(home.path())
        .args(["exec-command", "i-123"])
        .assert()
        .failure();
}
