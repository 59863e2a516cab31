use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn tplwatch_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tplwatch"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("TELEGRAM_CHAT_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(["-c", "user.name=tplwatch", "-c", "user.email=tplwatch@example.com"])
        .args(args)
        .current_dir(dir)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .expect("run git");
    assert!(
        out.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

fn commit_templates(repo: &Path, files: &[&str], message: &str) {
    for f in files {
        let path = repo.join(f);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, "id: t\ninfo:\n  name: t\n").expect("write template");
    }
    git(repo, &["add", "."]);
    git(repo, &["commit", "--quiet", "-m", message]);
}

/// Writes a config tracking one repository at `url`, with the Telegram API
/// pointed at a closed local port.
fn write_config(home: &Path, url: &str) -> PathBuf {
    let data_dir = home.join("data");
    let config = format!(
        "data_dir: {data}\n\
         telegram:\n  api_base: http://127.0.0.1:9\n  bot_token: \"123:abc\"\n  chat_id: \"42\"\n\
         repositories:\n  - name: upstream\n    url: {url}\n",
        data = data_dir.display(),
    );
    let path = home.join("tplwatch.yaml");
    fs::write(&path, config).expect("write config");
    path
}

fn run_json(home: &Path, config: &Path, extra: &[&str]) -> Value {
    let output = tplwatch_cmd(home)
        .arg("run")
        .arg("--config")
        .arg(config)
        .arg("--json")
        .args(extra)
        .output()
        .expect("run tplwatch");
    assert!(
        output.status.success(),
        "tplwatch run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("run summary JSON")
}

#[test]
fn missing_credentials_is_fatal() {
    let home = TempDir::new().expect("home");
    tplwatch_cmd(home.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn explicit_missing_config_file_is_fatal() {
    let home = TempDir::new().expect("home");
    tplwatch_cmd(home.path())
        .env("TELEGRAM_BOT_TOKEN", "123:abc")
        .env("TELEGRAM_CHAT_ID", "42")
        .args(["status", "--config"])
        .arg(home.path().join("absent.yaml"))
        .assert()
        .failure()
        .stderr(contains("absent.yaml"));
}

#[test]
fn status_lists_default_repositories_without_baselines() {
    let home = TempDir::new().expect("home");
    let output = tplwatch_cmd(home.path())
        .env("TELEGRAM_BOT_TOKEN", "123:abc")
        .env("TELEGRAM_CHAT_ID", "42")
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let status: Value = serde_json::from_slice(&output.stdout).expect("status JSON");
    let repos = status["repositories"].as_array().expect("repositories");
    let names: Vec<_> = repos.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["nuclei-templates", "nucleihub-templates"]);
    for repo in repos {
        assert_eq!(repo["baseline"], "missing");
        assert_eq!(repo["mirror_present"], false);
    }
    assert!(repos[0]["state_file"]
        .as_str()
        .unwrap()
        .ends_with("known_templates_nuclei-templates.txt"));
}

#[test]
fn status_reports_recorded_baseline() {
    let home = TempDir::new().expect("home");
    let config = write_config(home.path(), "file:///nowhere");
    let state_dir = home.path().join("data").join("state");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(
        state_dir.join("known_templates_upstream.txt"),
        "a.yaml\ndns/b.yaml\n",
    )
    .unwrap();

    tplwatch_cmd(home.path())
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("upstream"))
        .stdout(contains("RECORDED"));

    let output = tplwatch_cmd(home.path())
        .args(["status", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["repositories"][0]["baseline"], "recorded");
    assert_eq!(status["repositories"][0]["templates"], 2);
}

#[test]
fn unreachable_repository_fails_but_run_exits_zero() {
    let home = TempDir::new().expect("home");
    let missing = home.path().join("no-such-upstream");
    let config = write_config(home.path(), &format!("file://{}", missing.display()));

    let summary = run_json(home.path(), &config, &[]);

    assert_eq!(summary["repos"][0]["name"], "upstream");
    assert_eq!(summary["repos"][0]["result"], "failed");
    assert_eq!(summary["repos"][0]["stage"], "preparing");
    assert!(!home
        .path()
        .join("data/state/known_templates_upstream.txt")
        .exists());
}

#[test]
fn baseline_then_dry_run_reports_only_new_templates() {
    if !git_available() {
        return;
    }
    let home = TempDir::new().expect("home");
    let upstream = home.path().join("upstream-src");
    fs::create_dir_all(&upstream).unwrap();
    git(&upstream, &["init", "--quiet"]);
    commit_templates(&upstream, &["http/a.yaml", "dns/b.yaml"], "initial");
    let config = write_config(home.path(), &format!("file://{}", upstream.display()));

    // Dry run on a fresh install records nothing.
    let dry = run_json(home.path(), &config, &["--dry-run"]);
    assert_eq!(dry["repos"][0]["result"], "dry_run");
    assert_eq!(dry["repos"][0]["first_run"], true);
    let state = home.path().join("data/state/known_templates_upstream.txt");
    assert!(!state.exists());

    // The first real run only records a baseline; nothing is sent.
    let first = run_json(home.path(), &config, &[]);
    assert_eq!(first["repos"][0]["result"], "baseline");
    assert_eq!(first["repos"][0]["templates"], 2);
    assert_eq!(
        fs::read_to_string(&state).unwrap(),
        "dns/b.yaml\nhttp/a.yaml\n"
    );

    commit_templates(&upstream, &["http/c.yaml"], "add c");

    let dry = run_json(home.path(), &config, &["--dry-run"]);
    assert_eq!(dry["repos"][0]["first_run"], false);
    assert_eq!(
        dry["repos"][0]["items"],
        serde_json::json!(["http/c.yaml"])
    );
    assert_eq!(
        fs::read_to_string(&state).unwrap(),
        "dns/b.yaml\nhttp/a.yaml\n",
        "dry run must not touch the baseline"
    );
}

#[test]
fn delivery_failure_warns_and_still_records_baseline() {
    if !git_available() {
        return;
    }
    let home = TempDir::new().expect("home");
    let upstream = home.path().join("upstream-src");
    fs::create_dir_all(&upstream).unwrap();
    git(&upstream, &["init", "--quiet"]);
    commit_templates(&upstream, &["http/a.yaml"], "initial");
    let config = write_config(home.path(), &format!("file://{}", upstream.display()));

    let first = run_json(home.path(), &config, &[]);
    assert_eq!(first["repos"][0]["result"], "baseline");

    commit_templates(&upstream, &["http/b.yaml"], "add b");

    // The configured API base is a closed local port.
    tplwatch_cmd(home.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(contains("WARN"))
        .stderr(contains("notification failed"))
        .stdout(contains("delivery failed"));

    let state = home.path().join("data/state/known_templates_upstream.txt");
    assert_eq!(
        fs::read_to_string(&state).unwrap(),
        "http/a.yaml\nhttp/b.yaml\n"
    );
}

#[test]
fn dry_run_conflicts_with_force_notify() {
    let home = TempDir::new().expect("home");
    tplwatch_cmd(home.path())
        .args(["run", "--dry-run", "--force-notify"])
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
}
