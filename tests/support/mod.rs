//! Test harness utilities for cloak integration tests.
//!
//! Provides an isolated home directory and working directory per test, so
//! tests never touch the real `~/.cloak` or race on the process cwd.

use assert_cmd::Command;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

pub struct TestEnv {
    /// Isolated cloak home (CLOAK_HOME).
    pub home: TempDir,
    /// Working directory commands run in.
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("failed to create temp home"),
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// A cloak command with an isolated environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cloak").expect("failed to find cloak binary");
        cmd.env("CLOAK_HOME", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("GH_TOKEN");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("CLOAK_GITHUB_CLIENT_ID");
        cmd.current_dir(self.dir.path());
        cmd
    }

    pub fn workdir(&self) -> &Path {
        self.dir.path()
    }

    /// Shortcut for `cloak init`.
    pub fn init(&self) -> Output {
        self.cmd().arg("init").output().expect("failed to run init")
    }

    /// Shortcut for `cloak set <key> <val> -p <project>`.
    pub fn set(&self, project: &str, key: &str, val: &str) -> Output {
        self.cmd()
            .args(["set", key, val, "-p", project])
            .output()
            .expect("failed to run set")
    }

    /// Shortcut for `cloak get <key> -p <project>`.
    pub fn get(&self, project: &str, key: &str) -> Output {
        self.cmd()
            .args(["get", key, "-p", project])
            .output()
            .expect("failed to run get")
    }

    /// Parse the config file as JSON for assertions.
    pub fn config_json(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.home.path().join("config.json"))
            .expect("config.json missing");
        serde_json::from_str(&raw).expect("config.json unparseable")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success, got {:?}\nstdout: {}\nstderr: {}",
        output.status,
        stdout(output),
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure, got success\nstdout: {}",
        stdout(output)
    );
}
