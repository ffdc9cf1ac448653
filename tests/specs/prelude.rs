// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

/// `podbug` with a scrubbed environment: no color, no kubeconfig.
pub fn cli() -> Run {
    let mut cmd = Command::cargo_bin("podbug").expect("podbug binary should be built");
    cmd.env("NO_COLOR", "1")
        .env("KUBECONFIG", "/nonexistent/podbug-specs-kubeconfig")
        .env_remove("PODBUG_LOG")
        .env_remove("RUST_LOG");
    Run { cmd }
}

pub struct Run {
    cmd: Command,
}

impl Run {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> Output {
        let output = self.cmd.output().expect("podbug should run");
        let out = Output::from(output);
        assert_eq!(out.code, Some(0), "expected success\nstdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }

    pub fn fails_with(mut self, code: i32) -> Output {
        let output = self.cmd.output().expect("podbug should run");
        let out = Output::from(output);
        assert_eq!(out.code, Some(code), "unexpected exit\nstdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
        out
    }
}

pub struct Output {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl From<std::process::Output> for Output {
    fn from(o: std::process::Output) -> Self {
        Self {
            code: o.status.code(),
            stdout: String::from_utf8_lossy(&o.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&o.stderr).into_owned(),
        }
    }
}

impl Output {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn stdout_is_empty(self) -> Self {
        assert!(self.stdout.is_empty(), "expected empty stdout:\n{}", self.stdout);
        self
    }
}
