// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::exit_error::exit_code;
use podbug_exec::ExecError;

fn failed(code: Option<i32>) -> Error {
    Error::Cluster(ClusterError::Exec(ExecError::Failed {
        command: "kubectl exec".into(),
        code,
        output: String::new(),
    }))
}

#[test]
fn shell_exit_status_is_passed_through_silently() {
    let err = shell_exit(failed(Some(130)));
    assert_eq!(exit_code(&err), 130);
    assert_eq!(err.to_string(), "");
}

#[test]
fn signalled_shell_is_a_regular_error() {
    let err = shell_exit(failed(None));
    assert_eq!(exit_code(&err), 1);
    assert!(err.to_string().contains("kubectl exec"), "{err}");
}

#[test]
fn other_errors_keep_their_message() {
    let err = shell_exit(Error::NotPatched { deployment: "web".into() });
    assert_eq!(exit_code(&err), 1);
    assert!(err.to_string().contains("podbug patch"), "{err}");
}
