// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn module() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(MODULE_FILE), "module example.com/web\n").unwrap();
    std::fs::create_dir_all(dir.path().join("cmd/web")).unwrap();
    std::fs::write(dir.path().join("cmd/web/main.go"), "package main\n").unwrap();
    dir
}

#[test]
fn package_directory_under_module() {
    let dir = module();
    let root = dir.path().canonicalize().unwrap();
    let target = resolve(&root.join("cmd/web")).unwrap();
    assert_eq!(target.module_root, root);
    assert_eq!(target.package, "./cmd/web");
}

#[test]
fn single_file_is_built_as_file() {
    let dir = module();
    let root = dir.path().canonicalize().unwrap();
    let target = resolve(&root.join("cmd/web/main.go")).unwrap();
    assert_eq!(target.module_root, root);
    assert_eq!(target.package, "./cmd/web/main.go");
}

#[test]
fn module_root_itself_is_dot() {
    let dir = module();
    let root = dir.path().canonicalize().unwrap();
    assert_eq!(resolve(&root).unwrap().package, ".");
}

#[test]
fn missing_module_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    let err = resolve(&dir.path().join("pkg")).unwrap_err();
    assert!(matches!(err, Error::NoModuleRoot { .. }), "{err:?}");
}
