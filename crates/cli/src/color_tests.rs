// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn force_color() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
}

fn disable_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn no_color_wins_over_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    assert!(!should_colorize(Stream::Stdout));
    assert!(!should_colorize(Stream::Stderr));
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn styles_follow_color_setting() {
    let plain = format!("{:?}", Styles::plain());

    force_color();
    assert_ne!(format!("{:?}", styles()), plain);

    disable_color();
    assert_eq!(format!("{:?}", styles()), plain);
}

#[test]
#[serial]
fn error_label_is_plain_without_color() {
    disable_color();
    assert_eq!(error_label(), "error:");
}

#[test]
#[serial]
fn error_label_is_red_when_forced() {
    force_color();
    let label = error_label();
    assert!(label.contains("\x1b["), "expected ANSI escape in {label:?}");
    assert!(label.contains("error:"));
    assert!(label.ends_with("\x1b[0m"), "expected reset in {label:?}");
    std::env::remove_var("COLOR");
}
