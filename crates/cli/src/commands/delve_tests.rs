// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    empty = { "", &[] },
    single = { "serve", &["serve"] },
    flags = { "-v --port 80", &["-v", "--port", "80"] },
    extra_spaces = { "  a \t b  ", &["a", "b"] },
)]
fn args_split_on_whitespace(input: &str, expected: &[&str]) {
    assert_eq!(split_args(input), expected);
}
