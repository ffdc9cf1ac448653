// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Placeholders: medium grey
    pub const PLACEHOLDER: u8 = 245;
    /// Error label: soft red
    pub const ERROR: u8 = 167;
}

/// Which stream the colored text goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise TTY check.
pub fn should_colorize(stream: Stream) -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    match stream {
        Stream::Stdout => std::io::stdout().is_terminal(),
        Stream::Stderr => std::io::stderr().is_terminal(),
    }
}

fn fg(code: u8) -> Style {
    Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))))
}

/// clap help styles in the project palette.
pub fn styles() -> Styles {
    if !should_colorize(Stream::Stdout) {
        return Styles::plain();
    }
    Styles::styled()
        .header(fg(codes::HEADER))
        .usage(fg(codes::HEADER))
        .literal(fg(codes::LITERAL))
        .placeholder(fg(codes::PLACEHOLDER))
        .error(fg(codes::ERROR).bold())
}

/// `error:` prefix for messages printed to stderr.
pub fn error_label() -> String {
    if should_colorize(Stream::Stderr) {
        let style = fg(codes::ERROR).bold();
        format!("{style}error:{style:#}")
    } else {
        "error:".to_string()
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
