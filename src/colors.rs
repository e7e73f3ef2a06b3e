// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Terminal color scheme
//!
//! Provides consistent styling across all CLI output.
//!
//! ## Palette
//! - Green - success, OK
//! - Magenta - headers, labels
//! - Cyan - paths, ids, info
//! - Yellow - counts, warnings
//! - Red - errors

use colored::{ColoredString, Colorize};

/// Status indicators with consistent colors
pub struct Status;

impl Status {
    /// Success indicator: `[OK]` in green
    pub fn ok() -> ColoredString {
        "[OK]".green()
    }

    /// Info indicator: `[i]` in cyan
    pub fn info() -> ColoredString {
        "[i]".cyan()
    }

    /// Warning indicator: `[!]` in yellow
    pub fn warn() -> ColoredString {
        "[!]".yellow()
    }

    /// Error indicator: `[X]` in red
    pub fn error() -> ColoredString {
        "[X]".red()
    }

    /// Action indicator: `[>]` in yellow
    pub fn action() -> ColoredString {
        "[>]".yellow()
    }

    /// Summary indicator: `[=]` in blue
    pub fn summary() -> ColoredString {
        "[=]".blue()
    }
}

/// Text styling helpers
pub trait StyledText {
    /// Style as a header/label (magenta bold)
    fn header(&self) -> ColoredString;
    /// Style as a path/identifier (cyan)
    fn path(&self) -> ColoredString;
    /// Style as a count/number (yellow)
    fn count(&self) -> ColoredString;
    /// Style as a success value (green)
    fn success(&self) -> ColoredString;
}

impl StyledText for str {
    fn header(&self) -> ColoredString {
        self.magenta().bold()
    }

    fn path(&self) -> ColoredString {
        self.cyan()
    }

    fn count(&self) -> ColoredString {
        self.yellow()
    }

    fn success(&self) -> ColoredString {
        self.green()
    }
}

impl StyledText for String {
    fn header(&self) -> ColoredString {
        self.as_str().header()
    }

    fn path(&self) -> ColoredString {
        self.as_str().path()
    }

    fn count(&self) -> ColoredString {
        self.as_str().count()
    }

    fn success(&self) -> ColoredString {
        self.as_str().success()
    }
}

/// Format a count for display
pub fn count<T: ToString>(n: T) -> ColoredString {
    n.to_string().count()
}
