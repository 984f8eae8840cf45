//! Terminal styling shared by the CLI commands.

use colored::{ColoredString, Colorize};
use std::io::{self, IsTerminal};
use std::path::Path;

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

/// Printed to stdout, unlike the other status lines.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".dimmed(), msg.dimmed());
}

pub fn path(p: &Path) -> String {
    p.display().to_string().bright_white().to_string()
}

pub fn section(title: &str) {
    println!("\n{}", title.bold());
}

/// One problem line under a [`section`].
pub fn issue(msg: impl std::fmt::Display) {
    println!("  {} {}", "✗".red(), msg);
}

/// Progress marker for one file: a dot when clean, `E` when it failed.
pub fn file_marker(failed: bool) -> ColoredString {
    if failed { "E".red() } else { ".".green() }
}

pub fn is_terminal() -> bool {
    io::stdout().is_terminal()
}
