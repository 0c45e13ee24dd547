//! Terminal output

use crate::commands::ColorArg;
use console::{style, Term};
use std::io::IsTerminal;

/// Writes results to stdout and status lines to stderr
#[derive(Debug)]
pub struct Output {
    term: Term,
    use_color: bool,
    quiet: bool,
}

impl Output {
    /// Output honoring the color choice and quiet flag
    #[must_use]
    pub fn new(color: ColorArg, quiet: bool) -> Self {
        let use_color = match color {
            ColorArg::Always => true,
            ColorArg::Never => false,
            ColorArg::Auto => std::io::stderr().is_terminal(),
        };
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Result payload; printed even in quiet mode
    pub fn data(&self, text: &str) {
        println!("{text}");
    }

    /// Passing check
    pub fn pass(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mark = if self.use_color {
            style("✓").green().to_string()
        } else {
            "✓".to_string()
        };
        let _ = self.term.write_line(&format!("{mark} {message}"));
    }

    /// Section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let line = if self.use_color {
            style(title).bold().cyan().to_string()
        } else {
            title.to_string()
        };
        let _ = self.term.write_line(&line);
    }
}
