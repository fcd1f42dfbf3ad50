//! Terminal color detection and helpers.

use std::io::IsTerminal as _;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const BOLD: &str = "\x1b[1m";

/// Terminals known to render ANSI colors.
const COLOR_TERMS: &[&str] = &[
    "xterm", "screen", "tmux", "rxvt", "linux", "cygwin", "alacritty", "kitty", "iterm",
];

/// Whether ANSI escapes should be emitted, decided once at construction.
///
/// Precedence: `FORCE_COLOR` (any value) forces on; `NO_COLOR` (any value)
/// forces off; otherwise stdout must be a terminal and either `TERM` names
/// a color-capable terminal or `COLORTERM` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: supports_color(),
        }
    }

    /// A `ColorSupport` with colors unconditionally off (plain output).
    #[must_use]
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Force colors on, regardless of environment (tests).
    pub const fn force_enable(&mut self) {
        self.enabled = true;
    }

    /// Force colors off, regardless of environment (tests).
    pub const fn force_disable(&mut self) {
        self.enabled = false;
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{color}{text}{RESET}")
    }

    #[must_use]
    pub fn red(&self, text: &str) -> String {
        self.colorize(text, RED)
    }

    #[must_use]
    pub fn green(&self, text: &str) -> String {
        self.colorize(text, GREEN)
    }

    #[must_use]
    pub fn yellow(&self, text: &str) -> String {
        self.colorize(text, YELLOW)
    }

    #[must_use]
    pub fn blue(&self, text: &str) -> String {
        self.colorize(text, BLUE)
    }

    #[must_use]
    pub fn bold(&self, text: &str) -> String {
        self.colorize(text, BOLD)
    }
}

fn supports_color() -> bool {
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if !std::io::stdout().is_terminal() {
        return false;
    }

    let Ok(term) = std::env::var("TERM") else {
        return false;
    };
    if term.is_empty() {
        return false;
    }

    let term = term.to_lowercase();
    if COLOR_TERMS.iter().any(|known| term.contains(known)) {
        return true;
    }

    std::env::var_os("COLORTERM").is_some()
}
