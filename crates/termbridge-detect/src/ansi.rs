use regex::Regex;

// CSI sequences (ESC [ params letter), OSC sequences terminated by BEL or
// ESC \, and single-character charset selects (ESC ( X). Truncated sequences
// simply fail to match and pass through unchanged.
const ANSI_PATTERN: &str = r"\x1B(?:\[[0-9;]*[A-Za-z]|\].*?(?:\x07|\x1B\\)|\([A-Z0-9])";

/// Strips terminal escape sequences from captured text, leaving printable
/// content and newlines intact.
pub struct AnsiFilter {
    pattern: Regex,
}

impl AnsiFilter {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(ANSI_PATTERN).unwrap(),
        }
    }

    pub fn strip(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        self.pattern.replace_all(text, "").into_owned()
    }
}

impl Default for AnsiFilter {
    fn default() -> Self {
        Self::new()
    }
}
