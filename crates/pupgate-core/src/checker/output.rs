use regex::Regex;
use std::sync::LazyLock;

// CSI sequences (colors, cursor movement) and OSC sequences (titles, links).
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").unwrap()
});

pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

/// Decode captured bytes, strip escapes and keep the non-blank lines.
pub fn diagnostic_lines(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    strip_ansi(&text)
        .lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.trim().is_empty())
        .collect()
}
