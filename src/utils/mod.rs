//! Julia source-text helpers shared by the expander and the wrapper.

use std::path::Path;

/// Render `s` as a double-quoted Julia string literal.
///
/// Escapes backslash, double quote and `$` (interpolation), and spells out
/// control characters so the literal stays on one line.
pub fn julia_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Control characters are all <= U+009F, so four digits suffice.
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Julia string literal for a filesystem path.
pub fn julia_path(path: &Path) -> String {
    julia_string(&path.to_string_lossy())
}

/// True when any line of `text` is longer than `max` characters.
pub fn has_line_longer_than(text: &str, max: usize) -> bool {
    text.lines().any(|line| line.chars().count() > max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_julia_string_plain() {
        assert_eq!(julia_string("abc"), "\"abc\"");
    }

    #[test]
    fn test_julia_string_escapes() {
        assert_eq!(julia_string(r#"a"b\c$d"#), r#""a\"b\\c\$d""#);
        assert_eq!(julia_string("x\ny\tz"), "\"x\\ny\\tz\"");
        assert_eq!(julia_string("\u{7}"), "\"\\u0007\"");
        assert_eq!(julia_string("a\u{1b}[1mb"), "\"a\\u001b[1mb\"");
        assert_eq!(julia_string("\u{9f}"), "\"\\u009f\"");
    }

    #[test]
    fn test_julia_path_windows_separators() {
        let p = Path::new(r"C:\tmp\out.txt");
        assert_eq!(julia_path(p), r#""C:\\tmp\\out.txt""#);
    }

    #[test]
    fn test_line_length_counts_chars_not_bytes() {
        let line = "é".repeat(10);
        assert!(!has_line_longer_than(&line, 10));
        assert!(has_line_longer_than(&line, 9));
        assert!(!has_line_longer_than("", 0));
    }
}
