//! Helpers shared by the html rewrite integration tests, benches and
//! fixtures.

use std::fmt::Write;

/// Escape control characters, quotes and backslashes so `text` fits on one
/// snapshot line.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Render the first differing line of two snapshots with two lines of
/// context on either side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    fn line(lines: &[String], idx: usize) -> &str {
        lines.get(idx).map_or("<missing>", String::as_str)
    }
    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&idx| line(expected, idx) != line(actual, idx));

    let mut out = String::new();
    if let Some(idx) = mismatch {
        let start = idx.saturating_sub(2);
        let end = (idx + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            idx + 1,
            start + 1,
            end
        );
        for at in start..end {
            let marker = if at == idx { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", at + 1, line(expected, at));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", at + 1, line(actual, at));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

pub mod fixture;
pub mod snapshot;
