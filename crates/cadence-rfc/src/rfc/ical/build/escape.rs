//! Escaping of TEXT values and parameter values (RFC 5545 §3.3.11, §3.2).

/// Escapes a TEXT value (RFC 5545 §3.3.11).
///
/// Backslash, semicolon and comma are escaped; newlines become `\n`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes a parameter value (RFC 5545 §3.2, RFC 6868).
///
/// Values containing `:`, `;` or `,` are DQUOTEd. Characters that cannot
/// appear inside a quoted string use the RFC 6868 caret encoding.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '^' => encoded.push_str("^^"),
            '\n' => encoded.push_str("^n"),
            '"' => encoded.push_str("^'"),
            other => encoded.push(other),
        }
    }

    if encoded.contains([':', ';', ',']) {
        format!("\"{encoded}\"")
    } else {
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_specials() {
        assert_eq!(escape_text("a, b; c\\d"), "a\\, b\\; c\\\\d");
        assert_eq!(escape_text("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_text("line1\r\nline2"), "line1\\nline2");
    }

    #[test]
    fn escape_param_quotes_when_needed() {
        assert_eq!(escape_param_value("America/Chicago"), "America/Chicago");
        assert_eq!(escape_param_value("mailto:a@b.c"), "\"mailto:a@b.c\"");
        assert_eq!(escape_param_value("say \"hi\""), "say ^'hi^'");
    }
}
