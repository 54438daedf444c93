//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per physical line, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// ## Summary
/// Folds a content line into physical lines of at most 75 octets.
///
/// Continuation lines start with a single space. Splits never fall
/// inside a multi-byte UTF-8 sequence. The result has no trailing CRLF.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0usize;
    // The first line holds 75 octets, continuations 74 plus the leading space.
    let mut limit = MAX_LINE_OCTETS;

    for c in line.chars() {
        let width = c.len_utf8();
        if current + width > limit {
            out.push_str("\r\n ");
            current = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        current += width;
    }

    out
}
