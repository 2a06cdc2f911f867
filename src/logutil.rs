//! Log line helpers. Policy names and denial reasons come from configuration and
//! third-party modules, so they are flattened before they reach a log line.

use crate::identity::Address;

const MAX_PREVIEW: usize = 160;

/// Flatten `s` onto one line: control characters become escapes and long text is cut with an ellipsis.
pub fn single_line(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        if ch.is_control() {
            out.extend(ch.escape_default());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `0x1234…abcd` form for addresses in dense log lines.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}
