//! Logging helpers that keep raw terminal input single-line and free of credentials.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///
/// Input longer than 200 chars is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Mask the password argument of `REGISTER` / `LOGIN` lines before they reach a log.
///
/// Everything after the username token is replaced by `***`; other input is returned unchanged.
pub fn redact_credentials(raw: &str) -> String {
    let mut tokens = raw.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return raw.to_string();
    };
    if !keyword.eq_ignore_ascii_case("REGISTER") && !keyword.eq_ignore_ascii_case("LOGIN") {
        return raw.to_string();
    }
    match (tokens.next(), tokens.next()) {
        (Some(user), Some(_)) => format!("{} {} ***", keyword, user),
        (Some(user), None) => format!("{} {}", keyword, user),
        _ => keyword.to_string(),
    }
}
