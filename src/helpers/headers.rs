// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Splitting and quoting helpers for field values.

/// Split `s` on `sep` when it appears outside a quoted-string.
///
/// Backslash escapes inside quotes are honoured, so `"a\",b"` stays whole.
/// Parts are trimmed of optional whitespace; empty parts are kept so callers
/// can decide whether they matter.
pub fn split_outside_quotes(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    for (i, &b) in s.as_bytes().iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quote => escaped = true,
            b'"' => in_quote = !in_quote,
            _ if b == sep && !in_quote => {
                parts.push(trim_ows(&s[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(trim_ows(&s[start..]));
    parts
}

/// Split a comma-separated list, respecting quoted-strings.
pub fn split_commas_respecting_quotes(s: &str) -> Vec<&str> {
    split_outside_quotes(s, b',')
}

/// Trim optional whitespace (SP / HTAB) from both ends.
pub fn trim_ows(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}

/// Validate a quoted-string per HTTP rules: must start and end with DQUOTE, support backslash escapes,
/// must not contain unescaped control characters (except HTAB). Returns Ok(()) on success, Err(msg)
/// on failure.
pub fn validate_quoted_string(val: &str) -> Result<(), String> {
    let bytes = val.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'"' || bytes[bytes.len() - 1] != b'"' {
        return Err(format!("Quoted-string not properly quoted: '{}'", val));
    }

    let mut i = 1usize;
    let mut prev_backslash = false;
    while i + 1 < bytes.len() {
        let b = bytes[i];
        if prev_backslash {
            prev_backslash = false;
        } else if b == b'\\' {
            prev_backslash = true;
        } else if b == b'"' {
            return Err(format!("Unescaped quote in quoted-string: '{}'", val));
        } else if (b < 0x20 && b != b'\t') || b == 0x7f {
            return Err(format!("Control character in quoted-string: '{}'", val));
        }
        i += 1;
    }

    if prev_backslash {
        return Err(format!(
            "Quoted-string ends with escape character: '{}'",
            val
        ));
    }

    Ok(())
}

/// Return the content of a quoted-string with escapes removed, or `s`
/// unchanged when it is not quoted.
pub fn unquote(s: &str) -> String {
    if validate_quoted_string(s).is_err() {
        return s.to_string();
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// True for a `token` or a well-formed quoted-string.
pub fn is_token_or_quoted_string(s: &str) -> bool {
    crate::helpers::token::is_token(s) || validate_quoted_string(s).is_ok()
}
