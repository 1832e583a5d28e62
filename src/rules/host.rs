// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::rules::{FieldRule, Syntax};

pub struct Host;

impl FieldRule for Host {
    fn name(&self) -> &'static str {
        "Host"
    }

    fn valid_in_responses(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_host)
    }
}

/// `uri-host [ ":" port ]`, accepting reg-names, IPv4 and bracketed IPv6.
fn is_host(s: &str) -> bool {
    if let Some(rest) = s.strip_prefix('[') {
        let Some(close) = rest.find(']') else {
            return false;
        };
        let literal = &rest[..close];
        let literal_ok = !literal.is_empty()
            && literal
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
        return literal_ok
            && match &rest[close + 1..] {
                "" => true,
                tail => tail.strip_prefix(':').is_some_and(is_port),
            };
    }
    let (host, port) = s.rsplit_once(':').unwrap_or((s, ""));
    !host.is_empty() && host.chars().all(is_reg_name_char) && is_port(port)
}

fn is_reg_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '_' | '~' | '%' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '='
        )
}

fn is_port(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldValue, MessageKind, FIELD_BAD_SYNTAX};
    use crate::test_helpers::finished_section;
    use rstest::rstest;

    #[rstest]
    #[case("example.com", true)]
    #[case("example.com:8080", true)]
    #[case("127.0.0.1:80", true)]
    #[case("[::1]", true)]
    #[case("[2001:db8::1]:443", true)]
    #[case("", false)]
    #[case("exa mple.com", false)]
    #[case("example.com:http", false)]
    #[case("[::1", false)]
    #[case("http://example.com", false)]
    fn host_syntax(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_host(input), expected);
    }

    #[test]
    fn host_value_is_kept_as_text() {
        let (section, notes) =
            finished_section(MessageKind::Request, &[("Host", "bad host")]);
        assert_eq!(
            section.get("host"),
            Some(&FieldValue::Text("bad host".into()))
        );
        assert!(notes.contains(&FIELD_BAD_SYNTAX));
    }
}
