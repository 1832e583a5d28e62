// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind};
use crate::rules::{FieldRule, Syntax};

pub struct Authorization;

impl FieldRule for Authorization {
    fn name(&self) -> &'static str {
        "Authorization"
    }

    fn valid_in_responses(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_credentials)
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        let Some(text) = value.as_text() else {
            return;
        };
        let scheme = text.split(' ').next().unwrap_or_default();
        if scheme.eq_ignore_ascii_case("basic") {
            notes.add(&AUTHORIZATION_BASIC, &[]);
        }
    }
}

/// `auth-scheme [ 1*SP ( token68 / #auth-param ) ]`; only the scheme is
/// checked strictly.
fn is_credentials(s: &str) -> bool {
    let mut parts = s.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    is_token(scheme) && parts.next().map_or(true, |rest| !rest.trim().is_empty())
}

pub static AUTHORIZATION_BASIC: NoteKind = NoteKind {
    id: "AUTHORIZATION_BASIC",
    category: Category::Security,
    level: Level::Warn,
    summary: "{message} uses Basic authentication.",
    detail: "Basic credentials are only base64-encoded, not encrypted. They can be read by anyone who sees the message unless the connection is protected by TLS.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{MessageKind, FIELD_BAD_SYNTAX};
    use crate::test_helpers::finished_section;
    use rstest::rstest;

    #[rstest]
    #[case("Basic dXNlcjpwYXNz", true)]
    #[case("Bearer abc.def", true)]
    #[case("Negotiate", true)]
    #[case("", false)]
    #[case("Bad/scheme token", false)]
    #[case("Basic   ", false)]
    fn credentials_syntax(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_credentials(input), expected);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz", true)]
    #[case("basic dXNlcjpwYXNz", true)]
    #[case("Bearer token", false)]
    fn basic_scheme_is_flagged(#[case] raw: &str, #[case] expected: bool) {
        let (_section, notes) = finished_section(MessageKind::Request, &[("Authorization", raw)]);
        assert_eq!(notes.contains(&AUTHORIZATION_BASIC), expected);
        assert!(!notes.contains(&FIELD_BAD_SYNTAX));
    }
}
