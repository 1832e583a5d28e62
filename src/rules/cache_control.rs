// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::helpers::headers::{is_token_or_quoted_string, trim_ows, unquote};
use crate::helpers::token::{is_digits, is_token};
use crate::note::{Category, Level, NoteKind};
use crate::rules::{FieldRule, Syntax};

/// Directives whose argument must be delta-seconds.
const DELTA_SECONDS: &[&str] = &[
    "max-age",
    "s-maxage",
    "min-fresh",
    "stale-while-revalidate",
    "stale-if-error",
];

/// Members become [`FieldValue::Directive`]s. Names keep their case so the
/// cache engine can flag miscapitalisation; quoted arguments are unquoted.
pub struct CacheControl;

impl FieldRule for CacheControl {
    fn name(&self) -> &'static str {
        "Cache-Control"
    }

    fn discipline(&self) -> Discipline {
        Discipline::List
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_directive)
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        let (name, value) = match raw.split_once('=') {
            Some((name, value)) => (trim_ows(name), Some(unquote(trim_ows(value)))),
            None => (raw, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(FieldValue::Directive {
            name: name.to_string(),
            value,
        })
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        for member in value.as_list() {
            let FieldValue::Directive { name, value } = member else {
                continue;
            };
            let lower = name.to_ascii_lowercase();
            if !DELTA_SECONDS.contains(&lower.as_str()) {
                continue;
            }
            let arg = value.as_deref().unwrap_or_default();
            if !is_digits(arg) {
                notes.add(
                    &CC_BAD_DELTA_SECONDS,
                    &[("directive", &lower), ("value", &arg)],
                );
            }
        }
    }
}

/// `token [ "=" ( token / quoted-string ) ]`
fn is_directive(s: &str) -> bool {
    match s.split_once('=') {
        Some((name, value)) => is_token(name) && is_token_or_quoted_string(value),
        None => is_token(s),
    }
}

pub static CC_BAD_DELTA_SECONDS: NoteKind = NoteKind {
    id: "CC_BAD_DELTA_SECONDS",
    category: Category::Caching,
    level: Level::Bad,
    summary: "The {directive} cache directive needs a number of seconds.",
    detail: "{directive} takes a non-negative integer argument (delta-seconds), but '{value}' was given. Caches will ignore the directive.",
};
