// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::helpers::headers::is_token_or_quoted_string;
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind};
use crate::rules::{FieldRule, Syntax};

pub struct Pragma;

impl FieldRule for Pragma {
    fn name(&self) -> &'static str {
        "Pragma"
    }

    fn discipline(&self) -> Discipline {
        Discipline::List
    }

    fn deprecated(&self) -> bool {
        true
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(|s| match s.split_once('=') {
            Some((name, value)) => is_token(name) && is_token_or_quoted_string(value),
            None => is_token(s),
        })
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        Some(FieldValue::Text(raw.to_ascii_lowercase()))
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        let directives = value.text_items();
        if directives.iter().any(|d| d == "no-cache") {
            notes.add(&PRAGMA_NO_CACHE, &[]);
        }
        let others: Vec<&str> = directives
            .iter()
            .map(String::as_str)
            .filter(|d| *d != "no-cache")
            .collect();
        if !others.is_empty() {
            notes.add(&PRAGMA_OTHER, &[("directives", &others.join(", "))]);
        }
    }
}

pub static PRAGMA_NO_CACHE: NoteKind = NoteKind {
    id: "PRAGMA_NO_CACHE",
    category: Category::Caching,
    level: Level::Warn,
    summary: "Pragma: no-cache is obsolete.",
    detail: "Pragma: no-cache was a request directive for HTTP/1.0 caches and has no defined meaning in responses. Use Cache-Control: no-cache instead.",
};

pub static PRAGMA_OTHER: NoteKind = NoteKind {
    id: "PRAGMA_OTHER",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The {field_name} field is being used in a non-standard way.",
    detail: "Only 'no-cache' is defined for Pragma; '{directives}' will be ignored by caches.",
};
