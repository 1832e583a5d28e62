// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind};
use crate::rules::{FieldRule, Syntax};

/// Codings in the order they were applied; values are lowercased.
pub struct ContentEncoding;

impl FieldRule for ContentEncoding {
    fn name(&self) -> &'static str {
        "Content-Encoding"
    }

    fn discipline(&self) -> Discipline {
        Discipline::List
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_token)
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        Some(FieldValue::Text(raw.to_ascii_lowercase()))
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        if value.text_items().iter().any(|c| c == "identity") {
            notes.add(&CONTENT_ENCODING_IDENTITY, &[]);
        }
    }
}

pub static CONTENT_ENCODING_IDENTITY: NoteKind = NoteKind {
    id: "CONTENT_ENCODING_IDENTITY",
    category: Category::ContentNegotiation,
    level: Level::Warn,
    summary: "The identity content-coding isn't necessary.",
    detail: "'identity' means no coding was applied. It is only meaningful in Accept-Encoding and should not be listed in {field_name}.",
};
