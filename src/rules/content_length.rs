// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::helpers::token::is_digits;
use crate::rules::{FieldRule, Syntax};

pub struct ContentLength;

impl FieldRule for ContentLength {
    fn name(&self) -> &'static str {
        "Content-Length"
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_digits)
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        raw.parse::<u64>().ok().map(FieldValue::Integer)
    }
}
