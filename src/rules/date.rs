// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::rules::{parse_date_field, FieldRule};

pub struct Date;

impl FieldRule for Date {
    fn name(&self) -> &'static str {
        "Date"
    }

    fn parse(&self, raw: &str, notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        parse_date_field(raw, notes)
    }
}
