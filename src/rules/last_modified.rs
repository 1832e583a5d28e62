// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::rules::{parse_date_field, FieldRule};

pub struct LastModified;

impl FieldRule for LastModified {
    fn name(&self) -> &'static str {
        "Last-Modified"
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn parse(&self, raw: &str, notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        parse_date_field(raw, notes)
    }
}
