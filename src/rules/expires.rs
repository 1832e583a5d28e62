// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::rules::{parse_date_field, FieldRule};

/// A malformed `Expires` still counts as present: caches must treat it as
/// already expired, so the cache engine checks presence separately from
/// the parsed value.
pub struct Expires;

impl FieldRule for Expires {
    fn name(&self) -> &'static str {
        "Expires"
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn parse(&self, raw: &str, notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        parse_date_field(raw, notes)
    }
}
