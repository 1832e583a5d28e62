// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::helpers::headers::unquote;
use crate::rules::{FieldRule, Syntax};

pub struct ETag;

impl FieldRule for ETag {
    fn name(&self) -> &'static str {
        "ETag"
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_entity_tag)
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        let (weak, opaque) = match raw.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        Some(FieldValue::EntityTag {
            weak,
            tag: unquote(opaque),
        })
    }
}

/// `[ W/ ] DQUOTE *etagc DQUOTE`
fn is_entity_tag(s: &str) -> bool {
    let opaque = s.strip_prefix("W/").unwrap_or(s);
    let Some(inner) = opaque
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    inner
        .bytes()
        .all(|b| b == 0x21 || (0x23..=0x7e).contains(&b) || b >= 0x80)
}
