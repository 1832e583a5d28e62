// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::note::{Category, Level, NoteKind};
use crate::rules::FieldRule;

/// Network Error Logging policy: a JSON object per line.
pub struct Nel;

impl FieldRule for Nel {
    fn name(&self) -> &'static str {
        "NEL"
    }

    fn discipline(&self) -> Discipline {
        Discipline::Json
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        let FieldValue::Json(serde_json::Value::Array(policies)) = value else {
            return;
        };
        for (index, policy) in policies.iter().enumerate() {
            let Some(policy) = policy.as_object() else {
                notes.add(&NEL_NOT_OBJECT, &[("index", &index)]);
                continue;
            };
            if !policy.get("report_to").is_some_and(serde_json::Value::is_string) {
                notes.add(&NEL_BAD_MEMBER, &[("index", &index), ("member", &"report_to")]);
            }
            if !policy.get("max_age").is_some_and(serde_json::Value::is_u64) {
                notes.add(&NEL_BAD_MEMBER, &[("index", &index), ("member", &"max_age")]);
            }
            for fraction in ["success_fraction", "failure_fraction"] {
                let Some(v) = policy.get(fraction) else {
                    continue;
                };
                if !v.as_f64().is_some_and(|f| (0.0..=1.0).contains(&f)) {
                    notes.add(&NEL_BAD_MEMBER, &[("index", &index), ("member", &fraction)]);
                }
            }
        }
    }
}

pub static NEL_NOT_OBJECT: NoteKind = NoteKind {
    id: "NEL_NOT_OBJECT",
    category: Category::General,
    level: Level::Bad,
    summary: "{field_name} policy {index} isn't a JSON object.",
    detail: "Each {field_name} value must be a JSON object describing a logging policy. This one will be ignored.",
};

pub static NEL_BAD_MEMBER: NoteKind = NoteKind {
    id: "NEL_BAD_MEMBER",
    category: Category::General,
    level: Level::Bad,
    summary: "{field_name} policy {index} has a missing or invalid '{member}'.",
    detail: "report_to must be a string, max_age a non-negative integer and the sampling fractions numbers between 0 and 1. Browsers ignore policies that don't comply.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MessageKind;
    use crate::test_helpers::finished_section;
    use rstest::rstest;

    #[rstest]
    #[case("{\"report_to\": \"default\", \"max_age\": 2592000}", 0, 0)]
    #[case("{\"report_to\": \"default\"}", 0, 1)]
    #[case("{\"max_age\": -1}", 0, 2)]
    #[case("{\"report_to\": \"a\", \"max_age\": 1, \"failure_fraction\": 1.5}", 0, 1)]
    #[case("\"nope\"", 1, 0)]
    fn nel_policies(#[case] raw: &str, #[case] not_object: usize, #[case] bad_members: usize) {
        let (_section, notes) = finished_section(MessageKind::Response, &[("NEL", raw)]);
        assert_eq!(notes.count(&NEL_NOT_OBJECT), not_object);
        assert_eq!(notes.count(&NEL_BAD_MEMBER), bad_members);
    }
}
