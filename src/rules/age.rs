// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{FieldNotes, FieldValue};
use crate::helpers::token::is_digits;
use crate::rules::{FieldRule, Syntax};

pub struct Age;

impl FieldRule for Age {
    fn name(&self) -> &'static str {
        "Age"
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_digits)
    }

    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        raw.parse::<u64>().ok().map(FieldValue::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{MessageKind, FIELD_BAD_SYNTAX};
    use crate::test_helpers::finished_section;
    use rstest::rstest;

    #[rstest]
    #[case("0", Some(0), false)]
    #[case("3600", Some(3600), false)]
    #[case("-5", None, true)]
    #[case("1.5", None, true)]
    #[case("abc", None, true)]
    fn age_values(
        #[case] raw: &str,
        #[case] expected: Option<u64>,
        #[case] bad_syntax: bool,
    ) -> anyhow::Result<()> {
        let (section, notes) = finished_section(MessageKind::Response, &[("Age", raw)]);
        assert_eq!(
            section.get("age").and_then(FieldValue::as_integer),
            expected
        );
        assert_eq!(notes.contains(&FIELD_BAD_SYNTAX), bad_syntax);
        Ok(())
    }

    #[test]
    fn only_valid_in_responses() {
        let rule = Age;
        assert!(!rule.valid_in_requests());
        assert!(rule.valid_in_responses());
    }
}
