// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! One field name's lines within a section, and the discipline mechanics
//! that turn them into a value.

use super::structured;
use super::{
    Discipline, FieldNotes, FieldValue, MessageKind, MessageView, FIELD_BAD_SYNTAX,
    FIELD_DEPRECATED, FIELD_NAME_BAD_SYNTAX, FIELD_WRONG_MESSAGE, JSON_PARSE_ERROR,
    SINGLE_FIELD_REPEAT, STRUCTURED_FIELD_DUPLICATE_KEY, STRUCTURED_FIELD_PARSE_ERROR,
};
use crate::helpers::headers::split_commas_respecting_quotes;
use crate::rules::FieldRule;

/// A raw value (or list element) and the line it came from.
#[derive(Debug, Clone)]
struct RawValue {
    text: String,
    offset: usize,
}

/// Handles every line carrying one field name in one section.
pub struct FieldHandler {
    rule: &'static dyn FieldRule,
    wire_name: String,
    norm_name: String,
    inputs: Vec<RawValue>,
}

impl FieldHandler {
    pub fn new(rule: &'static dyn FieldRule, wire_name: &str) -> Self {
        Self {
            rule,
            wire_name: wire_name.to_string(),
            norm_name: wire_name.to_ascii_lowercase(),
            inputs: Vec::new(),
        }
    }

    pub fn rule(&self) -> &'static dyn FieldRule {
        self.rule
    }

    /// Name as first seen on the wire.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn canonical_name(&self) -> &'static str {
        self.rule.name()
    }

    pub fn norm_name(&self) -> &str {
        &self.norm_name
    }

    /// Wire offsets of every line routed here.
    pub fn offsets(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.inputs.iter().map(|r| r.offset).collect();
        out.dedup();
        out
    }

    /// Buffer one line. List fields are split into elements here and each
    /// element is checked against the field grammar.
    pub fn handle_input(&mut self, value: &str, offset: usize, notes: &mut FieldNotes<'_>) {
        match self.rule.discipline() {
            Discipline::List => {
                for element in split_commas_respecting_quotes(value) {
                    if element.is_empty() {
                        continue;
                    }
                    self.check_syntax(element, notes);
                    self.inputs.push(RawValue {
                        text: element.to_string(),
                        offset,
                    });
                }
            }
            _ => self.inputs.push(RawValue {
                text: value.to_string(),
                offset,
            }),
        }
    }

    /// Produce this field's final value for a message of `kind`.
    pub fn finish(&mut self, kind: MessageKind, notes: &mut FieldNotes<'_>) -> FieldValue {
        let applicable = match kind {
            MessageKind::Request => self.rule.valid_in_requests(),
            MessageKind::Response => self.rule.valid_in_responses(),
        };
        if !applicable {
            notes.add(&FIELD_WRONG_MESSAGE, &[("message_type", &kind)]);
        }
        if !crate::helpers::token::is_token(&self.wire_name) {
            notes.add(&FIELD_NAME_BAD_SYNTAX, &[]);
        }
        if self.rule.deprecated() {
            notes.add(&FIELD_DEPRECATED, &[]);
        }
        if !applicable {
            return FieldValue::Null;
        }

        let value = match self.rule.discipline() {
            Discipline::Singleton => self.finish_singleton(notes),
            Discipline::List => FieldValue::List(
                self.inputs
                    .iter()
                    .filter_map(|raw| self.rule.parse(&raw.text, notes))
                    .collect(),
            ),
            Discipline::Broken => {
                let mut values = Vec::with_capacity(self.inputs.len());
                for raw in &self.inputs {
                    self.check_syntax(&raw.text, notes);
                    if let Some(v) = self.rule.parse(&raw.text, notes) {
                        values.push(v);
                    }
                }
                FieldValue::List(values)
            }
            Discipline::Structured(ty) => self.finish_structured(ty, notes),
            Discipline::Json => self.finish_json(notes),
        };

        if !value.is_null() {
            self.rule.evaluate(&value, notes);
        }
        value
    }

    pub fn post_check(&self, value: &FieldValue, msg: &MessageView<'_>, notes: &mut FieldNotes<'_>) {
        self.rule.post_check(value, msg, notes);
    }

    fn check_syntax(&self, text: &str, notes: &mut FieldNotes<'_>) {
        if let Some(syntax) = self.rule.syntax() {
            if !syntax(text) {
                notes.add(&FIELD_BAD_SYNTAX, &[("value", &text)]);
            }
        }
    }

    fn finish_singleton(&self, notes: &mut FieldNotes<'_>) -> FieldValue {
        if self.inputs.len() > 1 {
            notes.add(&SINGLE_FIELD_REPEAT, &[("count", &self.inputs.len())]);
        }
        let mut first = None;
        for (i, raw) in self.inputs.iter().enumerate() {
            self.check_syntax(&raw.text, notes);
            let parsed = self.rule.parse(&raw.text, notes);
            if i == 0 {
                first = parsed;
            }
        }
        first.unwrap_or(FieldValue::Null)
    }

    fn joined(&self) -> String {
        self.inputs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn finish_structured(&self, ty: structured::SfType, notes: &mut FieldNotes<'_>) -> FieldValue {
        let joined = self.joined();
        match structured::parse(&joined, ty) {
            Ok(parsed) => {
                for key in &parsed.duplicate_keys {
                    notes.add(&STRUCTURED_FIELD_DUPLICATE_KEY, &[("key", key)]);
                }
                FieldValue::Structured(parsed.value)
            }
            Err(e) => {
                let context = structured::error_context(&joined, e.position);
                notes.add(
                    &STRUCTURED_FIELD_PARSE_ERROR,
                    &[("error", &e.message), ("context", &context)],
                );
                FieldValue::Null
            }
        }
    }

    fn finish_json(&self, notes: &mut FieldNotes<'_>) -> FieldValue {
        let wrapped = format!("[{}]", self.joined());
        match serde_json::from_str::<serde_json::Value>(&wrapped) {
            Ok(v) => FieldValue::Json(v),
            Err(e) => {
                notes.add(&JSON_PARSE_ERROR, &[("error", &e)]);
                FieldValue::Null
            }
        }
    }
}
