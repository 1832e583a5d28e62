// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! A header (or trailer) block and the per-field state derived from it.

use super::{
    FieldFinder, FieldHandler, FieldNotes, FieldValue, MessageKind, MessageView,
    FIELD_BLOCK_TOO_LARGE, FIELD_NAME_ENCODING, FIELD_TOO_LARGE, FIELD_VALUE_ENCODING,
};
use crate::config::Limits;
use crate::note::Notes;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Finished,
}

/// One header or trailer block of one message.
pub struct FieldSection {
    kind: MessageKind,
    prefix: &'static str,
    finder: Arc<FieldFinder>,
    max_field_size: usize,
    max_block_size: usize,
    text: Vec<(String, String)>,
    parsed: HashMap<String, FieldValue>,
    size: usize,
    handlers: Vec<FieldHandler>,
    index: HashMap<String, usize>,
    phase: Phase,
}

impl FieldSection {
    /// A header block.
    pub fn new(kind: MessageKind, finder: Arc<FieldFinder>, limits: &Limits) -> Self {
        Self::with_prefix(kind, "header", finder, limits)
    }

    /// A trailer block; its notes use `trailer-<name>` subjects.
    pub fn trailers(kind: MessageKind, finder: Arc<FieldFinder>, limits: &Limits) -> Self {
        Self::with_prefix(kind, "trailer", finder, limits)
    }

    fn with_prefix(
        kind: MessageKind,
        prefix: &'static str,
        finder: Arc<FieldFinder>,
        limits: &Limits,
    ) -> Self {
        Self {
            kind,
            prefix,
            finder,
            max_field_size: limits.max_field_size,
            max_block_size: limits.max_header_block_size,
            text: Vec::new(),
            parsed: HashMap::new(),
            size: 0,
            handlers: Vec::new(),
            index: HashMap::new(),
            phase: Phase::Open,
        }
    }

    /// Feed the block's lines in wire order. Lines are never dropped: bad
    /// encodings and oversized lines are noted and processing continues.
    pub fn process<I, N, V>(&mut self, lines: I, notes: &mut Notes)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if self.phase != Phase::Open {
            tracing::warn!(kind = %self.kind, "lines fed to a finished field section; ignoring");
            return;
        }
        let base = self.text.len();
        for (i, (name, value)) in lines.into_iter().enumerate() {
            let offset = base + i;
            let subject = format!("offset-{}", offset);
            let line_size = name.as_ref().len() + value.as_ref().len();
            let (name, name_ok) = decode_field_text(name.as_ref());
            let (value, value_ok) = decode_field_text(value.as_ref());
            let value = crate::helpers::headers::trim_ows(&value).to_string();
            if !name_ok {
                notes.add(subject.as_str(), &FIELD_NAME_ENCODING, &[("field_name", &name)]);
            }
            if !value_ok {
                notes.add(subject.as_str(), &FIELD_VALUE_ENCODING, &[("field_name", &name)]);
            }

            self.size += line_size;
            if line_size > self.max_field_size {
                notes.add(
                    subject.as_str(),
                    &FIELD_TOO_LARGE,
                    &[
                        ("field_name", &name),
                        ("field_size", &line_size),
                        ("max_size", &self.max_field_size),
                    ],
                );
            }

            let norm_name = name.to_ascii_lowercase();
            let idx = match self.index.get(&norm_name) {
                Some(&idx) => idx,
                None => {
                    let rule = self.finder.find(&norm_name);
                    self.handlers.push(FieldHandler::new(rule, &name));
                    let idx = self.handlers.len() - 1;
                    self.index.insert(norm_name.clone(), idx);
                    idx
                }
            };
            let mut field_notes = FieldNotes::new(notes, self.prefix, &norm_name, &name);
            self.handlers[idx].handle_input(&value, offset, &mut field_notes);
            self.text.push((name, value));
        }
        if self.size > self.max_block_size {
            notes.add(
                "",
                &FIELD_BLOCK_TOO_LARGE,
                &[("block_size", &self.size), ("max_size", &self.max_block_size)],
            );
        }
    }

    /// Phase one: finish every field in first-seen order and record its value.
    pub fn finish(&mut self, notes: &mut Notes) {
        if self.phase != Phase::Open {
            tracing::warn!(kind = %self.kind, "field section finished twice; ignoring");
            return;
        }
        for handler in &mut self.handlers {
            let norm_name = handler.norm_name().to_string();
            let mut field_notes =
                FieldNotes::new(notes, self.prefix, &norm_name, handler.wire_name());
            let value = handler.finish(self.kind, &mut field_notes);
            self.parsed.insert(norm_name, value);
        }
        self.phase = Phase::Finished;
    }

    /// Phase two: let every field look at the finished message.
    pub fn post_check(&self, msg: &MessageView<'_>, notes: &mut Notes) {
        if self.phase != Phase::Finished {
            tracing::warn!(kind = %self.kind, "post-check before finish; skipping");
            return;
        }
        for handler in &self.handlers {
            let value = self
                .parsed
                .get(handler.norm_name())
                .unwrap_or(&FieldValue::Null);
            let mut field_notes =
                FieldNotes::new(notes, self.prefix, handler.norm_name(), handler.wire_name());
            handler.post_check(value, msg, &mut field_notes);
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Finished value of a field by lowercased name. Always `None` before
    /// [`FieldSection::finish`] has run.
    pub fn get(&self, norm_name: &str) -> Option<&FieldValue> {
        if self.phase != Phase::Finished {
            return None;
        }
        self.parsed.get(norm_name)
    }

    /// Finished values keyed by lowercased name.
    pub fn parsed(&self) -> &HashMap<String, FieldValue> {
        &self.parsed
    }

    /// Whether any line with this lowercased name was received.
    pub fn contains(&self, norm_name: &str) -> bool {
        self.index.contains_key(norm_name)
    }

    /// Lines exactly as received (after decoding), duplicates preserved.
    pub fn text(&self) -> &[(String, String)] {
        &self.text
    }

    /// Total bytes of names and values.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handlers(&self) -> &[FieldHandler] {
        &self.handlers
    }
}

/// Decode field bytes, falling back to ISO-8859-1 when they aren't ASCII.
/// The flag is false when the fallback was needed.
fn decode_field_text(bytes: &[u8]) -> (String, bool) {
    if bytes.is_ascii() {
        (String::from_utf8_lossy(bytes).into_owned(), true)
    } else {
        (bytes.iter().map(|&b| b as char).collect(), false)
    }
}
