// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Structured Field Values (RFC 8941 / RFC 9651) parser.
//!
//! Unlike the RFC, duplicate dictionary and parameter keys keep their first
//! value; every repeated key is reported back so the caller can note it.

use base64::Engine;
use std::fmt;

/// Top-level type a structured field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfType {
    Item,
    List,
    Dictionary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BareItem {
    Integer(i64),
    Decimal(f64),
    String(String),
    Token(String),
    ByteSequence(Vec<u8>),
    Boolean(bool),
    Date(i64),
    DisplayString(String),
}

impl BareItem {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BareItem::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BareItem::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Token or string content.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BareItem::Token(s) | BareItem::String(s) | BareItem::DisplayString(s) => Some(s),
            _ => None,
        }
    }
}

pub type Parameters = Vec<(String, BareItem)>;

/// Look up a parameter by key.
pub fn param<'a>(params: &'a Parameters, key: &str) -> Option<&'a BareItem> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub value: BareItem,
    pub params: Parameters,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Item(Item),
    InnerList { items: Vec<Item>, params: Parameters },
}

impl ListEntry {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ListEntry::Item(i) => Some(i),
            ListEntry::InnerList { .. } => None,
        }
    }

    pub fn params(&self) -> &Parameters {
        match self {
            ListEntry::Item(i) => &i.params,
            ListEntry::InnerList { params, .. } => params,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    Item(Item),
    List(Vec<ListEntry>),
    Dictionary(Vec<(String, ListEntry)>),
}

impl StructuredValue {
    /// Dictionary member by key; `None` for other shapes.
    pub fn get(&self, key: &str) -> Option<&ListEntry> {
        match self {
            StructuredValue::Dictionary(members) => {
                members.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

/// Parse failure at a byte offset of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for SfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.position)
    }
}

impl std::error::Error for SfError {}

/// A parsed field plus the keys that were repeated in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: StructuredValue,
    pub duplicate_keys: Vec<String>,
}

/// Parse `input` as the given top-level type.
pub fn parse(input: &str, ty: SfType) -> Result<Parsed, SfError> {
    let mut p = Parser {
        input: input.as_bytes(),
        pos: 0,
        duplicate_keys: Vec::new(),
    };
    p.skip_sp();
    let value = match ty {
        SfType::Item => StructuredValue::Item(p.parse_item()?),
        SfType::List => StructuredValue::List(p.parse_list()?),
        SfType::Dictionary => StructuredValue::Dictionary(p.parse_dictionary()?),
    };
    p.skip_sp();
    if !p.eof() {
        return Err(p.fail("unexpected trailing characters"));
    }
    Ok(Parsed {
        value,
        duplicate_keys: p.duplicate_keys,
    })
}

/// Show the input around `pos`, bracketing the offending character.
pub fn error_context(input: &str, pos: usize) -> String {
    const WINDOW: usize = 10;
    let mut at = pos.min(input.len());
    while !input.is_char_boundary(at) {
        at -= 1;
    }
    let mut start = at.saturating_sub(WINDOW);
    while !input.is_char_boundary(start) {
        start -= 1;
    }
    let ch_len = input[at..].chars().next().map_or(0, char::len_utf8);
    let mut end = (at + ch_len + WINDOW).min(input.len());
    while !input.is_char_boundary(end) {
        end += 1;
    }
    let before = &input[start..at];
    let ch = &input[at..at + ch_len];
    let after = &input[at + ch_len..end];
    format!(
        "{}{}[{}]{}{}",
        if start > 0 { "..." } else { "" },
        before,
        ch,
        after,
        if end < input.len() { "..." } else { "" }
    )
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    duplicate_keys: Vec<String>,
}

impl Parser<'_> {
    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn fail(&self, message: &str) -> SfError {
        SfError {
            message: message.to_string(),
            position: self.pos,
        }
    }

    fn skip_sp(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn skip_ows(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ListEntry>, SfError> {
        let mut members = Vec::new();
        while !self.eof() {
            members.push(self.parse_item_or_inner_list()?);
            self.skip_ows();
            if self.eof() {
                return Ok(members);
            }
            if self.peek() != Some(b',') {
                return Err(self.fail("expected ',' between list members"));
            }
            self.pos += 1;
            self.skip_ows();
            if self.eof() {
                return Err(self.fail("trailing ',' in list"));
            }
        }
        Ok(members)
    }

    fn parse_dictionary(&mut self) -> Result<Vec<(String, ListEntry)>, SfError> {
        let mut members: Vec<(String, ListEntry)> = Vec::new();
        while !self.eof() {
            let key = self.parse_key()?;
            let member = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_item_or_inner_list()?
            } else {
                ListEntry::Item(Item {
                    value: BareItem::Boolean(true),
                    params: self.parse_parameters()?,
                })
            };
            if members.iter().any(|(k, _)| *k == key) {
                self.duplicate_keys.push(key);
            } else {
                members.push((key, member));
            }
            self.skip_ows();
            if self.eof() {
                return Ok(members);
            }
            if self.peek() != Some(b',') {
                return Err(self.fail("expected ',' between dictionary members"));
            }
            self.pos += 1;
            self.skip_ows();
            if self.eof() {
                return Err(self.fail("trailing ',' in dictionary"));
            }
        }
        Ok(members)
    }

    fn parse_item_or_inner_list(&mut self) -> Result<ListEntry, SfError> {
        if self.peek() == Some(b'(') {
            self.parse_inner_list()
        } else {
            Ok(ListEntry::Item(self.parse_item()?))
        }
    }

    fn parse_inner_list(&mut self) -> Result<ListEntry, SfError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_sp();
            match self.peek() {
                None => return Err(self.fail("unterminated inner list")),
                Some(b')') => {
                    self.pos += 1;
                    let params = self.parse_parameters()?;
                    return Ok(ListEntry::InnerList { items, params });
                }
                Some(_) => {
                    items.push(self.parse_item()?);
                    if !matches!(self.peek(), Some(b' ') | Some(b')')) {
                        return Err(self.fail("expected ' ' or ')' in inner list"));
                    }
                }
            }
        }
    }

    fn parse_item(&mut self) -> Result<Item, SfError> {
        let value = self.parse_bare_item()?;
        let params = self.parse_parameters()?;
        Ok(Item { value, params })
    }

    fn parse_parameters(&mut self) -> Result<Parameters, SfError> {
        let mut params: Parameters = Vec::new();
        while self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_sp();
            let key = self.parse_key()?;
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.parse_bare_item()?
            } else {
                BareItem::Boolean(true)
            };
            if params.iter().any(|(k, _)| *k == key) {
                self.duplicate_keys.push(key);
            } else {
                params.push((key, value));
            }
        }
        Ok(params)
    }

    fn parse_key(&mut self) -> Result<String, SfError> {
        match self.peek() {
            Some(c) if c.is_ascii_lowercase() || c == b'*' => {}
            _ => return Err(self.fail("key must start with a lowercase letter or '*'")),
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, b'_' | b'-' | b'.' | b'*')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_bare_item(&mut self) -> Result<BareItem, SfError> {
        match self.peek() {
            Some(c) if c == b'-' || c.is_ascii_digit() => self.parse_number(),
            Some(b'"') => self.parse_string().map(BareItem::String),
            Some(c) if c == b'*' || c.is_ascii_alphabetic() => Ok(self.parse_token()),
            Some(b':') => self.parse_byte_sequence(),
            Some(b'?') => self.parse_boolean(),
            Some(b'@') => self.parse_date(),
            Some(b'%') => self.parse_display_string(),
            None => Err(self.fail("expected an item, found end of input")),
            Some(_) => Err(self.fail("unexpected character")),
        }
    }

    fn parse_number(&mut self) -> Result<BareItem, SfError> {
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            return Err(self.fail("expected a digit"));
        }
        let start = self.pos;
        let mut dot: Option<usize> = None;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == b'.' && dot.is_none() {
                if self.pos - start > 12 {
                    return Err(self.fail("decimal has too many integer digits"));
                }
                dot = Some(self.pos);
                self.pos += 1;
            } else {
                break;
            }
            let len = self.pos - start;
            if (dot.is_none() && len > 15) || (dot.is_some() && len > 16) {
                return Err(self.fail("number is too long"));
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.fail("invalid number"))?;
        match dot {
            None => {
                let n: i64 = text.parse().map_err(|_| self.fail("invalid integer"))?;
                Ok(BareItem::Integer(if negative { -n } else { n }))
            }
            Some(d) => {
                let frac = self.pos - d - 1;
                if frac == 0 {
                    return Err(self.fail("decimal ends with '.'"));
                }
                if frac > 3 {
                    return Err(self.fail("decimal has too many fractional digits"));
                }
                let n: f64 = text.parse().map_err(|_| self.fail("invalid decimal"))?;
                Ok(BareItem::Decimal(if negative { -n } else { n }))
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, SfError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fail("unterminated string")),
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ (b'"' | b'\\')) => {
                            out.push(c as char);
                            self.pos += 1;
                        }
                        _ => return Err(self.fail("invalid escape in string")),
                    }
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) if (0x20..=0x7e).contains(&c) => {
                    out.push(c as char);
                    self.pos += 1;
                }
                Some(_) => return Err(self.fail("invalid character in string")),
            }
        }
    }

    fn parse_token(&mut self) -> BareItem {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            if crate::helpers::token::is_tchar(c as char) || c == b':' || c == b'/' {
                self.pos += 1;
            } else {
                break;
            }
        }
        BareItem::Token(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_byte_sequence(&mut self) -> Result<BareItem, SfError> {
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b':' {
                break;
            }
            if !(c.is_ascii_alphanumeric() || matches!(c, b'+' | b'/' | b'=')) {
                return Err(self.fail("invalid character in byte sequence"));
            }
            self.pos += 1;
        }
        if self.eof() {
            return Err(self.fail("unterminated byte sequence"));
        }
        let encoded = &self.input[start..self.pos];
        self.pos += 1;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(encoded))
            .map(BareItem::ByteSequence)
            .map_err(|_| SfError {
                message: "invalid base64 in byte sequence".to_string(),
                position: start,
            })
    }

    fn parse_boolean(&mut self) -> Result<BareItem, SfError> {
        self.pos += 1;
        let value = match self.peek() {
            Some(b'1') => true,
            Some(b'0') => false,
            _ => return Err(self.fail("boolean must be ?0 or ?1")),
        };
        self.pos += 1;
        Ok(BareItem::Boolean(value))
    }

    fn parse_date(&mut self) -> Result<BareItem, SfError> {
        self.pos += 1;
        match self.parse_number()? {
            BareItem::Integer(i) => Ok(BareItem::Date(i)),
            _ => Err(self.fail("date must be an integer")),
        }
    }

    fn parse_display_string(&mut self) -> Result<BareItem, SfError> {
        self.pos += 1;
        if self.peek() != Some(b'"') {
            return Err(self.fail("display string must start with '%\"'"));
        }
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.fail("unterminated display string")),
                Some(b'%') => {
                    let hex = self
                        .input
                        .get(self.pos + 1..self.pos + 3)
                        .filter(|h| h.iter().all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(c)))
                        .ok_or_else(|| self.fail("invalid percent-encoding in display string"))?;
                    let text = std::str::from_utf8(hex).map_err(|_| self.fail("invalid hex"))?;
                    let byte =
                        u8::from_str_radix(text, 16).map_err(|_| self.fail("invalid hex"))?;
                    bytes.push(byte);
                    self.pos += 3;
                }
                Some(b'"') => {
                    self.pos += 1;
                    return String::from_utf8(bytes)
                        .map(BareItem::DisplayString)
                        .map_err(|_| self.fail("display string is not valid UTF-8"));
                }
                Some(c) if (0x20..=0x7e).contains(&c) => {
                    bytes.push(c);
                    self.pos += 1;
                }
                Some(_) => return Err(self.fail("invalid character in display string")),
            }
        }
    }
}
