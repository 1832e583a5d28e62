// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Serde helpers for capture records: header lists, base64 bodies and
//! status codes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serializer};
use std::collections::BTreeMap;

/// Headers as `[[name, value], ...]` in wire order, or as a `{name: value}`
/// object (one line per name, order not preserved).
pub fn deserialize_headers<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Pairs(Vec<(String, String)>),
        Map(BTreeMap<String, String>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Pairs(pairs) => pairs,
        Repr::Map(map) => map.into_iter().collect(),
    })
}

pub fn serialize_body<S>(body: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match body {
        Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize_body<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| STANDARD.decode(s.as_bytes()).map(Bytes::from))
        .transpose()
        .map_err(de::Error::custom)
}

/// Status codes are kept as text so malformed ones reach the linter.
pub fn deserialize_status<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Number(n) => n.to_string(),
        Repr::Text(s) => s,
    })
}
