// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Captured request/response exchange, as read from capture files.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_version() -> String {
    "HTTP/1.1".to_string()
}

fn default_complete() -> bool {
    true
}

/// Request portion of an exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub uri: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_headers")]
    pub headers: Vec<(String, String)>,
    /// Content as sent on the wire, base64 in JSON.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::serde_helpers::serialize_body",
        deserialize_with = "crate::serde_helpers::deserialize_body"
    )]
    pub body: Option<Bytes>,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_headers")]
    pub trailers: Vec<(String, String)>,
    #[serde(default = "default_complete")]
    pub complete: bool,
}

/// Response portion of an exchange (absent when the upstream failed).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    #[serde(default = "default_version")]
    pub version: String,
    /// Status code text exactly as received.
    #[serde(deserialize_with = "crate::serde_helpers::deserialize_status")]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_headers")]
    pub headers: Vec<(String, String)>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::serde_helpers::serialize_body",
        deserialize_with = "crate::serde_helpers::deserialize_body"
    )]
    pub body: Option<Bytes>,
    #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_headers")]
    pub trailers: Vec<(String, String)>,
    #[serde(default = "default_complete")]
    pub complete: bool,
}

/// One captured exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// When the response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
    pub request: RequestInfo,
    #[serde(default)]
    pub response: Option<ResponseInfo>,
}

impl HttpExchange {
    /// A bodiless exchange skeleton for construction sites and tests.
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            id: None,
            observed_at: None,
            request: RequestInfo {
                method: method.to_string(),
                uri: uri.to_string(),
                version: default_version(),
                headers: Vec::new(),
                body: None,
                trailers: Vec::new(),
                complete: true,
            },
            response: None,
        }
    }

    /// Attach a bodiless response with the given status and headers.
    pub fn with_response(mut self, status: u16, headers: &[(&str, &str)]) -> Self {
        self.response = Some(ResponseInfo {
            version: default_version(),
            status: status.to_string(),
            reason: String::new(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: None,
            trailers: Vec::new(),
            complete: true,
        });
        self
    }
}
