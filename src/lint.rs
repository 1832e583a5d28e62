// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Linting of whole captured exchanges.

use crate::cache::CacheState;
use crate::config::LintConfig;
use crate::content::ContentProcessor;
use crate::http_transaction::HttpExchange;
use crate::message::{RequestLinter, ResponseLinter};
use crate::note::RenderedNote;
use serde::Serialize;
use std::sync::Arc;

/// Decoded-content summary of one message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContentSummary {
    pub wire_len: usize,
    pub content_len: usize,
    pub content_hash: Option<String>,
    pub decode_ok: bool,
}

impl From<&ContentProcessor> for ContentSummary {
    fn from(content: &ContentProcessor) -> Self {
        Self {
            wire_len: content.wire_len(),
            content_len: content.content_len(),
            content_hash: content.content_hash_hex(),
            decode_ok: content.decode_ok(),
        }
    }
}

/// Notes and content summary of one message.
#[derive(Serialize, Debug, Clone)]
pub struct MessageReport {
    pub notes: Vec<RenderedNote>,
    pub content: Option<ContentSummary>,
}

/// Everything found about one exchange.
#[derive(Serialize, Debug, Clone)]
pub struct ExchangeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub request: MessageReport,
    pub response: Option<MessageReport>,
    pub cache: Option<CacheState>,
}

/// Lint an exchange: the request is driven to completion first, then the
/// response is linted in its context. Content is fed in `chunk_size` pieces.
pub fn lint_exchange(exchange: &HttpExchange, cfg: &LintConfig, chunk_size: usize) -> ExchangeReport {
    let chunk_size = chunk_size.max(1);
    let req_info = &exchange.request;

    let mut request = RequestLinter::new(cfg);
    request.process_request_topline(&req_info.method, &req_info.uri, &req_info.version);
    request.process_headers(req_info.headers.iter().map(|(n, v)| (n, v)));
    if let Some(body) = &req_info.body {
        for chunk in body.chunks(chunk_size) {
            request.feed_content(chunk);
        }
    }
    request.finish_content(
        req_info.complete,
        req_info.trailers.iter().map(|(n, v)| (n, v)),
    );
    let request = Arc::new(request);

    let mut report = ExchangeReport {
        id: exchange.id.clone(),
        request: MessageReport {
            notes: request.notes().render(),
            content: request.content().map(ContentSummary::from),
        },
        response: None,
        cache: None,
    };

    let Some(resp_info) = &exchange.response else {
        tracing::debug!(uri = %req_info.uri, "exchange has no response");
        return report;
    };
    let observed_at = exchange.observed_at.map(|t| t.timestamp());
    let mut response = ResponseLinter::new(cfg, Some(Arc::clone(&request)), observed_at);
    response.process_response_topline(&resp_info.version, &resp_info.status, &resp_info.reason);
    response.process_headers(resp_info.headers.iter().map(|(n, v)| (n, v)));
    if let Some(body) = &resp_info.body {
        for chunk in body.chunks(chunk_size) {
            response.feed_content(chunk);
        }
    }
    response.finish_content(
        resp_info.complete,
        resp_info.trailers.iter().map(|(n, v)| (n, v)),
    );

    report.response = Some(MessageReport {
        notes: response.notes().render(),
        content: response.content().map(ContentSummary::from),
    });
    report.cache = response.cache().cloned();
    report
}
