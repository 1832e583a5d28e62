// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Shared test utilities to reduce duplication across test modules.

use crate::config::LintConfig;
use crate::fields::{FieldFinder, FieldSection, MessageKind, MessageView};
use crate::message::{RequestLinter, ResponseLinter};
use crate::note::Notes;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

/// Wed, 21 Oct 2015 07:28:00 GMT
pub const T0: i64 = 1_445_412_480;

/// Format epoch seconds as an IMF-fixdate.
pub fn http_date(secs: i64) -> String {
    httpdate::fmt_http_date(UNIX_EPOCH + Duration::from_secs(secs as u64))
}

/// An empty header section backed by the shared rule registry.
pub fn make_section(kind: MessageKind) -> FieldSection {
    FieldSection::new(
        kind,
        FieldFinder::shared(),
        &crate::config::Limits::default(),
    )
}

/// Process and finish a header section built from `lines`.
pub fn finished_section(kind: MessageKind, lines: &[(&str, &str)]) -> (FieldSection, Notes) {
    let mut notes = Notes::new([("message", "This message")]);
    let mut section = make_section(kind);
    section.process(lines.iter().copied(), &mut notes);
    section.finish(&mut notes);
    (section, notes)
}

/// Finish and post-check a standalone response header section.
pub fn post_checked_response(
    lines: &[(&str, &str)],
    cache: Option<&crate::cache::CacheState>,
) -> Notes {
    let (section, mut notes) = finished_section(MessageKind::Response, lines);
    let view = MessageView {
        kind: MessageKind::Response,
        headers: &section,
        method: None,
        status: Some(200),
        cache,
        related: None,
    };
    section.post_check(&view, &mut notes);
    notes
}

/// A completed request with no content.
pub fn make_request(method: &str, headers: &[(&str, &str)]) -> Arc<RequestLinter> {
    let mut req = RequestLinter::new(&LintConfig::default());
    req.process_request_topline(method, "/", "HTTP/1.1");
    req.process_headers(headers.iter().copied());
    req.finish_content(true, std::iter::empty::<(&str, &str)>());
    Arc::new(req)
}

/// A completed response with no content.
pub fn make_response(
    status: &str,
    headers: &[(&str, &str)],
    request: Option<Arc<RequestLinter>>,
    observed_at: Option<i64>,
) -> ResponseLinter {
    make_response_with_body(status, headers, request, observed_at, &[])
}

/// A completed response whose content is fed as the given chunks.
pub fn make_response_with_body(
    status: &str,
    headers: &[(&str, &str)],
    request: Option<Arc<RequestLinter>>,
    observed_at: Option<i64>,
    chunks: &[&[u8]],
) -> ResponseLinter {
    let mut resp = ResponseLinter::new(&LintConfig::default(), request, observed_at);
    resp.process_response_topline("HTTP/1.1", status, "OK");
    resp.process_headers(headers.iter().copied());
    for chunk in chunks {
        resp.feed_content(chunk);
    }
    resp.finish_content(true, std::iter::empty::<(&str, &str)>());
    resp
}

/// Gzip `data` in memory.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).expect("write gzip");
    enc.finish().expect("finish gzip")
}
