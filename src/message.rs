// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Request and response linters.
//!
//! A message reader drives one linter per message: top-line, headers,
//! zero or more content chunks, then end-of-message with any trailers.
//! Every stage appends to the message's [`Notes`].

use crate::cache::{self, CacheInput, CacheState};
use crate::config::{Limits, LintConfig};
use crate::content::ContentProcessor;
use crate::fields::{FieldFinder, FieldSection, MessageKind, MessageView};
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind, Notes};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    TopLine,
    Headers,
    Content,
    Complete,
}

/// State shared by requests and responses.
struct MessageCore {
    kind: MessageKind,
    limits: Limits,
    headers: FieldSection,
    trailers: FieldSection,
    content: Option<ContentProcessor>,
    notes: Notes,
    phase: Phase,
}

impl MessageCore {
    fn new(kind: MessageKind, config: &LintConfig) -> Self {
        let finder = FieldFinder::shared();
        let label = match kind {
            MessageKind::Request => config.labels.request.clone(),
            MessageKind::Response => config.labels.response.clone(),
        };
        Self {
            kind,
            limits: config.limits.clone(),
            headers: FieldSection::new(kind, Arc::clone(&finder), &config.limits),
            trailers: FieldSection::trailers(kind, finder, &config.limits),
            content: None,
            notes: Notes::new([("message", label)]),
            phase: Phase::TopLine,
        }
    }

    fn begin_top_line(&mut self) -> bool {
        if self.phase != Phase::TopLine {
            tracing::warn!(kind = %self.kind, "top-line processed twice; ignoring");
            return false;
        }
        self.phase = Phase::Headers;
        true
    }

    fn check_version(&mut self, version: &str) {
        let ok = version
            .strip_prefix("HTTP/")
            .map(str::as_bytes)
            .is_some_and(|v| {
                v.len() == 3 && v[0].is_ascii_digit() && v[1] == b'.' && v[2].is_ascii_digit()
            });
        if !ok {
            self.notes
                .add("version", &VERSION_BAD_SYNTAX, &[("version", &version)]);
        }
    }

    fn process_headers<I, N, V>(&mut self, lines: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if self.phase > Phase::Headers {
            tracing::warn!(kind = %self.kind, "headers processed twice; ignoring");
            return;
        }
        self.headers.process(lines, &mut self.notes);
        self.finish_headers();
    }

    /// Finish the header section and set up content decoding from the
    /// finished `Content-Encoding`.
    fn finish_headers(&mut self) {
        self.headers.finish(&mut self.notes);
        let codings = self
            .headers
            .get("content-encoding")
            .map(|v| v.text_items())
            .unwrap_or_default();
        self.content = Some(ContentProcessor::new(
            &codings,
            self.limits.max_sample_size,
            &mut self.notes,
        ));
        self.phase = Phase::Content;
    }

    fn ensure_content_phase(&mut self) {
        if self.phase < Phase::Content {
            tracing::warn!(kind = %self.kind, "content received before headers; assuming none");
            self.finish_headers();
        }
    }

    fn feed_content(&mut self, chunk: &[u8]) {
        self.ensure_content_phase();
        if self.phase == Phase::Complete {
            tracing::warn!(kind = %self.kind, "content fed after end of message; ignoring");
            return;
        }
        if let Some(content) = self.content.as_mut() {
            content.feed(chunk, &mut self.notes);
        }
    }

    /// Trailers, content hash and completeness. Returns false when the
    /// message had already ended.
    fn end_content<I, N, V>(&mut self, is_complete: bool, trailers: I, expects_content: bool) -> bool
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.ensure_content_phase();
        if self.phase == Phase::Complete {
            tracing::warn!(kind = %self.kind, "message finished twice; ignoring");
            return false;
        }
        self.phase = Phase::Complete;
        self.trailers.process(trailers, &mut self.notes);
        self.trailers.finish(&mut self.notes);

        let wire_len = match self.content.as_mut() {
            Some(content) => {
                content.finish();
                content.wire_len()
            }
            None => 0,
        };
        if !is_complete {
            self.notes.add("", &CONTENT_INCOMPLETE, &[("wire_len", &wire_len)]);
            return true;
        }
        if !expects_content {
            return true;
        }
        let declared = self
            .headers
            .get("content-length")
            .and_then(|v| v.as_integer());
        if let Some(declared) = declared {
            if declared == wire_len as u64 {
                self.notes.add("header-content-length", &CL_CORRECT, &[]);
            } else {
                self.notes.add(
                    "header-content-length",
                    &CL_INCORRECT,
                    &[("content_length", &declared), ("wire_len", &wire_len)],
                );
            }
        }
        true
    }

    fn post_check(
        &mut self,
        method: Option<&str>,
        status: Option<u16>,
        cache: Option<&CacheState>,
        related: Option<&FieldSection>,
    ) {
        let view = MessageView {
            kind: self.kind,
            headers: &self.headers,
            method,
            status,
            cache,
            related,
        };
        self.headers.post_check(&view, &mut self.notes);
        self.trailers.post_check(&view, &mut self.notes);
    }
}

/// Lints one request.
pub struct RequestLinter {
    core: MessageCore,
    method: Option<String>,
    target: Option<String>,
}

impl RequestLinter {
    pub fn new(config: &LintConfig) -> Self {
        Self {
            core: MessageCore::new(MessageKind::Request, config),
            method: None,
            target: None,
        }
    }

    pub fn process_request_topline(&mut self, method: &str, target: &str, version: &str) {
        if !self.core.begin_top_line() {
            return;
        }
        if !is_token(method) {
            self.core
                .notes
                .add("method", &METHOD_BAD_SYNTAX, &[("method", &method)]);
        }
        let max = self.core.limits.max_uri_length;
        if target.len() > max {
            self.core.notes.add(
                "uri",
                &URI_TOO_LONG,
                &[("uri_len", &target.len()), ("max_uri_length", &max)],
            );
        }
        self.core.check_version(version);
        self.method = Some(method.to_string());
        self.target = Some(target.to_string());
    }

    /// Process and finish the header block.
    pub fn process_headers<I, N, V>(&mut self, lines: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.core.process_headers(lines);
    }

    pub fn feed_content(&mut self, chunk: &[u8]) {
        self.core.feed_content(chunk);
    }

    /// End of message. The request is immutable afterwards.
    pub fn finish_content<I, N, V>(&mut self, is_complete: bool, trailers: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if !self.core.end_content(is_complete, trailers, true) {
            return;
        }
        self.core.post_check(self.method.as_deref(), None, None, None);
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn notes(&self) -> &Notes {
        &self.core.notes
    }

    pub fn headers(&self) -> &FieldSection {
        &self.core.headers
    }

    pub fn trailers(&self) -> &FieldSection {
        &self.core.trailers
    }

    pub fn content(&self) -> Option<&ContentProcessor> {
        self.core.content.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.core.phase == Phase::Complete
    }
}

/// Lints one response, optionally in the context of the request it answers.
pub struct ResponseLinter {
    core: MessageCore,
    request: Option<Arc<RequestLinter>>,
    observed_at: Option<i64>,
    status: Option<u16>,
    cache: Option<CacheState>,
}

impl ResponseLinter {
    /// `observed_at` is when the response was received, in epoch seconds.
    pub fn new(
        config: &LintConfig,
        request: Option<Arc<RequestLinter>>,
        observed_at: Option<i64>,
    ) -> Self {
        if request.as_ref().is_some_and(|r| !r.is_complete()) {
            tracing::warn!("related request is not complete; its headers may be unfinished");
        }
        Self {
            core: MessageCore::new(MessageKind::Response, config),
            request,
            observed_at,
            status: None,
            cache: None,
        }
    }

    pub fn process_response_topline(&mut self, version: &str, status: &str, reason: &str) {
        if !self.core.begin_top_line() {
            return;
        }
        self.core.check_version(version);
        self.status = parse_status(status);
        if self.status.is_none() {
            self.core
                .notes
                .add("status", &STATUS_BAD_SYNTAX, &[("status", &status)]);
        }
        tracing::debug!(status, reason, "response top-line");
    }

    /// Process and finish the header block.
    pub fn process_headers<I, N, V>(&mut self, lines: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.core.process_headers(lines);
    }

    pub fn feed_content(&mut self, chunk: &[u8]) {
        self.core.feed_content(chunk);
    }

    /// End of message: trailers, content checks, cache checks, then the
    /// post-checks of every field. The response is immutable afterwards.
    pub fn finish_content<I, N, V>(&mut self, is_complete: bool, trailers: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let expects_content = self.expects_content();
        if !self.core.end_content(is_complete, trailers, expects_content) {
            return;
        }
        let request = self.request.as_deref();
        let method = request.and_then(RequestLinter::method);
        let related = request.map(RequestLinter::headers);
        let input = CacheInput {
            headers: &self.core.headers,
            status: self.status,
            method,
            request_headers: related,
            observed_at: self.observed_at,
        };
        let state = cache::check(&input, &mut self.core.notes);
        self.core
            .post_check(method, self.status, Some(&state), related);
        self.cache = Some(state);
    }

    /// Whether `Content-Length` describes the bytes on the wire.
    fn expects_content(&self) -> bool {
        let head = self
            .request
            .as_deref()
            .and_then(RequestLinter::method)
            .is_some_and(|m| m == "HEAD");
        let bodiless = self
            .status
            .is_some_and(|s| (100..200).contains(&s) || s == 204 || s == 304);
        !head && !bodiless
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn request(&self) -> Option<&RequestLinter> {
        self.request.as_deref()
    }

    /// Cache state; set once the message is finished.
    pub fn cache(&self) -> Option<&CacheState> {
        self.cache.as_ref()
    }

    pub fn notes(&self) -> &Notes {
        &self.core.notes
    }

    pub fn headers(&self) -> &FieldSection {
        &self.core.headers
    }

    pub fn trailers(&self) -> &FieldSection {
        &self.core.trailers
    }

    pub fn content(&self) -> Option<&ContentProcessor> {
        self.core.content.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.core.phase == Phase::Complete
    }
}

fn parse_status(status: &str) -> Option<u16> {
    if status.len() != 3 || !status.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    status.parse().ok().filter(|s| (100..=599).contains(s))
}

pub static METHOD_BAD_SYNTAX: NoteKind = NoteKind {
    id: "METHOD_BAD_SYNTAX",
    category: Category::General,
    level: Level::Bad,
    summary: "The request method '{method}' isn't a valid token.",
    detail: "HTTP methods are tokens, such as GET or POST. Servers will likely reject this request.",
};

pub static URI_TOO_LONG: NoteKind = NoteKind {
    id: "URI_TOO_LONG",
    category: Category::General,
    level: Level::Warn,
    summary: "The URI is very long ({uri_len} characters).",
    detail: "Long URIs aren't supported by some implementations, including proxies. A reasonable upper size limit is {max_uri_length} characters.",
};

pub static VERSION_BAD_SYNTAX: NoteKind = NoteKind {
    id: "VERSION_BAD_SYNTAX",
    category: Category::Connection,
    level: Level::Bad,
    summary: "{message} uses an invalid HTTP version '{version}'.",
    detail: "The HTTP version must look like HTTP/1.1: the name HTTP, a slash, and a major and minor digit.",
};

pub static STATUS_BAD_SYNTAX: NoteKind = NoteKind {
    id: "STATUS_BAD_SYNTAX",
    category: Category::General,
    level: Level::Bad,
    summary: "The status code '{status}' isn't valid.",
    detail: "Status codes are three digits from 100 to 599. Checks that depend on the status are skipped.",
};

pub static CONTENT_INCOMPLETE: NoteKind = NoteKind {
    id: "CONTENT_INCOMPLETE",
    category: Category::Connection,
    level: Level::Warn,
    summary: "{message} wasn't complete.",
    detail: "The connection closed after {wire_len} bytes of content, before the end of the message. Checks on the content are unreliable.",
};

pub static CL_CORRECT: NoteKind = NoteKind {
    id: "CL_CORRECT",
    category: Category::General,
    level: Level::Good,
    summary: "The Content-Length header is correct.",
    detail: "Content-Length is used by clients to know when the message is complete. It matches the content received.",
};

pub static CL_INCORRECT: NoteKind = NoteKind {
    id: "CL_INCORRECT",
    category: Category::General,
    level: Level::Bad,
    summary: "{message}'s Content-Length header is incorrect.",
    detail: "Content-Length declared {content_length} bytes, but {wire_len} were received. Clients may truncate the message or hang waiting for more.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FRESHNESS_STALE_ALREADY, STOREABLE};
    use crate::content::BAD_ZLIB;
    use crate::fields::{FieldValue, FIELD_BAD_SYNTAX, FIELD_WRONG_MESSAGE};
    use crate::rules::accept_ch::ACCEPT_CH_VARY_INCOMPLETE;
    use crate::test_helpers::{
        gzip, http_date, make_request, make_response, make_response_with_body, T0,
    };
    use rstest::rstest;

    #[rstest]
    #[case("GET", "HTTP/1.1", None)]
    #[case("G ET", "HTTP/1.1", Some(&METHOD_BAD_SYNTAX))]
    #[case("GET", "HTTP/11", Some(&VERSION_BAD_SYNTAX))]
    #[case("GET", "http/1.1", Some(&VERSION_BAD_SYNTAX))]
    fn request_topline(
        #[case] method: &str,
        #[case] version: &str,
        #[case] expected: Option<&'static NoteKind>,
    ) {
        let mut req = RequestLinter::new(&LintConfig::default());
        req.process_request_topline(method, "/", version);
        match expected {
            Some(kind) => assert_eq!(req.notes().count(kind), 1),
            None => assert!(req.notes().is_empty()),
        }
    }

    #[test]
    fn long_uri_is_noted_without_aborting() {
        let mut cfg = LintConfig::default();
        cfg.limits.max_uri_length = 10;
        let mut req = RequestLinter::new(&cfg);
        req.process_request_topline("GET", "/a/very/long/path", "HTTP/1.1");
        req.process_headers([("Host", "example.com")]);
        req.finish_content(true, std::iter::empty::<(&str, &str)>());
        let note = req.notes().find(&URI_TOO_LONG).expect("uri note");
        assert_eq!(note.var("uri_len"), Some("17"));
        assert!(req.headers().contains("host"));
        assert_eq!(req.target(), Some("/a/very/long/path"));
    }

    #[rstest]
    #[case("200", Some(200))]
    #[case("599", Some(599))]
    #[case("099", None)]
    #[case("600", None)]
    #[case("2000", None)]
    #[case("abc", None)]
    fn response_status(#[case] raw: &str, #[case] expected: Option<u16>) {
        let resp = make_response(raw, &[], None, None);
        assert_eq!(resp.status(), expected);
        assert_eq!(resp.notes().contains(&STATUS_BAD_SYNTAX), expected.is_none());
    }

    #[test]
    fn headers_are_finished_before_content() {
        let mut resp = ResponseLinter::new(&LintConfig::default(), None, None);
        resp.process_response_topline("HTTP/1.1", "200", "OK");
        resp.process_headers([("Content-Length", "2")]);
        assert!(resp.headers().is_finished());
        assert_eq!(
            resp.headers().get("content-length"),
            Some(&FieldValue::Integer(2))
        );
        assert!(resp.cache().is_none());
    }

    #[rstest]
    #[case("5", &[&b"hello"[..]], Some(&CL_CORRECT))]
    #[case("5", &[&b"hel"[..], &b"lo"[..]], Some(&CL_CORRECT))]
    #[case("10", &[&b"hello"[..]], Some(&CL_INCORRECT))]
    fn content_length_against_wire_bytes(
        #[case] declared: &str,
        #[case] chunks: &[&[u8]],
        #[case] expected: Option<&'static NoteKind>,
    ) {
        let resp = make_response_with_body("200", &[("Content-Length", declared)], None, None, chunks);
        if let Some(kind) = expected {
            assert_eq!(resp.notes().count(kind), 1);
            assert_eq!(resp.notes().find(kind).map(|n| n.subject()), Some("header-content-length"));
        }
    }

    #[test]
    fn content_length_is_not_checked_for_head() {
        let req = make_request("HEAD", &[]);
        let resp = make_response("200", &[("Content-Length", "100")], Some(req), None);
        assert!(!resp.notes().contains(&CL_INCORRECT));
        assert!(!resp.notes().contains(&CL_CORRECT));
    }

    #[test]
    fn content_length_is_not_checked_for_304() {
        let resp = make_response("304", &[("Content-Length", "100")], None, None);
        assert!(!resp.notes().contains(&CL_INCORRECT));
    }

    #[test]
    fn incomplete_message_is_noted() {
        let mut resp = ResponseLinter::new(&LintConfig::default(), None, None);
        resp.process_response_topline("HTTP/1.1", "200", "OK");
        resp.process_headers([("Content-Length", "10")]);
        resp.feed_content(b"abc");
        resp.finish_content(false, std::iter::empty::<(&str, &str)>());
        let note = resp.notes().find(&CONTENT_INCOMPLETE).expect("incomplete note");
        assert_eq!(note.var("wire_len"), Some("3"));
        assert!(!resp.notes().contains(&CL_INCORRECT));
        assert!(resp.is_complete());
    }

    #[test]
    fn gzip_content_is_decoded() {
        let body = b"The quick brown fox jumps over the lazy dog".repeat(50);
        let wire = gzip(&body);
        let len = wire.len().to_string();
        let chunks: Vec<&[u8]> = wire.chunks(7).collect();
        let resp = make_response_with_body(
            "200",
            &[("Content-Encoding", "gzip"), ("Content-Length", len.as_str())],
            None,
            None,
            &chunks,
        );
        let content = resp.content().expect("content processor");
        assert!(content.decode_ok());
        assert_eq!(content.content_len(), body.len());
        assert_eq!(content.wire_len(), wire.len());
        assert!(content.content_hash().is_some());
        assert!(resp.notes().contains(&CL_CORRECT));
    }

    #[test]
    fn corrupt_gzip_content_is_one_note() {
        let mut wire = gzip(b"hello world")[..10].to_vec();
        wire.extend_from_slice(&[0xff; 32]);
        let resp = make_response_with_body(
            "200",
            &[("Content-Encoding", "gzip")],
            None,
            None,
            &[&wire[..5], &wire[5..]],
        );
        assert_eq!(resp.notes().count(&BAD_ZLIB), 1);
        assert!(!resp.content().is_some_and(|c| c.decode_ok()));
    }

    #[test]
    fn calls_after_end_of_message_are_ignored() {
        let mut resp = make_response_with_body("200", &[], None, None, &[&b"abc"[..]]);
        let before = resp.notes().len();
        resp.feed_content(b"more");
        resp.process_headers([("ETag", "\"x\"")]);
        resp.finish_content(false, std::iter::empty::<(&str, &str)>());
        assert_eq!(resp.content().map(|c| c.wire_len()), Some(3));
        assert!(!resp.headers().contains("etag"));
        assert_eq!(resp.notes().len(), before);
    }

    #[test]
    fn trailers_use_their_own_subjects() {
        let mut resp = ResponseLinter::new(&LintConfig::default(), None, None);
        resp.process_response_topline("HTTP/1.1", "200", "OK");
        resp.process_headers([("Transfer-Encoding", "chunked")]);
        resp.feed_content(b"data");
        resp.finish_content(true, [("ETag", "not-quoted"), ("Host", "example.com")]);
        assert!(resp.trailers().contains("etag"));
        let bad = resp.notes().find(&FIELD_BAD_SYNTAX).expect("syntax note");
        assert_eq!(bad.subject(), "trailer-etag");
        let wrong = resp.notes().find(&FIELD_WRONG_MESSAGE).expect("wrong message note");
        assert_eq!(wrong.subject(), "trailer-host");
    }

    #[test]
    fn response_uses_request_context_and_observation_time() {
        let req = make_request("GET", &[("Host", "example.com")]);
        let date = http_date(T0);
        let resp = make_response(
            "200",
            &[("Date", date.as_str()), ("Cache-Control", "max-age=60")],
            Some(req),
            Some(T0 + 120),
        );
        let state = resp.cache().expect("cache state");
        assert!(state.store_shared);
        assert_eq!(state.age, 120);
        assert_eq!(state.freshness_lifetime_shared, 60);
        assert!(!state.fresh);
        assert!(resp.notes().contains(&STOREABLE));
        assert!(resp.notes().contains(&FRESHNESS_STALE_ALREADY));
        assert_eq!(resp.request().and_then(RequestLinter::method), Some("GET"));
    }

    #[test]
    fn post_checks_see_the_cache_state() {
        let resp = make_response(
            "200",
            &[("Cache-Control", "max-age=60"), ("Accept-CH", "Sec-CH-UA")],
            None,
            None,
        );
        assert_eq!(resp.notes().count(&ACCEPT_CH_VARY_INCOMPLETE), 1);
    }

    #[test]
    fn labels_fill_the_message_variable() {
        let resp = make_response("2000", &[], None, None);
        let note = resp.notes().find(&STATUS_BAD_SYNTAX).expect("status note");
        assert_eq!(note.var("message"), Some("This response"));
    }
}
