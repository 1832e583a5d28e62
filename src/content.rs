// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Streaming removal of content-codings.
//!
//! Content arrives in wire-sized chunks. Each chunk is threaded through
//! every declared coding (last applied, first removed), and the decoded
//! bytes are counted, hashed and sampled.

use crate::note::{Category, Level, NoteKind, Notes};
use bytes::Bytes;
use flate2::{Decompress, FlushDecompress, Status};
use sha1::{Digest, Sha1};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_FIXED_HEADER: usize = 10;
const CM_DEFLATE: u8 = 8;
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const FRESERVED: u8 = 0xe0;
/// Longest file name or comment accepted in a gzip header.
const MAX_GZIP_TEXT_FIELD: usize = 64 * 1024;

const INFLATE_BUFFER: usize = 16 * 1024;
const PREVIEW_BYTES: usize = 20;

const SUBJECT: &str = "header-content-encoding";

#[derive(Debug)]
enum DecodeError {
    Header(String),
    Stream(String),
}

enum GzipState {
    AwaitingHeader(HeaderScan),
    InStream(Box<Decompress>),
    Done,
    Failed,
}

/// Incremental gzip member decoder. Bytes after the end of the deflate
/// stream (the CRC32/ISIZE trailer) are ignored.
struct GzipDecoder {
    state: GzipState,
}

impl GzipDecoder {
    fn new() -> Self {
        Self {
            state: GzipState::AwaitingHeader(HeaderScan::default()),
        }
    }

    /// Decode one chunk. Output produced before an error is still returned.
    fn decode(&mut self, chunk: &[u8]) -> (Vec<u8>, Option<DecodeError>) {
        if let GzipState::AwaitingHeader(scan) = &mut self.state {
            let header_len = match scan.feed(chunk) {
                Ok(Some(len)) => len,
                Ok(None) => return (Vec::new(), None),
                Err(e) => {
                    self.state = GzipState::Failed;
                    return (Vec::new(), Some(DecodeError::Header(e)));
                }
            };
            let rest = scan.buf.split_off(header_len);
            tracing::debug!(header_len, "gzip header parsed");
            self.state = GzipState::InStream(Box::new(Decompress::new(false)));
            return self.inflate(&rest);
        }
        self.inflate(chunk)
    }

    fn inflate(&mut self, mut input: &[u8]) -> (Vec<u8>, Option<DecodeError>) {
        let GzipState::InStream(inflater) = &mut self.state else {
            return (Vec::new(), None);
        };
        let mut out = Vec::new();
        let mut buf = vec![0u8; INFLATE_BUFFER];
        loop {
            let before_in = inflater.total_in();
            let before_out = inflater.total_out();
            let status = inflater.decompress(input, &mut buf, FlushDecompress::None);
            let consumed = (inflater.total_in() - before_in) as usize;
            let produced = (inflater.total_out() - before_out) as usize;
            out.extend_from_slice(&buf[..produced]);
            input = &input[consumed..];
            match status {
                Err(e) => {
                    self.state = GzipState::Failed;
                    return (out, Some(DecodeError::Stream(e.to_string())));
                }
                Ok(Status::StreamEnd) => {
                    tracing::debug!(trailing = input.len(), "gzip stream ended");
                    self.state = GzipState::Done;
                    return (out, None);
                }
                Ok(_) => {
                    let drained = input.is_empty() && produced < buf.len();
                    if drained || (consumed == 0 && produced == 0) {
                        return (out, None);
                    }
                }
            }
        }
    }
}

/// Progress through a gzip header that may arrive in pieces. Each byte is
/// scanned once.
#[derive(Default)]
struct HeaderScan {
    buf: Vec<u8>,
    /// Header bytes accounted for so far; zero until the fixed part is read.
    pos: usize,
    /// Optional sections still to skip.
    pending: u8,
    /// Start of the NUL-terminated field being searched.
    field_start: usize,
}

impl HeaderScan {
    /// Append `chunk` and resume scanning. Returns the header length once the
    /// whole header has been seen.
    fn feed(&mut self, chunk: &[u8]) -> Result<Option<usize>, String> {
        self.buf.extend_from_slice(chunk);
        if self.pos == 0 {
            if self.buf.len() < GZIP_FIXED_HEADER {
                return Ok(None);
            }
            let flags = check_fixed_header(&self.buf[..GZIP_FIXED_HEADER])?;
            self.pos = GZIP_FIXED_HEADER;
            self.pending = flags & (FEXTRA | FNAME | FCOMMENT | FHCRC);
            self.field_start = self.pos;
        }
        if self.pending & FEXTRA != 0 {
            let Some(xlen) = self.buf.get(self.pos..self.pos + 2) else {
                return Ok(None);
            };
            let end = self.pos + 2 + usize::from(u16::from_le_bytes([xlen[0], xlen[1]]));
            if self.buf.len() < end {
                return Ok(None);
            }
            self.pos = end;
            self.field_start = end;
            self.pending &= !FEXTRA;
        }
        for (flag, field) in [(FNAME, "file name"), (FCOMMENT, "comment")] {
            if self.pending & flag == 0 {
                continue;
            }
            let nul = self.buf[self.pos..].iter().position(|&b| b == 0);
            let scanned_to = nul.map_or(self.buf.len(), |end| self.pos + end);
            if scanned_to - self.field_start > MAX_GZIP_TEXT_FIELD {
                return Err(format!("{} longer than {} bytes", field, MAX_GZIP_TEXT_FIELD));
            }
            if nul.is_none() {
                self.pos = scanned_to;
                return Ok(None);
            }
            self.pos = scanned_to + 1;
            self.field_start = self.pos;
            self.pending &= !flag;
        }
        if self.pending & FHCRC != 0 {
            if self.buf.len() < self.pos + 2 {
                return Ok(None);
            }
            self.pos += 2;
            self.pending &= !FHCRC;
        }
        Ok(Some(self.pos))
    }
}

/// Validate the fixed ten-byte part of a gzip header, returning its flags.
fn check_fixed_header(header: &[u8]) -> Result<u8, String> {
    if header[..2] != GZIP_MAGIC {
        return Err(format!(
            "bad magic number {:#04x} {:#04x}",
            header[0], header[1]
        ));
    }
    if header[2] != CM_DEFLATE {
        return Err(format!("unknown compression method {}", header[2]));
    }
    let flags = header[3];
    if flags & FRESERVED != 0 {
        return Err(format!("reserved flag bits set ({:#04x})", flags));
    }
    Ok(flags)
}

/// Printable preview of raw bytes, e.g. `\x1f\x8bab`.
fn escape_preview(data: &[u8]) -> String {
    let mut out = String::new();
    for &b in data.iter().take(PREVIEW_BYTES) {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    if data.len() > PREVIEW_BYTES {
        out.push_str("...");
    }
    out
}

struct Decoder {
    coding: String,
    gzip: GzipDecoder,
}

/// Decoded-content state of one message.
pub struct ContentProcessor {
    decoders: Vec<Decoder>,
    max_sample_size: usize,
    wire_len: usize,
    content_len: usize,
    hasher: Option<Sha1>,
    content_hash: Option<Vec<u8>>,
    samples: Vec<(usize, Bytes)>,
    decode_ok: bool,
}

impl ContentProcessor {
    /// `codings` in the order they appear in `Content-Encoding`. Unsupported
    /// codings are noted here and leave the processor unable to decode.
    pub fn new(codings: &[String], max_sample_size: usize, notes: &mut Notes) -> Self {
        let mut decoders = Vec::new();
        let mut decode_ok = true;
        for coding in codings.iter().rev() {
            match coding.to_ascii_lowercase().as_str() {
                "identity" => {}
                "gzip" | "x-gzip" => decoders.push(Decoder {
                    coding: coding.clone(),
                    gzip: GzipDecoder::new(),
                }),
                _ => {
                    notes.add(SUBJECT, &CONTENT_CODING_UNSUPPORTED, &[("coding", coding)]);
                    decode_ok = false;
                    break;
                }
            }
        }
        Self {
            decoders,
            max_sample_size,
            wire_len: 0,
            content_len: 0,
            hasher: Some(Sha1::new()),
            content_hash: None,
            samples: Vec::new(),
            decode_ok,
        }
    }

    /// Decode, count, hash and sample one chunk of wire content.
    pub fn feed(&mut self, chunk: &[u8], notes: &mut Notes) {
        if self.hasher.is_none() {
            tracing::warn!("content fed after the processor finished; ignoring");
            return;
        }
        self.wire_len += chunk.len();
        if !self.decode_ok {
            return;
        }
        let mut data = chunk.to_vec();
        let last = self.decoders.len().saturating_sub(1);
        for (i, decoder) in self.decoders.iter_mut().enumerate() {
            let (out, err) = decoder.gzip.decode(&data);
            let Some(err) = err else {
                data = out;
                continue;
            };
            self.decode_ok = false;
            match err {
                DecodeError::Header(error) => {
                    notes.add(
                        SUBJECT,
                        &BAD_GZIP,
                        &[("coding", &decoder.coding), ("error", &error)],
                    );
                }
                DecodeError::Stream(error) => {
                    let preview = escape_preview(&data);
                    notes.add(
                        SUBJECT,
                        &BAD_ZLIB,
                        &[
                            ("coding", &decoder.coding),
                            ("error", &error),
                            ("ok_bytes", &(self.content_len + out.len())),
                            ("chunk_sample", &preview),
                        ],
                    );
                }
            }
            tracing::debug!(coding = %decoder.coding, "content decoding failed");
            if i != last {
                return;
            }
            data = out;
            break;
        }
        self.record(data);
    }

    fn record(&mut self, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&data);
        }
        let len = data.len();
        if self.content_len < self.max_sample_size {
            self.samples.push((self.content_len, Bytes::from(data)));
        }
        self.content_len += len;
    }

    /// Finalise the content hash. Later calls are ignored.
    pub fn finish(&mut self) {
        match self.hasher.take() {
            Some(hasher) => self.content_hash = Some(hasher.finalize().to_vec()),
            None => tracing::warn!("content processor finished twice; ignoring"),
        }
    }

    /// Content bytes received, before decoding.
    pub fn wire_len(&self) -> usize {
        self.wire_len
    }

    /// Decoded bytes produced so far.
    pub fn content_len(&self) -> usize {
        self.content_len
    }

    /// SHA-1 of the decoded content; available after [`ContentProcessor::finish`].
    pub fn content_hash(&self) -> Option<&[u8]> {
        self.content_hash.as_deref()
    }

    pub fn content_hash_hex(&self) -> Option<String> {
        self.content_hash
            .as_ref()
            .map(|h| h.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// `(offset, bytes)` pairs of decoded content, in order.
    pub fn samples(&self) -> &[(usize, Bytes)] {
        &self.samples
    }

    pub fn decode_ok(&self) -> bool {
        self.decode_ok
    }

    /// Codings that will be removed, in removal order.
    pub fn codings(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.coding.as_str()).collect()
    }
}

pub static BAD_GZIP: NoteKind = NoteKind {
    id: "BAD_GZIP",
    category: Category::General,
    level: Level::Bad,
    summary: "{message} was compressed using {coding}, but the header wasn't valid.",
    detail: "The {coding} header couldn't be read ({error}), so the content can't be decoded. Clients will usually show an error.",
};

pub static BAD_ZLIB: NoteKind = NoteKind {
    id: "BAD_ZLIB",
    category: Category::General,
    level: Level::Bad,
    summary: "{message} was compressed using {coding}, but the data was corrupt.",
    detail: "Decompression failed after {ok_bytes} bytes of decoded content ({error}). The offending chunk starts with: {chunk_sample}",
};

pub static CONTENT_CODING_UNSUPPORTED: NoteKind = NoteKind {
    id: "CONTENT_CODING_UNSUPPORTED",
    category: Category::General,
    level: Level::Info,
    summary: "{message} uses the {coding} content-coding, which can't be checked.",
    detail: "Content using {coding} can't be decoded here, so its length, hash and sample describe nothing. Other checks are unaffected.",
};
