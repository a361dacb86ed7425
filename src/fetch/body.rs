//! Response body decoding.
//!
//! [`BodyDecoder`] turns a raw response body into plain bytes, reversing
//! `Content-Encoding: gzip` when present. Any other encoding (including
//! `deflate` and `br`, which the request headers advertise) passes through
//! untouched.
//!
//! The decoder takes the body by value, so a body is decoded at most once
//! and released exactly once when the decoder is dropped.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;

use crate::ScrapeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A transfer encoding recognised on response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// No decoding; bytes are read as-is.
    Identity,
    /// gzip-compressed body.
    Gzip,
}

impl ContentEncoding {
    /// Maps a `Content-Encoding` header value; unknown values are identity.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("gzip") => Self::Gzip,
            _ => Self::Identity,
        }
    }
}

enum Inner {
    Identity(Cursor<Vec<u8>>),
    Gzip(Box<GzDecoder<Cursor<Vec<u8>>>>),
}

/// Readable view of a response body with content encoding reversed.
pub struct BodyDecoder {
    inner: Inner,
    context: String,
}

impl std::fmt::Debug for BodyDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyDecoder")
            .field("encoding", &self.encoding())
            .field("context", &self.context)
            .finish()
    }
}

impl BodyDecoder {
    /// Wraps `raw` according to `content_encoding`.
    ///
    /// `context` (usually the request URL) is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Decode`] when the body is declared gzip but
    /// does not start with the gzip magic bytes.
    pub fn new(
        content_encoding: Option<&str>,
        raw: Vec<u8>,
        context: impl Into<String>,
    ) -> Result<Self, ScrapeError> {
        let context = context.into();
        let inner = match ContentEncoding::from_header(content_encoding) {
            ContentEncoding::Identity => Inner::Identity(Cursor::new(raw)),
            ContentEncoding::Gzip => {
                if !raw.starts_with(&GZIP_MAGIC) {
                    return Err(ScrapeError::decode(context, "invalid gzip header"));
                }
                Inner::Gzip(Box::new(GzDecoder::new(Cursor::new(raw))))
            }
        };
        Ok(Self { inner, context })
    }

    /// The encoding being reversed.
    #[must_use]
    pub fn encoding(&self) -> ContentEncoding {
        match self.inner {
            Inner::Identity(_) => ContentEncoding::Identity,
            Inner::Gzip(_) => ContentEncoding::Gzip,
        }
    }

    /// Whether this decoder holds decompression state.
    #[must_use]
    pub fn owns_decompression(&self) -> bool {
        self.encoding() == ContentEncoding::Gzip
    }

    /// Reads the whole decoded body, consuming the decoder.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Decode`] if the compressed stream is corrupt.
    pub fn read_all(mut self) -> Result<Vec<u8>, ScrapeError> {
        let mut decoded = Vec::new();
        self.read_to_end(&mut decoded)
            .map_err(|e| ScrapeError::decode(self.context.clone(), e))?;
        Ok(decoded)
    }
}

impl Read for BodyDecoder {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            Inner::Identity(reader) => reader.read(buf),
            Inner::Gzip(reader) => reader.read(buf),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_content_encoding_from_header() {
        assert_eq!(ContentEncoding::from_header(None), ContentEncoding::Identity);
        assert_eq!(ContentEncoding::from_header(Some("gzip")), ContentEncoding::Gzip);
        assert_eq!(ContentEncoding::from_header(Some(" GZIP ")), ContentEncoding::Gzip);
        assert_eq!(ContentEncoding::from_header(Some("br")), ContentEncoding::Identity);
        assert_eq!(ContentEncoding::from_header(Some("deflate")), ContentEncoding::Identity);
    }

    #[test]
    fn test_gzip_and_plain_bodies_decode_identically() {
        let content = b"<html><body>same bytes either way</body></html>".repeat(20);
        let plain = BodyDecoder::new(None, content.clone(), "plain").unwrap();
        let zipped = BodyDecoder::new(Some("gzip"), gzip(&content), "zipped").unwrap();
        assert!(!plain.owns_decompression());
        assert!(zipped.owns_decompression());
        assert_eq!(plain.read_all().unwrap(), zipped.read_all().unwrap());
    }

    #[test]
    fn test_unknown_encoding_passes_through() {
        let raw = b"\x00\x01not really brotli".to_vec();
        let decoder = BodyDecoder::new(Some("br"), raw.clone(), "br").unwrap();
        assert_eq!(decoder.encoding(), ContentEncoding::Identity);
        assert_eq!(decoder.read_all().unwrap(), raw);
    }

    #[test]
    fn test_bad_gzip_magic_fails_on_open() {
        let err = BodyDecoder::new(Some("gzip"), b"plain text".to_vec(), "https://x/y").unwrap_err();
        assert!(matches!(err, ScrapeError::Decode { .. }));
        assert!(err.to_string().contains("https://x/y"));
    }

    #[test]
    fn test_truncated_gzip_fails_on_read() {
        let mut zipped = gzip(&b"truncate me please".repeat(50));
        zipped.truncate(zipped.len() / 2);
        let decoder = BodyDecoder::new(Some("gzip"), zipped, "truncated").unwrap();
        assert!(matches!(decoder.read_all(), Err(ScrapeError::Decode { .. })));
    }

    #[test]
    fn test_empty_identity_body() {
        let decoder = BodyDecoder::new(None, Vec::new(), "empty").unwrap();
        assert!(decoder.read_all().unwrap().is_empty());
    }
}
