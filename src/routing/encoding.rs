//! Character encodings and percent-encoding for generated URLs.
//!
//! # Design Decisions
//! - Form encoding (`application/x-www-form-urlencoded`) for query strings
//!   and fragments; path segments use the same alphabet with spaces as `%20`
//! - Only byte-oriented charsets that can be expressed without a codec table
//!   are supported; anything else fails fast
//! - Characters a charset cannot represent are written as `?`

use std::borrow::Cow;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::routing::error::{UrlMappingError, UrlMappingResult};

/// Encoding used when neither the caller nor the request supplies one.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// A character set URL components can be encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

impl FromStr for Charset {
    type Err = UrlMappingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            _ => Err(UrlMappingError::UnsupportedEncoding(name.to_string())),
        }
    }
}

impl Charset {
    /// Resolves the first available encoding name, defaulting to UTF-8.
    pub fn resolve(requested: Option<&str>, fallback: Option<&str>) -> UrlMappingResult<Self> {
        requested
            .filter(|e| !e.trim().is_empty())
            .or(fallback.filter(|e| !e.trim().is_empty()))
            .unwrap_or(DEFAULT_ENCODING)
            .parse()
    }

    fn encode<'a>(&self, input: &'a str) -> Cow<'a, [u8]> {
        let limit = match self {
            Charset::Utf8 => return Cow::Borrowed(input.as_bytes()),
            Charset::Latin1 => 0xFF,
            Charset::Ascii => 0x7F,
        };
        Cow::Owned(
            input
                .chars()
                .map(|c| if (c as u32) <= limit { c as u32 as u8 } else { b'?' })
                .collect(),
        )
    }

    /// Form-encodes a value: spaces become `+`.
    pub fn encode_form(&self, input: &str) -> String {
        form_urlencoded::byte_serialize(&self.encode(input)).collect()
    }

    /// Encodes a single path segment: spaces become `%20`.
    pub fn encode_segment(&self, input: &str) -> String {
        // byte_serialize escapes a literal '+' as %2B, so any '+' left is a space
        self.encode_form(input).replace('+', "%20")
    }
}

/// Percent-decodes a matched path segment.
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
