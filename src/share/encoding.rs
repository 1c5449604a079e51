//! Self-contained payload encodings that fit in a query parameter.

use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::api::MAX_BLOB_BYTES;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("compression failed: {0}")]
    Compress(#[from] std::io::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("compressed data is corrupt")]
    Corrupt,

    #[error("payload is not valid UTF-8")]
    Utf8,

    #[error("decoded payload exceeds {0} bytes")]
    TooLarge(usize),
}

/// lz-string `compressToEncodedURIComponent`, so links stay readable by the
/// JavaScript front-end.
pub fn lz_compress(json: &str) -> String {
    lz_str::compress_to_encoded_uri_component(json)
}

/// Inverse of [`lz_compress`]. Spaces are read back as `+`, since query
/// decoding turns a bare `+` into a space.
pub fn lz_decompress(encoded: &str) -> Result<String, EncodingError> {
    let encoded = encoded.replace(' ', "+");
    let wide = lz_str::decompress_from_encoded_uri_component(encoded.as_str())
        .ok_or(EncodingError::Corrupt)?;
    if wide.is_empty() {
        return Err(EncodingError::Corrupt);
    }
    String::from_utf16(&wide).map_err(|_| EncodingError::Utf8)
}

/// Raw deflate, then URL-safe base64 without padding.
pub fn deflate_encode(json: &str) -> Result<String, EncodingError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(json.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

pub fn deflate_decode(encoded: &str) -> Result<String, EncodingError> {
    let compressed = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_BLOB_BYTES as u64 + 1)
        .read_to_end(&mut json)
        .map_err(|_| EncodingError::Corrupt)?;
    if json.len() > MAX_BLOB_BYTES {
        return Err(EncodingError::TooLarge(MAX_BLOB_BYTES));
    }
    String::from_utf8(json).map_err(|_| EncodingError::Utf8)
}

pub fn base64_encode(json: &str) -> String {
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

pub fn base64_decode(encoded: &str) -> Result<String, EncodingError> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
    String::from_utf8(bytes).map_err(|_| EncodingError::Utf8)
}
