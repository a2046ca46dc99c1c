use std::fmt;

use http::Version;

use crate::base64;
use crate::http::RequestOptions;

/// Base64 of `url CRLF method CRLF (name:value CRLF)* version`.
///
/// Headers keep the caller's order, so the same headers sent in a different
/// order produce a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    encoded: String,
}

/// The readable parts of a stored key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    pub url: String,
    pub method: String,
}

impl CacheKey {
    pub fn new(request: &RequestOptions) -> Self {
        let mut raw = String::with_capacity(request.url.len() + 32);
        raw.push_str(&request.url);
        raw.push_str("\r\n");
        raw.push_str(&request.method.as_str().to_ascii_lowercase());
        raw.push_str("\r\n");
        for (name, value) in &request.headers {
            raw.push_str(name);
            raw.push(':');
            raw.push_str(value);
            raw.push_str("\r\n");
        }
        raw.push_str(&version_code(request.version).to_string());
        Self {
            encoded: base64::encode(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Recovers url and method from an encoded key, if it has that layout.
    pub fn describe(encoded: &str) -> Option<KeyParts> {
        let raw = String::from_utf8(base64::decode(encoded)).ok()?;
        let mut lines = raw.split("\r\n");
        let url = lines.next()?;
        let method = lines.next()?;
        if url.is_empty() || method.is_empty() {
            return None;
        }
        Some(KeyParts {
            url: url.to_string(),
            method: method.to_ascii_uppercase(),
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

fn version_code(version: Version) -> u8 {
    match version {
        Version::HTTP_09 => 9,
        Version::HTTP_10 => 10,
        Version::HTTP_2 => 20,
        Version::HTTP_3 => 30,
        _ => 11,
    }
}
