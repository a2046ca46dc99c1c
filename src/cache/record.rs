use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::base64;
use crate::http::HttpResponse;

/// One cached response. Every field holds Base64 text so the record can be
/// embedded in the JSON cache file verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub cookies: String,
    #[serde(default)]
    pub response_time: String,
    #[serde(default)]
    pub request_time: String,
}

impl CacheRecord {
    pub fn encode(response: &HttpResponse) -> Self {
        Self {
            header: base64::encode(&response.raw_header),
            result: base64::encode(&response.result),
            cookies: base64::encode(&response.cookies),
            response_time: base64::encode(&response.response_time),
            request_time: base64::encode(&response.request_time),
        }
    }

    /// Rebuilds the response fields stored in the record. Status code and the
    /// parsed header map are left for the caller to derive.
    pub fn decode(&self) -> HttpResponse {
        HttpResponse {
            raw_header: decode_text(&self.header),
            result: Bytes::from(base64::decode(&self.result)),
            cookies: decode_text(&self.cookies),
            response_time: decode_text(&self.response_time),
            request_time: decode_text(&self.request_time),
            ..HttpResponse::default()
        }
    }

    /// Total length of all stored values; this is what counts against cache
    /// capacity.
    pub fn size(&self) -> usize {
        self.header.len()
            + self.result.len()
            + self.cookies.len()
            + self.response_time.len()
            + self.request_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

fn decode_text(encoded: &str) -> String {
    String::from_utf8_lossy(&base64::decode(encoded)).into_owned()
}
