//! Request and response shapes exchanged between the cache and the transport
//! that embeds it. The transport itself lives outside this crate.

pub mod cache_control;

use anyhow::Result;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Version};

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub url: String,
    pub method: Method,
    /// Request headers in the order the caller supplied them.
    pub headers: Vec<(String, String)>,
    pub version: Version,
    pub using_cache: bool,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            version: Version::HTTP_11,
            using_cache: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.using_cache = false;
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            if let Ok(name) = HeaderName::from_bytes(name.as_bytes())
                && let Ok(value) = HeaderValue::from_str(value)
            {
                map.append(name, value);
            }
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    /// Status line plus header lines exactly as received.
    pub raw_header: String,
    pub result: Bytes,
    pub cookies: String,
    /// HTTP-date at which the response was received.
    pub response_time: String,
    /// HTTP-date at which the request was sent.
    pub request_time: String,
    pub response_code: u16,
    pub headers: HeaderMap,
}

impl HttpResponse {
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.response_code).ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Rebuilds `headers` from `raw_header`. The status line, blank lines and
    /// lines that are not valid `name: value` pairs are skipped.
    pub fn parse_headers(&mut self) {
        let mut map = HeaderMap::new();
        for line in self.raw_header.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with("HTTP/") {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if let Ok(name) = HeaderName::from_bytes(name.trim().as_bytes())
                && let Ok(value) = HeaderValue::from_str(value.trim())
            {
                map.append(name, value);
            }
        }
        self.headers = map;
    }
}

/// Per-request state handed to the transport and the cache.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub options: RequestOptions,
    pub response: HttpResponse,
    cache_response: Option<HttpResponse>,
}

impl RequestContext {
    pub fn new(options: RequestOptions) -> Self {
        Self {
            options,
            response: HttpResponse::default(),
            cache_response: None,
        }
    }

    /// Installs a stale cached response the transport may revalidate with a
    /// conditional request.
    pub fn set_cache_response(&mut self, response: HttpResponse) {
        self.cache_response = Some(response);
    }

    pub fn cache_response(&self) -> Option<&HttpResponse> {
        self.cache_response.as_ref()
    }

    pub fn take_cache_response(&mut self) -> Option<HttpResponse> {
        self.cache_response.take()
    }
}

/// Performs the network round trip for a request and fills `context.response`.
pub trait Transport {
    fn execute(&self, context: &mut RequestContext) -> Result<()>;
}

pub fn now_http_date() -> String {
    httpdate::fmt_http_date(std::time::SystemTime::now())
}
