use std::borrow::Cow;
use std::time::{Duration, SystemTime};

use http::{HeaderMap, Method};

use crate::http::cache_control::{
    CacheControl, age_header, has_validator, header_date, parse_cache_control,
    parse_cache_control_value,
};
use crate::http::{HttpResponse, RequestOptions};

/// Verdict on a cached response for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Serve from cache without contacting the origin.
    Fresh,
    /// Usable only after revalidation with the origin.
    Stale,
    /// Must not be used.
    Denied,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
            CacheStatus::Denied => "denied",
        }
    }
}

/// Cacheability and freshness policy consulted by the cache proxy.
pub trait CacheStrategy: Send + Sync {
    fn could_use_cache(&self, request: &RequestOptions) -> bool;

    fn is_cacheable(&self, request: &RequestOptions, response: &HttpResponse) -> bool;

    fn run_strategy(&self, request: &RequestOptions, cached: &HttpResponse) -> CacheStatus;
}

/// Status codes a cache may store without explicit permission from the origin.
const HEURISTICALLY_CACHEABLE: &[u16] = &[200, 203, 204, 206, 300, 301, 308, 404, 405, 410, 414, 501];

/// Policy driven by `Cache-Control`, `Expires`, `Date`, `Last-Modified`
/// and `ETag`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCacheStrategy;

impl HeaderCacheStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Freshness verdict evaluated at `now`.
    pub fn status_at(
        &self,
        request: &RequestOptions,
        cached: &HttpResponse,
        now: SystemTime,
    ) -> CacheStatus {
        let headers = response_headers(cached);
        let revalidatable = has_validator(&headers);
        let fallback = if revalidatable {
            CacheStatus::Stale
        } else {
            CacheStatus::Denied
        };

        let request_cc = request_cache_control(request);
        let response_cc = parse_cache_control(&headers);
        if request_cc.no_cache || response_cc.no_cache {
            return fallback;
        }

        let date = header_date(&headers, http::header::DATE);
        let Some(received) = parse_http_date(&cached.response_time).or(date) else {
            return fallback;
        };

        let mut lifetime = freshness_lifetime(&response_cc, &headers, date.unwrap_or(received));
        if let Some(cap) = request_cc.max_age {
            lifetime = lifetime.min(cap);
        }

        let age = now
            .duration_since(received)
            .unwrap_or(Duration::ZERO)
            .saturating_add(age_header(&headers).unwrap_or(Duration::ZERO));

        if age < lifetime {
            CacheStatus::Fresh
        } else {
            fallback
        }
    }
}

impl CacheStrategy for HeaderCacheStrategy {
    fn could_use_cache(&self, request: &RequestOptions) -> bool {
        let method_ok = request.method == Method::GET
            || request.method == Method::HEAD
            || request.header("range").is_some();
        method_ok && !request_cache_control(request).no_store
    }

    fn is_cacheable(&self, request: &RequestOptions, response: &HttpResponse) -> bool {
        if !self.could_use_cache(request) {
            return false;
        }
        if !HEURISTICALLY_CACHEABLE.contains(&response.response_code) {
            return false;
        }

        let headers = response_headers(response);
        let cc = parse_cache_control(&headers);
        if cc.no_store {
            return false;
        }

        cc.max_age.is_some() || headers.contains_key(http::header::EXPIRES) || has_validator(&headers)
    }

    fn run_strategy(&self, request: &RequestOptions, cached: &HttpResponse) -> CacheStatus {
        self.status_at(request, cached, SystemTime::now())
    }
}

fn request_cache_control(request: &RequestOptions) -> CacheControl {
    let mut cc = CacheControl::default();
    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("cache-control") {
            let parsed = parse_cache_control_value(value);
            cc.no_cache |= parsed.no_cache;
            cc.no_store |= parsed.no_store;
            cc.max_age = cc.max_age.or(parsed.max_age);
        }
    }
    cc
}

// Transports may hand over only the raw header blob.
fn response_headers(response: &HttpResponse) -> Cow<'_, HeaderMap> {
    if !response.headers.is_empty() || response.raw_header.is_empty() {
        return Cow::Borrowed(&response.headers);
    }
    let mut parsed = HttpResponse {
        raw_header: response.raw_header.clone(),
        ..HttpResponse::default()
    };
    parsed.parse_headers();
    Cow::Owned(parsed.headers)
}

fn freshness_lifetime(cc: &CacheControl, headers: &HeaderMap, date: SystemTime) -> Duration {
    if let Some(max_age) = cc.max_age {
        return max_age;
    }
    if let Some(expires) = header_date(headers, http::header::EXPIRES) {
        return expires.duration_since(date).unwrap_or(Duration::ZERO);
    }
    if let Some(last_modified) = header_date(headers, http::header::LAST_MODIFIED) {
        return date.duration_since(last_modified).unwrap_or(Duration::ZERO) / 10;
    }
    Duration::ZERO
}

fn parse_http_date(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value.trim()).ok()
}
