use std::time::{Duration, SystemTime};

use http::HeaderMap;
use http::header::HeaderName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub max_age: Option<Duration>,
}

pub fn parse_cache_control(headers: &HeaderMap) -> CacheControl {
    let mut cc = CacheControl::default();

    for value in headers.get_all(http::header::CACHE_CONTROL) {
        if let Ok(s) = value.to_str() {
            for part in s.split(',') {
                apply_directive(&mut cc, part.trim());
            }
        }
    }
    cc
}

/// Parses a single `Cache-Control` value such as a request header given as text.
pub fn parse_cache_control_value(value: &str) -> CacheControl {
    let mut cc = CacheControl::default();
    for part in value.split(',') {
        apply_directive(&mut cc, part.trim());
    }
    cc
}

fn apply_directive(cc: &mut CacheControl, part: &str) {
    if part.eq_ignore_ascii_case("no-cache") {
        cc.no_cache = true;
    } else if part.eq_ignore_ascii_case("no-store") {
        cc.no_store = true;
    } else if let Some((name, value)) = part.split_once('=')
        && name.trim().eq_ignore_ascii_case("max-age")
        && let Ok(secs) = value.trim().trim_matches('"').parse::<u64>()
    {
        cc.max_age = Some(Duration::from_secs(secs.min(MAX_DELTA_SECONDS)));
    }
}

/// Reads an HTTP-date header, ignoring values that do not parse.
pub fn header_date(headers: &HeaderMap, name: HeaderName) -> Option<SystemTime> {
    let value = headers.get(name)?.to_str().ok()?;
    httpdate::parse_http_date(value).ok()
}

/// Largest delta-seconds value honored; bigger values are clamped to it.
pub const MAX_DELTA_SECONDS: u64 = 1 << 31;

pub fn age_header(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::AGE)?.to_str().ok()?;
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Too many digits for u64 still means "very old".
    let secs = value.parse::<u64>().unwrap_or(u64::MAX);
    Some(Duration::from_secs(secs.min(MAX_DELTA_SECONDS)))
}

pub fn has_validator(headers: &HeaderMap) -> bool {
    headers.contains_key(http::header::ETAG) || headers.contains_key(http::header::LAST_MODIFIED)
}
