use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use bytes::Bytes;

use respcache::cache::{CacheStatus, CacheStrategy};
use respcache::http::{HttpResponse, RequestContext, RequestOptions, Transport};

/// Transport stub that answers every request with the same response and
/// counts how often it was reached.
pub struct CountingTransport {
    calls: AtomicUsize,
    response: HttpResponse,
    fail: bool,
    seeds: Mutex<Vec<Option<HttpResponse>>>,
}

impl CountingTransport {
    pub fn new(response: HttpResponse) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response,
            fail: false,
            seeds: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(HttpResponse::default())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conditional seeds seen by each call, in order.
    pub fn seeds(&self) -> Vec<Option<HttpResponse>> {
        self.seeds.lock().unwrap().clone()
    }
}

impl Transport for CountingTransport {
    fn execute(&self, context: &mut RequestContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seeds
            .lock()
            .unwrap()
            .push(context.cache_response().cloned());
        if self.fail {
            bail!("connection refused");
        }
        context.response = self.response.clone();
        Ok(())
    }
}

/// Strategy with fixed answers, for driving the proxy into each branch.
pub struct FixedStrategy {
    pub use_cache: bool,
    pub cacheable: bool,
    pub status: CacheStatus,
}

impl FixedStrategy {
    pub fn fresh() -> Self {
        Self {
            use_cache: true,
            cacheable: true,
            status: CacheStatus::Fresh,
        }
    }

    pub fn with_status(status: CacheStatus) -> Self {
        Self {
            status,
            ..Self::fresh()
        }
    }
}

impl CacheStrategy for FixedStrategy {
    fn could_use_cache(&self, _request: &RequestOptions) -> bool {
        self.use_cache
    }

    fn is_cacheable(&self, _request: &RequestOptions, _response: &HttpResponse) -> bool {
        self.cacheable
    }

    fn run_strategy(&self, _request: &RequestOptions, _cached: &HttpResponse) -> CacheStatus {
        self.status
    }
}

pub fn response_with_body(body: &str) -> HttpResponse {
    let mut response = HttpResponse {
        raw_header: "HTTP/1.1 200 OK\r\nCache-Control: max-age=3600\r\nETag: \"v1\"\r\n\r\n"
            .to_string(),
        result: Bytes::from(body.to_string()),
        response_code: 200,
        response_time: respcache::http::now_http_date(),
        request_time: respcache::http::now_http_date(),
        ..HttpResponse::default()
    };
    response.parse_headers();
    response
}
