use tracing::trace;

use super::{CacheKey, CacheRecord, CacheService, CacheStatus};
use crate::http::{HttpResponse, RequestContext, RequestOptions};

/// Outcome of a cache lookup, as reported in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Fresh,
    Stale,
    Miss,
    Bypass,
}

impl CacheLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLookup::Fresh => "fresh",
            CacheLookup::Stale => "stale",
            CacheLookup::Miss => "miss",
            CacheLookup::Bypass => "bypass",
        }
    }
}

/// Cache access for a single request. The key is computed once, up front.
pub struct CacheProxy<'a> {
    service: &'a CacheService,
    request: RequestOptions,
    key: CacheKey,
}

impl<'a> CacheProxy<'a> {
    pub fn new(service: &'a CacheService, request: &RequestOptions) -> Self {
        Self {
            service,
            key: CacheKey::new(request),
            request: request.clone(),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns true when `context.response` now holds a fresh cached
    /// response. A stale entry is handed to the context as a conditional seed
    /// and still reports false.
    pub fn read_response_from_cache(&self, context: &mut RequestContext) -> bool {
        self.lookup(context) == CacheLookup::Fresh
    }

    pub fn lookup(&self, context: &mut RequestContext) -> CacheLookup {
        let outcome = self.lookup_inner(context);
        trace!(key = %self.key, outcome = outcome.as_str(), "cache lookup");
        crate::metrics::record_cache_lookup(outcome.as_str());
        outcome
    }

    fn lookup_inner(&self, context: &mut RequestContext) -> CacheLookup {
        if !self.service.is_running() {
            return CacheLookup::Bypass;
        }
        let strategy = self.service.strategy();
        if !strategy.could_use_cache(&self.request) {
            return CacheLookup::Bypass;
        }

        let Some(record) = self.service.disk().get(self.key.as_str()) else {
            return CacheLookup::Miss;
        };
        let mut cached = record.decode();
        cached.response_code = 200;
        cached.parse_headers();

        match strategy.run_strategy(&self.request, &cached) {
            CacheStatus::Fresh => {
                context.response = cached;
                CacheLookup::Fresh
            }
            CacheStatus::Stale => {
                context.set_cache_response(cached);
                CacheLookup::Stale
            }
            CacheStatus::Denied => CacheLookup::Miss,
        }
    }

    /// Stores `response` under this request's key if the service is running
    /// and the policy allows it. Returns whether a record was handed to the
    /// cache.
    pub fn write_response_to_cache(&self, response: &HttpResponse) -> bool {
        if !self.service.is_running() {
            return false;
        }
        if !self.service.strategy().is_cacheable(&self.request, response) {
            trace!(key = %self.key, code = response.response_code, "response not cacheable");
            return false;
        }

        self.service
            .disk()
            .put(self.key.as_str(), CacheRecord::encode(response));
        crate::metrics::record_cache_store();
        true
    }
}
