use std::time::Duration;

use anyhow::{Result, anyhow};
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogFormat;

const DEFAULT_FILTER: &str = "info";

pub fn init_logger(format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => fmt::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .try_init()
            .map_err(|err| anyhow!(err))?,
        LogFormat::Text => fmt::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .map_err(|err| anyhow!(err))?,
    }

    Ok(())
}

/// One line per request that went through the response cache.
#[derive(Debug, Clone)]
pub struct CacheAccessEvent {
    pub method: String,
    pub url: String,
    pub cache_lookup: Option<String>,
    pub cache_store: Option<String>,
    pub status: u16,
    pub bytes: u64,
    pub elapsed_ms: u128,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct CacheAccessBuilder {
    event: CacheAccessEvent,
}

impl CacheAccessBuilder {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            event: CacheAccessEvent {
                method: method.into(),
                url: url.into(),
                cache_lookup: None,
                cache_store: None,
                status: 0,
                bytes: 0,
                elapsed_ms: 0,
                error: None,
            },
        }
    }

    pub fn cache_lookup(mut self, value: impl Into<String>) -> Self {
        self.event.cache_lookup = Some(value.into());
        self
    }

    pub fn cache_store(mut self, value: impl Into<String>) -> Self {
        self.event.cache_store = Some(value.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.event.status = status;
        self
    }

    pub fn bytes(mut self, bytes: u64) -> Self {
        self.event.bytes = bytes;
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.event.elapsed_ms = elapsed.as_millis();
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.event.error = Some(error.into());
        self
    }

    pub fn build(self) -> CacheAccessEvent {
        self.event
    }

    pub fn log(self) {
        log_cache_access(self.build());
    }
}

pub fn log_cache_access(event: CacheAccessEvent) {
    let CacheAccessEvent {
        method,
        url,
        cache_lookup,
        cache_store,
        status,
        bytes,
        elapsed_ms,
        error,
    } = event;

    let ts = timestamp(OffsetDateTime::now_utc());
    let cache_lookup_field = cache_lookup.as_deref();
    let cache_store_field = cache_store.as_deref();
    let error_field = error.as_deref();

    tracing::info!(
        target = "cache_access",
        ts,
        method,
        url,
        cache_lookup = cache_lookup_field,
        cache_store = cache_store_field,
        status,
        bytes,
        elapsed_ms,
        error = error_field
    );
}

fn timestamp(now: OffsetDateTime) -> String {
    let (year, month, day) = now.to_calendar_date();
    let (hour, minute, second) = now.to_hms();
    let millisecond = now.millisecond();
    let month_number: u8 = month.into();
    format!(
        "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millisecond:03}Z",
        month = month_number
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        buf: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buf.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn strip_ansi(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\x1b' && chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next == 'm' {
                        break;
                    }
                }
                continue;
            }
            out.push(ch);
        }
        out
    }

    #[test]
    fn cache_access_includes_cache_fields() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = BufferWriter {
            buf: buffer.clone(),
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_target(false)
            .without_time()
            .compact()
            .finish();

        let event = CacheAccessBuilder::new("GET", "http://example.com/resource")
            .status(200)
            .cache_lookup("fresh")
            .cache_store("skipped")
            .build();

        tracing::subscriber::with_default(subscriber, || {
            log_cache_access(event);
        });

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        let output = strip_ansi(&output);
        assert!(
            output.contains("cache_lookup=\"fresh\""),
            "missing cache_lookup in output: {output}"
        );
        assert!(
            output.contains("cache_store=\"skipped\""),
            "missing cache_store in output: {output}"
        );
        assert!(
            output.contains("cache_access"),
            "missing event target in output: {output}"
        );
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = timestamp(OffsetDateTime::UNIX_EPOCH + time::Duration::milliseconds(1_234));
        assert_eq!(ts, "1970-01-01T00:00:01.234Z");
    }
}
