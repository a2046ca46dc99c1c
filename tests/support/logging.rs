use std::io;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter};

#[derive(Clone)]
struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = BufferWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriterHandle {
            buffer: self.buffer.clone(),
        }
    }
}

struct BufferWriterHandle {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.buffer.lock().unwrap_or_else(|err| err.into_inner());
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures tracing output for tests using a shared global subscriber.
/// Captures are serialized so concurrent tests do not mix their output.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _turn: MutexGuard<'static, ()>,
}

static LOG_BUFFER: OnceLock<Arc<Mutex<Vec<u8>>>> = OnceLock::new();
static LOG_TURN: Mutex<()> = Mutex::new(());

impl LogCapture {
    pub fn new(filter: &str) -> Self {
        let turn = LOG_TURN.lock().unwrap_or_else(|err| err.into_inner());
        let buffer = LOG_BUFFER
            .get_or_init(|| {
                let buffer = Arc::new(Mutex::new(Vec::new()));
                let writer = BufferWriter {
                    buffer: buffer.clone(),
                };
                let subscriber = fmt::fmt()
                    .with_env_filter(EnvFilter::new(filter))
                    .with_target(false)
                    .with_ansi(false)
                    .compact()
                    .with_writer(writer)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
                buffer
            })
            .clone();
        buffer.lock().unwrap_or_else(|err| err.into_inner()).clear();
        Self {
            buffer,
            _turn: turn,
        }
    }

    pub fn text(&self) -> String {
        let guard = self.buffer.lock().unwrap_or_else(|err| err.into_inner());
        String::from_utf8_lossy(&guard).to_string()
    }
}
