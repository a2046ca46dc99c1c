#![allow(dead_code)]

pub mod dirs;
pub mod logging;
pub mod transport;

pub use dirs::TestDirs;
pub use logging::LogCapture;
pub use transport::{CountingTransport, FixedStrategy, response_with_body};
