//! Structured logging and ndjson output.

mod format;

pub use format::{ErrorLine, StructuredLogger};
