//! Structured logging for ReelForge.
//!
//! Subscriber setup with a rolling NDJSON file, log redaction, and
//! structured client events (authorize, consume, purchase, stream).

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ClientEvent, EventLogEntry, EventLogger};
pub use logger::{init_logger, LogOutput};
pub use redact::{redact_sensitive_data, redact_user_id};
