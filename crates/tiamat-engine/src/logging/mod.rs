//! Logging utilities.
//!
//! Centralizes logger initialization. The engine logs through the standard
//! `log` facade; resource reallocation events are emitted at info level so
//! resize churn stays observable.

mod init;

pub use init::{init_logging, LoggingConfig};
