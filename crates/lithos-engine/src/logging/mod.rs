//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only talks to the `log`
//! facade; `env_logger` is installed once by the application.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
