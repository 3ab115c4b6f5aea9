//! Common utilities for SharePlate client-side tooling

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, ShareError};
pub use logging::{init_default_logging, init_logging, LoggingConfig};
