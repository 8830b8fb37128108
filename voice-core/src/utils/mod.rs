/// Logging utilities
pub mod logging;

/// Global error handling
pub mod error;

/// Timer helpers
pub mod time;

// Re-export commonly used types
pub use error::{AppError, AppResult, ErrorCode, ErrorContext};
