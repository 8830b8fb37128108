/// Voice command grammar
pub mod grammar;

/// Continuous recognition session management
pub mod recognition;

/// Transient user-visible status messages
pub mod status;

/// Configuration loading and validation
pub mod config;

/// Utility modules
pub mod utils;
