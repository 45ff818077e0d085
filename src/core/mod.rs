// Public modules
pub mod config;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod init;
pub mod paths;
pub mod pipeline;
pub mod placeholders;
pub mod server;
pub mod ssh;
pub mod templates;
pub mod validator;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
