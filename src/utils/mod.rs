//! Generic utility primitives with zero deployment knowledge.
//!
//! - `artifact` - Build artifact lookup by extension
//! - `files` - Recursive regular-file walking
//! - `io` - File I/O with consistent error handling
//! - `parser` - Text extraction from command output
//! - `shell` - Shell escaping and quoting
//! - `template` - `${key}` placeholder rendering
//! - `validation` - Required-value helpers

pub mod artifact;
pub mod files;
pub mod io;
pub mod parser;
pub mod shell;
pub mod template;
pub mod validation;
