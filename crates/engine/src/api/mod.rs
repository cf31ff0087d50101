//! API layer - line command entry point.

pub mod commands;

pub use commands::{execute, parse_line, Command, CommandLine, CommandParseError, Response};
