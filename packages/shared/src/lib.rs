//! Shared utilities for the chat relay binaries.

pub mod logger;
pub mod time;
