//! Shared utilities

pub mod rate_limit;
pub mod ring;
pub mod time;
