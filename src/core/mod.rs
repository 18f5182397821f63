//! Shared building blocks: path registry and unit formatting.

pub mod paths;
pub mod units;
