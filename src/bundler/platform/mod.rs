//! Platform-specific packaging.

pub mod macos;
