//! macOS DMG bundler library
//!
//! Packages an .app bundle into a drag-to-install disk image whose volume
//! icon is the app's icon drawn onto a disk icon template. The icon pipeline
//! lives in [`bundler::icon`] and can be used on its own.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
pub use metadata::AppInfo;
