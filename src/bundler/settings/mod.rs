//! Configuration structures for DMG bundling.
//!
//! [`DmgSettings`] holds the user-tunable layout (from a TOML file or
//! defaults); [`DmgSpecification`] is the fully resolved description handed
//! to the DMG builder.

mod dmg;
mod macos;

// Re-export all public types
pub use dmg::{ContentEntry, ContentKind, DmgSpecification, MAX_TITLE_LENGTH, validate_title};
pub use macos::{DmgFilesystem, DmgFormat, DmgSettings};
