//! DMG bundling.
//!
//! # Overview
//!
//! 1. [`settings`] describes the DMG (layout, format, contents)
//! 2. [`icon`] composes the volume icon from the app icon and a disk template
//! 3. [`platform::macos::dmg`] assembles the disk image with hdiutil
//!
//! # Example
//!
//! ```no_run
//! use dmg_bundler::bundler::{DmgSettings, DmgSpecification, platform::macos::dmg};
//! use std::path::Path;
//!
//! # async fn example() -> dmg_bundler::bundler::Result<()> {
//! let spec = DmgSpecification::drag_to_install(
//!     "MyApp",
//!     Path::new("build/MyApp.app"),
//!     &DmgSettings::default(),
//! )?;
//! dmg::build_dmg(&spec, Path::new("dist/MyApp 1.0.0.dmg"), |step| log::info!("{step}")).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod icon;
pub mod platform;
pub mod settings;
pub mod utils;

pub use error::{Error, Result};
pub use settings::{
    ContentEntry, ContentKind, DmgFilesystem, DmgFormat, DmgSettings, DmgSpecification,
};
