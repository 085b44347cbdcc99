//! macOS DMG disk image creator.
//!
//! Builds drag-to-install DMG files from a [`DmgSpecification`] using the
//! native hdiutil tool.
//!
//! # Architecture
//!
//! This module is organized into logical submodules:
//! - `creation` - Staging contents and creating the writable image
//! - `customization` - Volume icon, background, window layout
//! - `conversion` - Format conversion (UDRW → final format)

mod conversion;
mod creation;
mod customization;

use crate::bundler::{error::Result, settings::DmgSpecification, utils::fs};
use std::path::Path;

// Re-export public functions from submodules
pub use conversion::convert_dmg;
pub use creation::{create_writable_dmg, stage_contents};
pub use customization::apply_dmg_customizations;

/// Build the DMG described by `spec` at `dmg_path`
///
/// # Process
/// 1. Stage the specification's contents in a temporary directory
/// 2. Create a writable UDRW image from the staging directory
/// 3. Mount it, copy background and volume icon, lay out the window
/// 4. Detach and convert to the requested format at `dmg_path`
/// 5. Clean up temporary files
///
/// `on_step` receives a short title as each step begins.
pub async fn build_dmg<F>(spec: &DmgSpecification, dmg_path: &Path, mut on_step: F) -> Result<()>
where
    F: FnMut(&str),
{
    log::debug!(
        "DMG specification: {}",
        serde_json::to_string(spec).unwrap_or_default()
    );

    if let Some(parent) = dmg_path.parent() {
        fs::create_dir_all(parent, false).await?;
    }

    // Create temporary staging directory
    let work_dir = tempfile::tempdir()?;
    let staging = work_dir.path().join("staging");
    fs::create_dir_all(&staging, false).await?;

    on_step("Copying files");
    stage_contents(spec, &staging).await?;

    on_step("Creating temporary image");
    let writable = work_dir.path().join("temporary.dmg");
    create_writable_dmg(spec, &staging, &writable).await?;

    apply_dmg_customizations(&writable, spec, &mut on_step).await?;

    on_step("Finalizing image");
    convert_dmg(&writable, spec.format, dmg_path).await?;

    log::info!("✓ Created DMG: {}", dmg_path.display());

    // tempfile automatically cleans up staging directory
    drop(work_dir);

    Ok(())
}
