//! DMG format conversion.
//!
//! Converts the read-write (UDRW) image used for customization into the
//! distribution format. This must happen after the image is detached:
//! changes made to a mounted compressed image live in a shadow file and are
//! discarded on detach.

use super::creation::hdiutil;
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    settings::DmgFormat,
};
use std::path::Path;
use tokio::fs::remove_file;

/// Convert `source` (UDRW) to `format`, writing `destination`
///
/// Any existing file at `destination` is replaced.
pub async fn convert_dmg(source: &Path, format: DmgFormat, destination: &Path) -> Result<()> {
    log::info!("Converting DMG to {} format...", format.as_str());

    let source_str = source
        .to_str()
        .ok_or_else(|| Error::GenericError("DMG path contains non-UTF8 characters".into()))?;
    let destination_str = destination.to_str().ok_or_else(|| {
        Error::GenericError("Output DMG path contains non-UTF8 characters".into())
    })?;

    if destination.exists() {
        remove_file(destination)
            .await
            .fs_context("removing previous DMG", destination)?;
    }

    hdiutil(&[
        "convert",
        source_str,
        "-format",
        format.as_str(),
        "-o",
        destination_str,
    ])
    .await?;

    log::info!("✓ DMG converted to {} format", format.as_str());

    Ok(())
}
