//! Core DMG creation logic using hdiutil.
//!
//! Handles the fundamental DMG creation workflow including:
//! - Staging the specification's contents in a temporary directory
//! - Creating link entries (e.g. the Applications symlink)
//! - Running hdiutil to generate a read-write DMG for customization

use crate::bundler::{
    error::{Context, Error, ErrorExt, Result},
    settings::{ContentKind, DmgSpecification},
    utils::fs,
};
use std::path::Path;
use std::process::Output;
use tokio::fs::remove_file;

/// Run `hdiutil` and fail with its stderr if it exits unsuccessfully.
pub(super) async fn hdiutil(args: &[&str]) -> Result<Output> {
    let output = tokio::process::Command::new("hdiutil")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to execute hdiutil command: {}", e)))?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: format!("hdiutil {}", args.join(" ")),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Lay out the specification's contents in `staging`
///
/// `File` entries are copied (directories recursively, preserving symlinks);
/// `Link` entries become symlinks to their path, e.g.
/// `staging/Applications -> /Applications`.
pub async fn stage_contents(spec: &DmgSpecification, staging: &Path) -> Result<()> {
    for entry in &spec.contents {
        let dest = staging.join(entry.name()?);
        match entry.kind {
            ContentKind::File => {
                log::debug!("Copying {} to staging", entry.path.display());
                if entry.path.is_dir() {
                    fs::copy_dir(&entry.path, &dest).await.with_context(|| {
                        format!("copying {} to staging directory", entry.path.display())
                    })?;
                } else {
                    fs::copy_file(&entry.path, &dest).await?;
                }
            }
            ContentKind::Link => {
                log::debug!("Linking {} -> {}", dest.display(), entry.path.display());
                fs::symlink(&entry.path, &dest).fs_context("creating symlink", &dest)?;
            }
        }
    }
    Ok(())
}

/// Create a read-write (UDRW) DMG from `staging`
///
/// Customization needs a writable image; the final format is applied by
/// [`super::convert_dmg`] after the image is detached.
pub async fn create_writable_dmg(
    spec: &DmgSpecification,
    staging: &Path,
    dmg_path: &Path,
) -> Result<()> {
    // Remove old DMG if exists
    if dmg_path.exists() {
        remove_file(dmg_path)
            .await
            .fs_context("removing stale DMG", dmg_path)?;
    }

    let staging_str = staging.to_str().ok_or_else(|| {
        Error::GenericError("Invalid staging path (contains non-UTF8 characters)".into())
    })?;
    let dmg_str = dmg_path.to_str().ok_or_else(|| {
        Error::GenericError("Invalid DMG path (contains non-UTF8 characters)".into())
    })?;

    log::debug!("Creating writable {} DMG...", spec.filesystem.as_str());

    hdiutil(&[
        "create",
        "-volname",
        &spec.title,
        "-srcfolder",
        staging_str,
        "-fs",
        spec.filesystem.as_str(),
        "-ov", // Overwrite if exists
        "-format",
        "UDRW",
        dmg_str,
    ])
    .await?;

    log::debug!("Created writable DMG: {}", dmg_path.display());
    Ok(())
}
