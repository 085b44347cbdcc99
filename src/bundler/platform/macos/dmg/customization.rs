//! DMG appearance customization using AppleScript.
//!
//! Handles all DMG customization features including:
//! - Mounting DMG in read-write mode
//! - Copying the background image and volume icon
//! - Running AppleScript to set window properties and icon positions
//! - Detaching DMG after customization

use super::creation::hdiutil;
use crate::bundler::{
    error::{Error, Result},
    settings::DmgSpecification,
    utils::fs,
};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

/// Apply the specification's appearance to a read-write DMG
///
/// # Process
/// 1. Mount DMG in read-write mode
/// 2. Copy background image to `.background` and icon to `.VolumeIcon.icns`
/// 3. Run AppleScript to customize window appearance
/// 4. Detach DMG (even if an earlier step failed)
pub async fn apply_dmg_customizations<F>(
    dmg_path: &Path,
    spec: &DmgSpecification,
    on_step: &mut F,
) -> Result<()>
where
    F: FnMut(&str),
{
    on_step("Mounting temporary image");
    let mount_point = mount_dmg_rw(dmg_path, &spec.title).await?;

    let result = customize_mounted(&mount_point, spec, on_step).await;

    on_step("Unmounting temporary image");
    let detached = detach_dmg(&mount_point).await;
    settle(result, detached)
}

/// Combine the customization and detach outcomes, preferring the
/// customization error when both failed.
fn settle(customized: Result<()>, detached: Result<()>) -> Result<()> {
    match (customized, detached) {
        (Err(e), Err(detach_error)) => {
            log::warn!("DMG detach also failed: {}", detach_error);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), detached) => detached,
    }
}

async fn customize_mounted<F>(mount_point: &Path, spec: &DmgSpecification, on_step: &mut F) -> Result<()>
where
    F: FnMut(&str),
{
    if let Some(bg_path) = &spec.background {
        on_step("Copying background");
        let bg_filename = bg_path
            .file_name()
            .ok_or_else(|| Error::GenericError("Invalid background image path".into()))?;
        let dest_bg = mount_point.join(".background").join(bg_filename);
        fs::copy_file(bg_path, &dest_bg).await?;
        log::debug!("Copied background image to {}", dest_bg.display());
    }

    if let Some(icon_path) = &spec.icon {
        on_step("Copying icon");
        let dest_icon = mount_point.join(".VolumeIcon.icns");
        fs::copy_file(icon_path, &dest_icon).await?;
        set_custom_icon_flag(mount_point).await;
    }

    let disk_name = mount_point
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| spec.title.clone());

    on_step("Running AppleScript");
    run_dmg_applescript(spec, &disk_name).await
}

/// Mount DMG in read-write mode
///
/// Returns the mount point path
async fn mount_dmg_rw(dmg_path: &Path, volume_name: &str) -> Result<PathBuf> {
    log::debug!("Mounting DMG for customization...");

    let dmg_str = dmg_path
        .to_str()
        .ok_or_else(|| Error::GenericError("DMG path contains non-UTF8 characters".into()))?;

    let output = hdiutil(&["attach", dmg_str, "-readwrite", "-noverify", "-nobrowse"]).await?;

    // Mount point is usually /Volumes/{volume_name}, but a name clash adds a suffix
    let mount_point = parse_mount_point(&String::from_utf8_lossy(&output.stdout))
        .unwrap_or_else(|| PathBuf::from(format!("/Volumes/{}", volume_name)));

    // Wait for mount to be ready
    let max_retries = 10;
    for _ in 0..max_retries {
        if mount_point.exists() {
            log::debug!("DMG mounted at {}", mount_point.display());
            return Ok(mount_point);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Err(Error::GenericError(format!(
        "DMG mount point {} not found after {} retries",
        mount_point.display(),
        max_retries
    )))
}

/// Extract the mount point from `hdiutil attach` output
///
/// Each line is `device<TAB>partition type<TAB>mount point`; only the line for
/// the mounted volume has a third column.
fn parse_mount_point(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.split('\t').nth(2))
        .map(str::trim)
        .find(|column| column.starts_with('/'))
        .map(PathBuf::from)
}

/// Mark the volume root as having a custom icon
///
/// Needs `SetFile` from the Xcode command line tools. Without it the icon file
/// is still present but Finder ignores it, so this only warns.
async fn set_custom_icon_flag(mount_point: &Path) {
    let Ok(set_file) = which::which("SetFile") else {
        log::warn!("SetFile not found; volume icon will not be shown. Install the Xcode command line tools.");
        return;
    };

    match tokio::process::Command::new(set_file)
        .args(["-a", "C"])
        .arg(mount_point)
        .output()
        .await
    {
        Ok(output) if output.status.success() => {}
        Ok(output) => log::warn!(
            "SetFile -a C failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => log::warn!("Failed to run SetFile: {}", e),
    }
}

/// Escape special characters for AppleScript string literals
///
/// Escapes backslashes and double quotes to prevent script injection
/// and syntax errors when names contain special characters.
fn escape_applescript_string(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Build the Finder script that lays out the DMG window
fn build_applescript(spec: &DmgSpecification, disk_name: &str) -> Result<String> {
    let (width, height) = spec.window;

    let mut positions = String::new();
    for entry in &spec.contents {
        positions.push_str(&format!(
            "                set position of item \"{}\" to {{{}, {}}}\n",
            escape_applescript_string(entry.name()?),
            entry.x,
            entry.y
        ));
    }

    let background_clause = match spec.background.as_ref().and_then(|p| p.file_name()) {
        Some(name) => format!(
            r#"set background picture of viewOptions to file ".background:{}""#,
            escape_applescript_string(&name.to_string_lossy())
        ),
        None => String::new(),
    };

    Ok(format!(
        r#"
        tell application "Finder"
            tell disk "{volume_name}"
                open
                set current view of container window to icon view
                set toolbar visible of container window to false
                set statusbar visible of container window to false
                set bounds of container window to {{100, 100, {right}, {bottom}}}
                set viewOptions to icon view options of container window
                set arrangement of viewOptions to not arranged
                set icon size of viewOptions to {icon_size}
                {background_clause}
{positions}                close
                open
                update without registering applications
                delay 2
            end tell
        end tell
        "#,
        volume_name = escape_applescript_string(disk_name),
        right = 100 + width,
        bottom = 100 + height,
        icon_size = spec.icon_size,
        background_clause = background_clause,
        positions = positions,
    ))
}

/// Run AppleScript to customize DMG window appearance
async fn run_dmg_applescript(spec: &DmgSpecification, disk_name: &str) -> Result<()> {
    log::debug!("Running AppleScript to customize DMG window...");

    let script = build_applescript(spec, disk_name)?;

    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to run AppleScript: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!("AppleScript execution had issues: {}", stderr);
        // Don't fail - appearance customization is non-critical
    }

    Ok(())
}

/// Detach (unmount) DMG
async fn detach_dmg(mount_point: &Path) -> Result<()> {
    log::debug!("Detaching DMG...");

    // Wait for .DS_Store to be written
    tokio::time::sleep(Duration::from_secs(2)).await;

    let mount_str = mount_point.to_string_lossy();
    if let Err(e) = hdiutil(&["detach", &mount_str]).await {
        log::warn!("DMG detach had issues: {}", e);
        // Try force detach
        hdiutil(&["detach", &mount_str, "-force"])
            .await
            .map_err(|e| {
                Error::GenericError(format!(
                    "Failed to detach {}: {}",
                    mount_point.display(),
                    e
                ))
            })?;
    }

    Ok(())
}
