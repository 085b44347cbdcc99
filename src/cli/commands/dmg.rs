//! `dmg`: package an .app bundle into a drag-to-install DMG.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundler::icon::{AvailabilityGate, IconCache, IconOutcome, ImageMagick, compose_icon};
use crate::bundler::platform::macos::dmg::build_dmg;
use crate::bundler::{DmgSettings, DmgSpecification};
use crate::cli::DmgArgs;
use crate::error::{BundlerError, CliError, Result};
use crate::metadata::AppInfo;

/// Disk icon shipped with macOS, used when no template is given.
pub const DEFAULT_ICON_TEMPLATE: &str =
    "/System/Library/Extensions/IOStorageFamily.kext/Contents/Resources/Removable.icns";

/// Build `<dmg dir>/<App> <version>.dmg` from `args.app`
pub async fn execute(args: DmgArgs) -> Result<()> {
    let info = AppInfo::load(&args.app).await?;
    let app_name = info.name()?;

    let settings = match &args.config {
        Some(path) => DmgSettings::load(path).await?,
        None => DmgSettings::default(),
    };

    let title = args
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(app_name);
    let dmg_path = args.dmg.join(info.dmg_file_name()?);

    log::debug!(
        "app={} icon_file={:?} dmg={}",
        args.app.display(),
        info.icon_file,
        dmg_path.display()
    );

    // Holds the composed icon until the DMG is built
    let work_dir = tempfile::Builder::new().prefix("dmg-bundler-").tempdir()?;

    let icon = match (&args.icon, info.icon_path(&args.app)) {
        (Some(icon), _) => Some(icon.clone()),
        (None, Some(app_icon)) => match resolve_template(args.icon_template.as_deref()) {
            Some(template) => {
                let destination = work_dir.path().join("dmg-icon.icns");
                let engine = args.engine.image_magick(settings.engine_timeout());
                get_icon(&args, engine, &app_icon, &template, &destination).await?;
                Some(destination)
            }
            None => {
                log::warn!("No disk icon template available; the DMG will use the default volume icon");
                None
            }
        },
        (None, None) => None,
    };

    let spec = DmgSpecification::drag_to_install(title, &args.app, &settings)?
        .with_icon(icon)
        .with_background(args.background.clone());

    build_dmg(&spec, &dmg_path, |step| log::info!("{}", step))
        .await
        .map_err(|e| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "build_dmg".to_string(),
                reason: format!("Building the DMG failed. {}", e),
            })
        })?;

    Ok(())
}

/// Explicit template, else the system disk icon if this machine has it
fn resolve_template(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_ICON_TEMPLATE)).filter(|p| p.is_file()),
    }
}

/// Write the volume icon to `destination`, from the cache when possible
async fn get_icon(
    args: &DmgArgs,
    engine: ImageMagick,
    app_icon: &Path,
    template: &Path,
    destination: &Path,
) -> Result<()> {
    let cache = if args.no_cache {
        None
    } else {
        args.cache_dir
            .clone()
            .or_else(IconCache::default_dir)
            .map(IconCache::new)
    };

    let key = match &cache {
        Some(_) => Some(IconCache::key(app_icon, template).await?),
        None => None,
    };

    if let (Some(cache), Some(key)) = (&cache, &key) {
        if cache.restore(key, destination).await? {
            return Ok(());
        }
    }

    log::info!("generating icon");
    let mut gate = AvailabilityGate::new();
    let outcome = compose_icon(Arc::new(engine), &mut gate, app_icon, template, destination).await?;

    if let (IconOutcome::Composed(_), Some(cache), Some(key)) = (&outcome, &cache, &key) {
        if let Err(e) = cache.store(key, destination).await {
            log::warn!("Failed to cache composed icon: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_template_wins() {
        assert_eq!(
            resolve_template(Some(Path::new("disk.icns"))),
            Some(PathBuf::from("disk.icns"))
        );
    }
}
