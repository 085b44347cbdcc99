//! Volume icon composition.
//!
//! Renders the application's icon in perspective onto a disk icon template,
//! variant by variant, and writes the result as a new ICNS file.
//!
//! # Architecture
//!
//! - `container` - ICNS decode/encode and image-variant filtering
//! - `geometry` - perspective, resize and offset math
//! - `engine` - external image engine ([`ImageMagick`])
//! - `compositor` - one app image onto one template image
//! - `variants` - concurrent fan-out over all variants
//! - `toolchain` - engine availability gate
//! - `cache` - content-addressed cache of composed icons

mod cache;
mod compositor;
mod container;
mod engine;
mod error;
mod geometry;
mod toolchain;
mod variants;

use std::path::Path;
use std::sync::Arc;

pub use cache::IconCache;
pub use compositor::compose_variant;
pub use container::{IconContainer, VariantTag, is_image_variant};
pub use engine::{ENGINE_TIMEOUT, ImageEngine, ImageMagick};
pub use error::IconError;
pub use geometry::{CompositionPlan, ControlPoint, Dimensions, PlanError};
pub use toolchain::{Availability, AvailabilityGate};
pub use variants::{ComposedIcon, CompositionReport, compose_variants};

/// How the destination icon was produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconOutcome {
    /// Fully composed
    Composed(CompositionReport),
    /// Engine unavailable; the template was copied verbatim
    Fallback,
}

/// Compose `app_icon` onto `template_icon` and write the ICNS to `destination`.
///
/// If the engine cannot be made available, `template_icon` is copied to
/// `destination` unchanged and [`IconOutcome::Fallback`] is returned. On any
/// other failure nothing is written.
pub async fn compose_icon<E: ImageEngine>(
    engine: Arc<E>,
    gate: &mut AvailabilityGate,
    app_icon: &Path,
    template_icon: &Path,
    destination: &Path,
) -> Result<IconOutcome, IconError> {
    if gate.resolve(engine.as_ref()).await != Availability::Available {
        let unavailable = IconError::ToolchainUnavailable {
            engine: engine.name().to_string(),
        };
        log::warn!("{}", unavailable);
        copy_verbatim(template_icon, destination).await?;
        return Ok(IconOutcome::Fallback);
    }

    log::debug!(
        "in compose_icon app_icon={} template_icon={} destination={}",
        app_icon.display(),
        template_icon.display(),
        destination.display()
    );

    let app_bytes = tokio::fs::read(app_icon)
        .await
        .map_err(|e| IconError::io("reading app icon", app_icon, e))?;
    let template_bytes = tokio::fs::read(template_icon)
        .await
        .map_err(|e| IconError::io("reading template icon", template_icon, e))?;

    let composed = compose_variants(engine, &app_bytes, &template_bytes).await?;
    let encoded = composed.encode()?;
    write_atomically(destination, &encoded).await?;
    log::debug!("written to {}", destination.display());

    Ok(IconOutcome::Composed(composed.report))
}

async fn copy_verbatim(source: &Path, destination: &Path) -> Result<(), IconError> {
    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| IconError::io("reading template icon", source, e))?;
    write_atomically(destination, &bytes).await
}

/// Write through a sibling `.partial` file so a failed write never leaves a
/// truncated destination behind.
async fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), IconError> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| IconError::io("creating output directory", parent, e))?;
    }

    let mut partial = destination.as_os_str().to_owned();
    partial.push(".partial");
    let partial = std::path::PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(IconError::io("writing icon", &partial, e));
    }
    if let Err(e) = tokio::fs::rename(&partial, destination).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(IconError::io("moving icon into place", destination, e));
    }
    Ok(())
}
