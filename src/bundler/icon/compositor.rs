//! Single-variant composition: one app image onto one template image.

use bytes::Bytes;

use super::container::VariantTag;
use super::engine::ImageEngine;
use super::error::IconError;
use super::geometry::CompositionPlan;

/// Compose `app` onto `background` for variant `tag` and return PNG bytes
/// sized to the template canvas.
///
/// Inputs and intermediates are staged in a private temporary directory that
/// is removed when this function returns, whether it succeeds or not.
pub async fn compose_variant<E: ImageEngine>(
    engine: &E,
    tag: VariantTag,
    app: &[u8],
    background: &[u8],
) -> Result<Bytes, IconError> {
    log::debug!("Composing variant {}", tag);

    let scratch = tempfile::Builder::new()
        .prefix("dmg-icon-")
        .tempdir()
        .map_err(|e| IconError::io("creating scratch directory", std::env::temp_dir(), e))?;

    let app_path = scratch.path().join("app");
    let background_path = scratch.path().join("background");
    let distorted_path = scratch.path().join("distorted.png");
    let composed_path = scratch.path().join("composed.png");

    tokio::fs::write(&app_path, app)
        .await
        .map_err(|e| IconError::io("staging app image", &app_path, e))?;
    tokio::fs::write(&background_path, background)
        .await
        .map_err(|e| IconError::io("staging template image", &background_path, e))?;

    let (app_size, background_size) = tokio::try_join!(
        engine.dimensions(&app_path),
        engine.dimensions(&background_path)
    )
    .map_err(|e| decode_error(tag, e))?;

    let plan = CompositionPlan::new(app_size, background_size).map_err(|e| IconError::ImageDecode {
        tag,
        reason: e.to_string(),
    })?;
    log::debug!(
        "{}: app {} -> {} over template {}, lifted {:.3}px",
        tag,
        app_size,
        plan.resize_extent(),
        background_size,
        plan.lift
    );

    engine.distort(&app_path, &plan, &distorted_path).await?;
    engine
        .composite(&background_path, &distorted_path, &plan, &composed_path)
        .await?;

    let composed = tokio::fs::read(&composed_path)
        .await
        .map_err(|e| IconError::io("reading composed image", &composed_path, e))?;

    Ok(Bytes::from(composed))
}

/// Size probing failures mean the variant's bytes are not a usable image.
fn decode_error(tag: VariantTag, error: IconError) -> IconError {
    match error {
        IconError::ImageDecode { .. } => error,
        other => IconError::ImageDecode {
            tag,
            reason: other.to_string(),
        },
    }
}
