//! Per-variant fan-out over an app icon and a template icon.
//!
//! Every image variant of the app icon that has a same-tag counterpart in the
//! template is composed concurrently. Once all passes have finished, the
//! maximum variant is forced in from the largest app image if the app icon
//! did not supply one itself.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;

use super::compositor::compose_variant;
use super::container::{IconContainer, VariantTag};
use super::engine::ImageEngine;
use super::error::IconError;

/// What happened to each variant during composition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositionReport {
    /// Tags composed from their own app image, ascending
    pub composed: Vec<VariantTag>,
    /// App tags with no template counterpart, ascending
    pub skipped: Vec<VariantTag>,
    /// App tag whose image was reused for the maximum variant, if it had to be forced
    pub forced_from: Option<VariantTag>,
}

/// Output of [`compose_variants`].
#[derive(Clone, Debug)]
pub struct ComposedIcon {
    /// Composed image variants
    pub container: IconContainer,
    /// Per-variant bookkeeping
    pub report: CompositionReport,
}

impl ComposedIcon {
    /// Serialize the composed variants into ICNS bytes.
    pub fn encode(&self) -> Result<Vec<u8>, IconError> {
        self.container.encode()
    }
}

/// Compose every matching variant of `app_icon` onto `template_icon`.
///
/// Both inputs are raw ICNS bytes. Any failed pass aborts the remaining
/// passes and fails the whole call; only missing template counterparts are
/// tolerated.
pub async fn compose_variants<E: ImageEngine>(
    engine: Arc<E>,
    app_icon: &[u8],
    template_icon: &[u8],
) -> Result<ComposedIcon, IconError> {
    let template = IconContainer::decode(template_icon)?.images();
    let app = IconContainer::decode(app_icon)?.images();
    log::debug!(
        "dissected app icon ({} variants) and template icon ({} variants)",
        app.len(),
        template.len()
    );

    if app.is_empty() {
        return Err(IconError::MalformedContainer {
            reason: "app icon contains no image variants".to_string(),
        });
    }
    let Some(template_maximum) = template.get(VariantTag::MAXIMUM).cloned() else {
        return Err(IconError::MissingMaximumVariant {
            tag: VariantTag::MAXIMUM,
        });
    };

    let mut report = CompositionReport::default();
    let mut passes: JoinSet<(VariantTag, Result<Bytes, IconError>)> = JoinSet::new();

    for (tag, app_image) in app.iter() {
        let Some(template_image) = template.get(tag) else {
            log::warn!("there is no base image for this type: {}", tag);
            report.skipped.push(tag);
            continue;
        };

        let engine = Arc::clone(&engine);
        let app_image = app_image.clone();
        let template_image = template_image.clone();
        passes.spawn(async move {
            let result = compose_variant(engine.as_ref(), tag, &app_image, &template_image).await;
            (tag, result)
        });
    }

    let mut container = IconContainer::new();
    while let Some(joined) = passes.join_next().await {
        let (tag, result) = joined.map_err(|e| IconError::TaskFailed {
            reason: e.to_string(),
        })?;
        // Dropping `passes` on early return aborts the passes still running.
        let composed = result?;
        container.insert(tag, composed);
        report.composed.push(tag);
    }
    report.composed.sort();
    log::debug!("done all the composes ({} variants)", report.composed.len());

    if !container.contains(VariantTag::MAXIMUM) {
        let (source_tag, source) = app
            .largest()
            .map(|(tag, data)| (tag, data.clone()))
            .ok_or_else(|| IconError::MalformedContainer {
                reason: "app icon contains no image variants".to_string(),
            })?;
        log::debug!(
            "forcing {} from app variant {} ({} bytes)",
            VariantTag::MAXIMUM,
            source_tag,
            source.len()
        );

        let composed = compose_variant(
            engine.as_ref(),
            VariantTag::MAXIMUM,
            &source,
            &template_maximum,
        )
        .await?;
        container.insert(VariantTag::MAXIMUM, composed);
        report.forced_from = Some(source_tag);
    }

    Ok(ComposedIcon { container, report })
}
