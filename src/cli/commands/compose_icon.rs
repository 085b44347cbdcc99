//! `compose-icon`: run the icon pipeline on two ICNS files.

use std::sync::Arc;

use crate::bundler::icon::{AvailabilityGate, ENGINE_TIMEOUT, IconOutcome, compose_icon};
use crate::cli::ComposeIconArgs;
use crate::error::Result;

/// Compose `args.app_icon` onto `args.template` and write `args.output`
pub async fn execute(args: ComposeIconArgs) -> Result<()> {
    let engine = Arc::new(args.engine.image_magick(ENGINE_TIMEOUT));
    let mut gate = AvailabilityGate::new();

    match compose_icon(engine, &mut gate, &args.app_icon, &args.template, &args.output).await? {
        IconOutcome::Composed(report) => {
            log::info!(
                "✓ Composed {} variants into {}",
                report.composed.len() + usize::from(report.forced_from.is_some()),
                args.output.display()
            );
            if !report.skipped.is_empty() {
                log::debug!("skipped variants: {:?}", report.skipped);
            }
        }
        IconOutcome::Fallback => {
            log::info!("Copied template icon to {}", args.output.display());
        }
    }

    Ok(())
}
