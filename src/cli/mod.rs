//! Command line interface for the DMG bundler.

mod args;
pub mod commands;

pub use args::{Args, Command, ComposeIconArgs, DmgArgs, EngineArgs};

use crate::bundler::icon::ImageMagick;
use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    match args.command {
        Command::Dmg(dmg) => commands::dmg::execute(dmg).await?,
        Command::ComposeIcon(compose) => commands::compose_icon::execute(compose).await?,
    }

    Ok(0)
}

impl EngineArgs {
    /// ImageMagick configured from `--magick` and the effective timeout
    pub(crate) fn image_magick(&self, default_timeout: std::time::Duration) -> ImageMagick {
        let timeout = self
            .engine_timeout
            .map(std::time::Duration::from_secs)
            .unwrap_or(default_timeout);
        ImageMagick::with_program(&self.magick).timeout(timeout)
    }
}
