//! External image engine used for distortion and compositing.
//!
//! The pipeline talks to the engine through [`ImageEngine`] so the
//! orchestration can be driven without a real toolchain. [`ImageMagick`]
//! is the production implementation and shells out to `magick`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::error::IconError;
use super::geometry::{CompositionPlan, Dimensions};

/// Default limit for a single distort/composite/identify invocation.
pub const ENGINE_TIMEOUT: Duration = Duration::from_secs(60);

/// Version probes should answer almost immediately.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Package manager installs can take a while on a cold runner.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Operations the icon pipeline needs from an image toolchain.
///
/// Every method may block on an external process, so all of them are async.
pub trait ImageEngine: Send + Sync + 'static {
    /// Human-readable name for log messages.
    fn name(&self) -> &str;

    /// Whether the engine can be invoked right now.
    fn probe(&self) -> impl Future<Output = bool> + Send;

    /// Try to install the engine. Returns `true` if the installer reported success.
    fn install(&self) -> impl Future<Output = bool> + Send;

    /// Pixel size of the image stored at `image`.
    fn dimensions(&self, image: &Path) -> impl Future<Output = Result<Dimensions, IconError>> + Send;

    /// Apply the plan's perspective distortion and forced resize to `source`,
    /// writing a PNG with alpha to `output`.
    fn distort(
        &self,
        source: &Path,
        plan: &CompositionPlan,
        output: &Path,
    ) -> impl Future<Output = Result<(), IconError>> + Send;

    /// Draw `overlay` centred on `background`, lifted by the plan's offset,
    /// writing a PNG the size of `background` to `output`.
    fn composite(
        &self,
        background: &Path,
        overlay: &Path,
        plan: &CompositionPlan,
        output: &Path,
    ) -> impl Future<Output = Result<(), IconError>> + Send;
}

/// ImageMagick 7 driven through its `magick` command.
#[derive(Clone, Debug)]
pub struct ImageMagick {
    program: PathBuf,
    timeout: Duration,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMagick {
    /// Use `magick` from `PATH`, resolved lazily on each invocation.
    pub fn new() -> Self {
        ImageMagick {
            program: PathBuf::from("magick"),
            timeout: ENGINE_TIMEOUT,
        }
    }

    /// Use an explicit binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        ImageMagick {
            program: program.into(),
            timeout: ENGINE_TIMEOUT,
        }
    }

    /// Override the per-invocation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolved_program(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    /// Run `magick` with `args`, mapping spawn errors, non-zero exits and
    /// timeouts onto [`IconError::EngineFailed`]. Returns stdout.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, IconError> {
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        log::debug!("Running {}", command_line);

        let program = self.resolved_program().unwrap_or_else(|| self.program.clone());
        let result = timeout(
            self.timeout,
            Command::new(&program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Err(_) => Err(IconError::EngineFailed {
                command: command_line,
                reason: format!("timed out after {} seconds", self.timeout.as_secs()),
            }),
            Ok(Err(e)) => Err(IconError::EngineFailed {
                command: command_line,
                reason: format!("failed to execute: {e}"),
            }),
            Ok(Ok(output)) if output.status.success() => Ok(output.stdout),
            Ok(Ok(output)) => Err(IconError::EngineFailed {
                command: command_line,
                reason: format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }),
        }
    }
}

impl ImageEngine for ImageMagick {
    fn name(&self) -> &str {
        "ImageMagick"
    }

    async fn probe(&self) -> bool {
        let Some(program) = self.resolved_program() else {
            log::debug!("{} not found in PATH", self.program.display());
            return false;
        };

        let status = timeout(
            PROBE_TIMEOUT,
            Command::new(&program)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status(),
        )
        .await;

        match status {
            Ok(Ok(status)) if status.success() => {
                log::debug!("Found ImageMagick at: {}", program.display());
                true
            }
            Ok(Ok(status)) => {
                log::warn!(
                    "{} found but -version check failed (exit code: {:?})",
                    program.display(),
                    status.code()
                );
                false
            }
            Ok(Err(e)) => {
                log::warn!("{} found but failed to execute: {}", program.display(), e);
                false
            }
            Err(_) => {
                log::warn!(
                    "{} -version timed out after {} seconds",
                    program.display(),
                    PROBE_TIMEOUT.as_secs()
                );
                false
            }
        }
    }

    async fn install(&self) -> bool {
        let Ok(brew) = which::which("brew") else {
            log::warn!("Homebrew not found; cannot install ImageMagick");
            return false;
        };

        log::info!("installing ImageMagick");
        let status = timeout(
            INSTALL_TIMEOUT,
            Command::new(brew)
                .args(["install", "imagemagick"])
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .status(),
        )
        .await;

        match status {
            Ok(Ok(status)) if status.success() => true,
            Ok(Ok(status)) => {
                log::warn!("failed to install ImageMagick (exit code: {:?})", status.code());
                false
            }
            Ok(Err(e)) => {
                log::warn!("failed to install ImageMagick: {}", e);
                false
            }
            Err(_) => {
                log::warn!(
                    "failed to install ImageMagick: timed out after {} seconds",
                    INSTALL_TIMEOUT.as_secs()
                );
                false
            }
        }
    }

    async fn dimensions(&self, image: &Path) -> Result<Dimensions, IconError> {
        // PNG headers are read natively; JPEG 2000 payloads need the engine.
        let path = image.to_path_buf();
        let native = tokio::task::spawn_blocking(move || -> std::io::Result<(u32, u32)> {
            image::ImageReader::open(&path)?
                .with_guessed_format()?
                .into_dimensions()
                .map_err(std::io::Error::other)
        })
        .await;
        if let Ok(Ok((width, height))) = native {
            return Ok(Dimensions::new(width, height));
        }

        let path = path_str(image)?;
        let stdout = self.run(&["identify", "-format", "%w %h\n", path]).await?;
        parse_identify(&stdout).ok_or_else(|| IconError::EngineFailed {
            command: format!("{} identify {}", self.program.display(), path),
            reason: format!(
                "unexpected output {:?}",
                String::from_utf8_lossy(&stdout).trim()
            ),
        })
    }

    async fn distort(
        &self,
        source: &Path,
        plan: &CompositionPlan,
        output: &Path,
    ) -> Result<(), IconError> {
        let perspective = plan.perspective_argument();
        let resize = plan.resize_argument();
        let target = format!("PNG32:{}", path_str(output)?);
        self.run(&[
            path_str(source)?,
            "-alpha",
            "set",
            "-virtual-pixel",
            "transparent",
            "-distort",
            "Perspective",
            &perspective,
            "-resize",
            &resize,
            &target,
        ])
        .await
        .map(drop)
    }

    async fn composite(
        &self,
        background: &Path,
        overlay: &Path,
        plan: &CompositionPlan,
        output: &Path,
    ) -> Result<(), IconError> {
        let offset = plan.offset_argument();
        let target = format!("PNG32:{}", path_str(output)?);
        self.run(&[
            path_str(background)?,
            path_str(overlay)?,
            "-gravity",
            "Center",
            "-geometry",
            &offset,
            "-composite",
            &target,
        ])
        .await
        .map(drop)
    }
}

fn path_str(path: &Path) -> Result<&str, IconError> {
    path.to_str().ok_or_else(|| IconError::EngineFailed {
        command: "magick".to_string(),
        reason: format!("path contains non-UTF8 characters: {}", path.display()),
    })
}

/// Parse the first `W H` line printed by `identify -format "%w %h\n"`.
fn parse_identify(stdout: &[u8]) -> Option<Dimensions> {
    let text = std::str::from_utf8(stdout).ok()?;
    let mut parts = text.lines().next()?.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some(Dimensions::new(width, height))
}
