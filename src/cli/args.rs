//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Packages a macOS .app into a drag-to-install DMG
#[derive(Parser, Debug)]
#[command(
    name = "dmg_bundler",
    version,
    about = "Packages a macOS .app into a drag-to-install DMG",
    long_about = "Packages a macOS .app bundle into a drag-to-install DMG.

The volume icon is composed by drawing the app's icon in perspective onto a
disk icon template, one resolution at a time. Without ImageMagick the template
is used unchanged.

Usage:
  dmg_bundler dmg --app build/MyApp.app --dmg dist
  dmg_bundler compose-icon --app-icon AppIcon.icns --template disk.icns --output volume.icns

Exit code 0 = artifact guaranteed to exist at output path."
)]
pub struct Args {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a DMG from an .app bundle
    Dmg(DmgArgs),
    /// Compose a volume icon without building a DMG
    ComposeIcon(ComposeIconArgs),
}

/// Image engine selection shared by both subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// ImageMagick binary used for composition
    #[arg(long, env = "DMG_BUNDLER_MAGICK", value_name = "PATH", default_value = "magick")]
    pub magick: PathBuf,

    /// Seconds allowed for each ImageMagick invocation (overrides the layout file)
    #[arg(long, value_name = "SECONDS")]
    pub engine_timeout: Option<u64>,
}

/// Arguments for `dmg`
#[derive(clap::Args, Debug)]
pub struct DmgArgs {
    /// Path to the .app bundle
    #[arg(long, env = "DMG_BUNDLER_APP", value_name = "PATH")]
    pub app: PathBuf,

    /// Volume title (defaults to the app name, at most 27 characters)
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Directory the DMG is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dmg: PathBuf,

    /// Ready-made volume icon; skips composition
    #[arg(long, value_name = "PATH")]
    pub icon: Option<PathBuf>,

    /// Disk icon the app icon is composed onto
    #[arg(long, value_name = "PATH")]
    pub icon_template: Option<PathBuf>,

    /// Window background image
    #[arg(long, value_name = "PATH")]
    pub background: Option<PathBuf>,

    /// TOML layout file (window size, positions, format, filesystem)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for cached composed icons
    #[arg(long, env = "DMG_BUNDLER_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always compose the icon, never read or write the cache
    #[arg(long)]
    pub no_cache: bool,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for `compose-icon`
#[derive(clap::Args, Debug)]
pub struct ComposeIconArgs {
    /// App icon (ICNS)
    #[arg(long, value_name = "PATH")]
    pub app_icon: PathBuf,

    /// Disk icon template (ICNS)
    #[arg(long, value_name = "PATH")]
    pub template: PathBuf,

    /// Destination ICNS file
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Dmg(args) => {
                if args.app.as_os_str().is_empty() {
                    return Err("app must be specified".to_string());
                }
                if args.icon.is_some() && args.icon_template.is_some() {
                    return Err("--icon and --icon-template cannot be used together".to_string());
                }
                if args.no_cache && args.cache_dir.is_some() {
                    return Err("--no-cache and --cache-dir cannot be used together".to_string());
                }
                validate_timeout(&args.engine)
            }
            Command::ComposeIcon(args) => {
                if args.app_icon == args.output || args.template == args.output {
                    return Err("--output must differ from the input icons".to_string());
                }
                validate_timeout(&args.engine)
            }
        }
    }
}

fn validate_timeout(engine: &EngineArgs) -> Result<(), String> {
    match engine.engine_timeout {
        Some(0) => Err("--engine-timeout must be at least 1 second".to_string()),
        _ => Ok(()),
    }
}
