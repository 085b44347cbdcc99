//! macOS DMG layout settings.

use std::path::Path;
use std::time::Duration;

use crate::bundler::error::{Error, ErrorExt, Result};

/// Final disk image format passed to `hdiutil convert -format`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DmgFormat {
    /// Read-only, uncompressed
    Udro,
    /// ADC-compressed
    Udco,
    /// zlib-compressed
    Udzo,
    /// bzip2-compressed
    Udbz,
    /// LZFSE-compressed (macOS 10.11+)
    #[default]
    Ulfo,
    /// LZMA-compressed (macOS 10.15+)
    Ulmo,
}

impl DmgFormat {
    /// Value for `hdiutil -format`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DmgFormat::Udro => "UDRO",
            DmgFormat::Udco => "UDCO",
            DmgFormat::Udzo => "UDZO",
            DmgFormat::Udbz => "UDBZ",
            DmgFormat::Ulfo => "ULFO",
            DmgFormat::Ulmo => "ULMO",
        }
    }
}

/// Filesystem of the disk image volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum DmgFilesystem {
    /// Mac OS Extended
    #[serde(rename = "HFS+")]
    Hfs,
    /// Apple File System
    #[default]
    #[serde(rename = "APFS")]
    Apfs,
}

impl DmgFilesystem {
    /// Value for `hdiutil -fs`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DmgFilesystem::Hfs => "HFS+",
            DmgFilesystem::Apfs => "APFS",
        }
    }
}

/// DMG window layout and image options.
///
/// # Configuration
///
/// Pass a TOML file with `--config`; every key is optional:
///
/// ```toml
/// window_size = [660, 400]
/// icon_size = 160
/// app_position = [180, 170]
/// applications_position = [480, 170]
/// format = "ULFO"
/// filesystem = "APFS"
/// engine_timeout_secs = 60
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DmgSettings {
    /// Finder window size (width, height) in points.
    pub window_size: (u32, u32),

    /// Icon size in the Finder window.
    pub icon_size: u32,

    /// Position of the .app inside the window.
    pub app_position: (u32, u32),

    /// Position of the `/Applications` link inside the window.
    pub applications_position: (u32, u32),

    /// Final image format.
    pub format: DmgFormat,

    /// Volume filesystem.
    pub filesystem: DmgFilesystem,

    /// Limit for each image engine invocation while composing the volume icon.
    pub engine_timeout_secs: u64,
}

impl Default for DmgSettings {
    fn default() -> Self {
        DmgSettings {
            window_size: (660, 400),
            icon_size: 160,
            app_position: (180, 170),
            applications_position: (480, 170),
            format: DmgFormat::default(),
            filesystem: DmgFilesystem::default(),
            engine_timeout_secs: 60,
        }
    }
}

impl DmgSettings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)
            .map_err(|e| Error::GenericError(format!("invalid DMG settings: {e}")))?;
        if settings.engine_timeout_secs == 0 {
            crate::bail!("invalid DMG settings: engine_timeout_secs must be at least 1 second");
        }
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading DMG settings", path)?;
        Self::from_toml(&text)
    }

    /// Per-invocation image engine timeout.
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(DmgSettings::from_toml("").unwrap(), DmgSettings::default());
    }

    #[test]
    fn partial_override() {
        let settings = DmgSettings::from_toml(
            r#"
            window_size = [540, 380]
            format = "UDZO"
            filesystem = "HFS+"
            "#,
        )
        .unwrap();
        assert_eq!(settings.window_size, (540, 380));
        assert_eq!(settings.format, DmgFormat::Udzo);
        assert_eq!(settings.filesystem, DmgFilesystem::Hfs);
        assert_eq!(settings.icon_size, 160);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DmgSettings::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn zero_engine_timeout_is_rejected() {
        let err = DmgSettings::from_toml("engine_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("at least 1 second"));

        let settings = DmgSettings::from_toml("engine_timeout_secs = 5").unwrap();
        assert_eq!(settings.engine_timeout(), Duration::from_secs(5));
    }
}
