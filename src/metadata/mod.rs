//! Application metadata from an .app bundle's Info.plist

use crate::error::{BundlerError, CliError, Result};
use std::path::{Path, PathBuf};

/// Keys read from `Contents/Info.plist`
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct AppInfo {
    /// User-visible name (CFBundleDisplayName)
    #[serde(rename = "CFBundleDisplayName")]
    pub display_name: Option<String>,

    /// Short bundle name (CFBundleName)
    #[serde(rename = "CFBundleName")]
    pub bundle_name: Option<String>,

    /// Marketing version, e.g. "1.2.0" (CFBundleShortVersionString)
    #[serde(rename = "CFBundleShortVersionString")]
    pub short_version: Option<String>,

    /// Icon file in Contents/Resources, with or without `.icns` (CFBundleIconFile)
    #[serde(rename = "CFBundleIconFile")]
    pub icon_file: Option<String>,
}

impl AppInfo {
    /// Load metadata for the bundle at `app_path`
    ///
    /// XML and binary plists are parsed directly. Anything the parser rejects
    /// is converted to XML with `plutil` and parsed again.
    pub async fn load(app_path: &Path) -> Result<Self> {
        let plist_path = app_path.join("Contents/Info.plist");
        let bytes = match tokio::fs::read(&plist_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BundlerError::Cli(CliError::InvalidArguments {
                    reason: format!("Could not find {}", app_path.display()),
                }));
            }
            Err(e) => return Err(e.into()),
        };

        match Self::from_plist_bytes(&bytes) {
            Ok(info) => Ok(info),
            Err(e) => {
                log::debug!("Parsing {} failed ({}), converting with plutil", plist_path.display(), e);
                let xml = convert_with_plutil(&plist_path).await?;
                Self::from_plist_bytes(&xml).map_err(|e| {
                    BundlerError::Cli(CliError::ExecutionFailed {
                        command: "parse_info_plist".to_string(),
                        reason: format!("failed to read plist: {}", e),
                    })
                })
            }
        }
    }

    /// Parse metadata from plist bytes (XML or binary)
    pub fn from_plist_bytes(bytes: &[u8]) -> std::result::Result<Self, plist::Error> {
        plist::from_bytes(bytes)
    }

    /// Display name, falling back to the bundle name
    pub fn name(&self) -> Result<&str> {
        non_empty(&self.display_name)
            .or_else(|| non_empty(&self.bundle_name))
            .ok_or_else(|| {
                BundlerError::Cli(CliError::InvalidArguments {
                    reason: "The app must have `CFBundleDisplayName` or `CFBundleName` defined in its `Info.plist`.".to_string(),
                })
            })
    }

    /// Path of the bundle's ICNS icon, if one is declared
    pub fn icon_path(&self, app_path: &Path) -> Option<PathBuf> {
        let icon = non_empty(&self.icon_file)?;
        let stem = icon.strip_suffix(".icns").unwrap_or(icon);
        Some(
            app_path
                .join("Contents/Resources")
                .join(format!("{stem}.icns")),
        )
    }

    /// DMG file name: `{Name} {Version}.dmg`, or `{Name}.dmg` without a version
    pub fn dmg_file_name(&self) -> Result<String> {
        let name = self.name()?;
        Ok(match non_empty(&self.short_version) {
            Some(version) => format!("{name} {version}.dmg"),
            None => format!("{name}.dmg"),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Convert a plist to XML on stdout with `/usr/bin/plutil`
async fn convert_with_plutil(plist_path: &Path) -> Result<Vec<u8>> {
    let output = tokio::process::Command::new("/usr/bin/plutil")
        .args(["-convert", "xml1", "-o", "-"])
        .arg(plist_path)
        .output()
        .await
        .map_err(|e| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "plutil".to_string(),
                reason: format!("failed to read plist: {}", e),
            })
        })?;

    if !output.status.success() {
        return Err(BundlerError::Cli(CliError::ExecutionFailed {
            command: "plutil".to_string(),
            reason: format!(
                "failed to read plist: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Demo</string>
    <key>CFBundleShortVersionString</key>
    <string>1.4.2</string>
    <key>CFBundleIconFile</key>
    <string>AppIcon</string>
    <key>CFBundleExecutable</key>
    <string>demo</string>
</dict>
</plist>"#;

    #[test]
    fn reads_bundle_keys() {
        let info = AppInfo::from_plist_bytes(INFO_PLIST.as_bytes()).unwrap();
        assert_eq!(info.name().unwrap(), "Demo");
        assert_eq!(info.dmg_file_name().unwrap(), "Demo 1.4.2.dmg");
        assert_eq!(
            info.icon_path(Path::new("/Apps/Demo.app")),
            Some(PathBuf::from("/Apps/Demo.app/Contents/Resources/AppIcon.icns"))
        );
    }

    #[test]
    fn display_name_wins() {
        let info = AppInfo {
            display_name: Some("Demo Pro".into()),
            bundle_name: Some("Demo".into()),
            ..Default::default()
        };
        assert_eq!(info.name().unwrap(), "Demo Pro");
    }

    #[test]
    fn icon_extension_is_not_doubled() {
        let info = AppInfo {
            icon_file: Some("AppIcon.icns".into()),
            ..Default::default()
        };
        assert_eq!(
            info.icon_path(Path::new("X.app")),
            Some(PathBuf::from("X.app/Contents/Resources/AppIcon.icns"))
        );
    }

    #[test]
    fn missing_names_are_rejected() {
        let info = AppInfo {
            display_name: Some(String::new()),
            ..Default::default()
        };
        assert!(info.name().is_err());
    }

    #[tokio::test]
    async fn missing_bundle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppInfo::load(&dir.path().join("Nope.app")).await.unwrap_err();
        assert!(err.to_string().contains("Could not find"));
    }
}
