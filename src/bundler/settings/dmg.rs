//! Declarative description of a disk image.

use std::path::{Path, PathBuf};

use super::macos::{DmgFilesystem, DmgFormat, DmgSettings};
use crate::bundler::error::{Error, Result};

/// Longest volume title Finder aliases handle reliably.
pub const MAX_TITLE_LENGTH: usize = 27;

/// How an entry is placed on the volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Copied onto the volume
    File,
    /// Symlinked from the volume
    Link,
}

/// One item shown in the DMG window.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContentEntry {
    /// Horizontal icon position
    pub x: u32,
    /// Vertical icon position
    pub y: u32,
    /// Copy or link
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Source path, or link target
    pub path: PathBuf,
}

impl ContentEntry {
    /// Name the entry has on the volume.
    pub fn name(&self) -> Result<&str> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::GenericError(format!(
                    "cannot derive a volume entry name from {}",
                    self.path.display()
                ))
            })
    }
}

/// Everything needed to assemble a DMG.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DmgSpecification {
    /// Volume name
    pub title: String,
    /// Volume icon (ICNS)
    pub icon: Option<PathBuf>,
    /// Window background picture
    pub background: Option<PathBuf>,
    /// Finder icon size
    pub icon_size: u32,
    /// Final image format
    pub format: DmgFormat,
    /// Volume filesystem
    pub filesystem: DmgFilesystem,
    /// Window size (width, height)
    pub window: (u32, u32),
    /// Items on the volume
    pub contents: Vec<ContentEntry>,
}

impl DmgSpecification {
    /// Standard drag-to-install layout: the app plus an `/Applications` link.
    pub fn drag_to_install(title: impl Into<String>, app: &Path, settings: &DmgSettings) -> Result<Self> {
        let title = title.into();
        validate_title(&title)?;

        let (app_x, app_y) = settings.app_position;
        let (link_x, link_y) = settings.applications_position;
        Ok(DmgSpecification {
            title,
            icon: None,
            background: None,
            icon_size: settings.icon_size,
            format: settings.format,
            filesystem: settings.filesystem,
            window: settings.window_size,
            contents: vec![
                ContentEntry {
                    x: app_x,
                    y: app_y,
                    kind: ContentKind::File,
                    path: app.to_path_buf(),
                },
                ContentEntry {
                    x: link_x,
                    y: link_y,
                    kind: ContentKind::Link,
                    path: PathBuf::from("/Applications"),
                },
            ],
        })
    }

    /// Set the volume icon.
    pub fn with_icon(mut self, icon: Option<PathBuf>) -> Self {
        self.icon = icon;
        self
    }

    /// Set the window background.
    pub fn with_background(mut self, background: Option<PathBuf>) -> Self {
        self.background = background;
        self
    }
}

/// Reject empty titles and titles Finder aliases cannot hold.
pub fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        crate::bail!("The disk image title cannot be empty.");
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::GenericError(format!(
            "The disk image title cannot exceed {MAX_TITLE_LENGTH} characters (got {:?}).",
            title
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let spec = DmgSpecification::drag_to_install(
            "My App",
            Path::new("build/My App.app"),
            &DmgSettings::default(),
        )
        .unwrap();

        assert_eq!(spec.window, (660, 400));
        assert_eq!(spec.icon_size, 160);
        assert_eq!(spec.format, DmgFormat::Ulfo);
        assert_eq!(spec.filesystem, DmgFilesystem::Apfs);
        assert_eq!(spec.contents[0].name().unwrap(), "My App.app");
        assert_eq!((spec.contents[0].x, spec.contents[0].y), (180, 170));
        assert_eq!(spec.contents[1].kind, ContentKind::Link);
        assert_eq!(spec.contents[1].name().unwrap(), "Applications");
        assert_eq!((spec.contents[1].x, spec.contents[1].y), (480, 170));
    }

    #[test]
    fn title_limits() {
        assert!(validate_title("A".repeat(27).as_str()).is_ok());
        assert!(validate_title("A".repeat(28).as_str()).is_err());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn specification_serializes_like_a_layout_file() {
        let spec = DmgSpecification::drag_to_install(
            "Demo",
            Path::new("/tmp/Demo.app"),
            &DmgSettings::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["icon-size"], 160);
        assert_eq!(json["format"], "ULFO");
        assert_eq!(json["filesystem"], "APFS");
        assert_eq!(json["contents"][1]["type"], "link");
    }
}
