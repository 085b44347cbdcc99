//! Shared fixtures for the icon pipeline tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dmg_bundler::bundler::icon::{CompositionPlan, Dimensions, IconError, ImageEngine};
use icns::{IconElement, IconFamily, OSType};

/// Placeholder image payload whose pixel size the fake engine can read back.
pub fn image(size: u32, label: &str) -> Vec<u8> {
    format!("png:{size}:{label}").into_bytes()
}

/// ICNS bytes holding `elements` in the given order.
pub fn icns(elements: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut family = IconFamily::new();
    for (code, data) in elements {
        family
            .elements
            .push(IconElement::new(OSType(**code), data.clone()));
    }
    let mut out = Vec::new();
    family.write(&mut out).unwrap();
    out
}

/// Engine that composes by string concatenation.
///
/// `distort` wraps the source as `distorted(<source>)` and `composite` writes
/// `<overlay> on <background>`, so a test can tell exactly which inputs
/// produced each output variant.
#[derive(Debug, Default)]
pub struct FakeEngine {
    available: AtomicBool,
    install_succeeds: bool,
    fail_marker: Option<Vec<u8>>,
    pub probes: AtomicUsize,
    pub installs: AtomicUsize,
    pub distortions: AtomicUsize,
}

impl FakeEngine {
    pub fn available() -> Self {
        FakeEngine {
            available: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn missing() -> Self {
        FakeEngine::default()
    }

    pub fn installable() -> Self {
        FakeEngine {
            install_succeeds: true,
            ..Default::default()
        }
    }

    /// Fail `distort` for any source containing `marker`.
    pub fn failing_on(marker: &str) -> Self {
        FakeEngine {
            fail_marker: Some(marker.as_bytes().to_vec()),
            ..FakeEngine::available()
        }
    }

    fn fails_for(&self, data: &[u8]) -> bool {
        self.fail_marker
            .as_deref()
            .is_some_and(|marker| data.windows(marker.len()).any(|w| w == marker))
    }
}

fn read(path: &Path) -> Result<Vec<u8>, IconError> {
    std::fs::read(path).map_err(|e| IconError::EngineFailed {
        command: format!("fake read {}", path.display()),
        reason: e.to_string(),
    })
}

fn write(path: &Path, data: &[u8]) -> Result<(), IconError> {
    std::fs::write(path, data).map_err(|e| IconError::EngineFailed {
        command: format!("fake write {}", path.display()),
        reason: e.to_string(),
    })
}

impl ImageEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake-engine"
    }

    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }

    async fn install(&self) -> bool {
        self.installs.fetch_add(1, Ordering::SeqCst);
        if self.install_succeeds {
            self.available.store(true, Ordering::SeqCst);
        }
        self.install_succeeds
    }

    async fn dimensions(&self, image: &Path) -> Result<Dimensions, IconError> {
        let data = read(image)?;
        let text = String::from_utf8_lossy(&data);
        let size = text
            .strip_prefix("png:")
            .and_then(|rest| rest.split(':').next())
            .and_then(|size| size.parse::<u32>().ok())
            .ok_or_else(|| IconError::EngineFailed {
                command: "fake identify".to_string(),
                reason: format!("not an image: {text}"),
            })?;
        Ok(Dimensions::new(size, size))
    }

    async fn distort(
        &self,
        source: &Path,
        _plan: &CompositionPlan,
        output: &Path,
    ) -> Result<(), IconError> {
        self.distortions.fetch_add(1, Ordering::SeqCst);
        let data = read(source)?;
        if self.fails_for(&data) {
            return Err(IconError::EngineFailed {
                command: "fake distort".to_string(),
                reason: "refusing marked image".to_string(),
            });
        }
        let mut out = b"distorted(".to_vec();
        out.extend_from_slice(&data);
        out.push(b')');
        write(output, &out)
    }

    async fn composite(
        &self,
        background: &Path,
        overlay: &Path,
        _plan: &CompositionPlan,
        output: &Path,
    ) -> Result<(), IconError> {
        let mut out = read(overlay)?;
        out.extend_from_slice(b" on ");
        out.extend_from_slice(&read(background)?);
        write(output, &out)
    }
}
