//! macOS packaging: DMG disk images.

pub mod dmg;
