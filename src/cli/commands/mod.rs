//! Subcommand implementations.

pub mod compose_icon;
pub mod dmg;
