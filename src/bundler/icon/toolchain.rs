//! Image engine availability gate.
//!
//! Resolves once per gate: probe, and if that fails, one installation
//! attempt followed by one more probe. The answer is memoised.

use super::engine::ImageEngine;

/// Whether the image engine can be used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Availability {
    /// Not probed yet
    #[default]
    Unchecked,
    /// Probe succeeded, initially or after installation
    Available,
    /// Probe failed even after the installation attempt
    Unavailable,
}

/// Memoising availability check for an [`ImageEngine`].
#[derive(Clone, Debug, Default)]
pub struct AvailabilityGate {
    state: Availability,
}

impl AvailabilityGate {
    /// A gate that has not probed anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state without probing.
    pub fn state(&self) -> Availability {
        self.state
    }

    /// Resolve availability, probing and installing at most once.
    pub async fn resolve<E: ImageEngine>(&mut self, engine: &E) -> Availability {
        if self.state != Availability::Unchecked {
            return self.state;
        }

        if engine.probe().await {
            log::debug!("{} available", engine.name());
            self.state = Availability::Available;
            return self.state;
        }

        if !engine.install().await {
            log::warn!("failed to install {}", engine.name());
        }

        self.state = if engine.probe().await {
            log::info!("✓ {} installed", engine.name());
            Availability::Available
        } else {
            Availability::Unavailable
        };
        self.state
    }
}
