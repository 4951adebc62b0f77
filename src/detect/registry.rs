use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::config::ModelTier;
use crate::detect::backend::DetectorBackend;
use crate::detect::result::BoundingBox;

/// Thread-safe mapping from model tier to a loaded detector backend.
///
/// All supported tiers are registered at startup; swapping tiers at
/// runtime is a lookup, never a model load. Backends are wrapped in
/// `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct TierRegistry {
    backends: HashMap<ModelTier, Arc<Mutex<dyn DetectorBackend>>>,
}

impl TierRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry with synthetic backends for every tier. Default builds
    /// and tests run against this; real model integrations register
    /// their own backends instead.
    pub fn with_synthetic_tiers() -> Self {
        use crate::detect::backends::SyntheticBackend;
        let mut registry = Self::new();
        registry.register(ModelTier::Fast, SyntheticBackend::new("fast-stub", 0.60));
        registry.register(
            ModelTier::Balanced,
            SyntheticBackend::new("balanced-stub", 0.72),
        );
        registry.register(
            ModelTier::Accurate,
            SyntheticBackend::new("accurate-stub", 0.85),
        );
        registry
    }

    pub fn register<B: DetectorBackend + 'static>(&mut self, tier: ModelTier, backend: B) {
        self.backends.insert(tier, Arc::new(Mutex::new(backend)));
    }

    pub fn tiers(&self) -> Vec<ModelTier> {
        self.backends.keys().copied().collect()
    }

    /// Run detection with the backend registered for `tier`.
    pub fn detect(
        &self,
        tier: ModelTier,
        pixels: &[u8],
        width: u32,
        height: u32,
        min_confidence: f32,
    ) -> Result<Vec<BoundingBox>> {
        let backend = self
            .backends
            .get(&tier)
            .ok_or_else(|| anyhow!("no backend registered for tier '{}'", tier.as_str()))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned for tier '{}'", tier.as_str()))?;
        guard.detect(pixels, width, height, min_confidence)
    }
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self::with_synthetic_tiers()
    }
}
