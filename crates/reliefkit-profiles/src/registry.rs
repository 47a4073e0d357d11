//! In-memory profile registry.
//!
//! An explicitly constructed registry instance is passed into the engine by
//! whatever assembles the engraving session; there is no process-global
//! catalog. Reads never block each other; registration takes the single
//! writer side of the lock.

use crate::catalog;
use crate::error::{ProfileError, ProfileResult};
use crate::model::{LaserProfile, LaserType, MaterialKind, MaterialProfile};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Mapping from profile name to [`LaserProfile`] and from material kind to
/// an ordered list of [`MaterialProfile`]s.
///
/// Registration overwrites an existing entry of the same name
/// (last-write-wins); there is no deletion operation.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    lasers: RwLock<HashMap<String, LaserProfile>>,
    materials: RwLock<HashMap<MaterialKind, Vec<MaterialProfile>>>,
}

impl ProfileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the fixed default catalog.
    pub fn with_default_catalog() -> Self {
        let registry = Self::new();
        for profile in catalog::default_laser_profiles() {
            // Catalog entries are maintained alongside the validators
            registry
                .register(profile)
                .unwrap_or_else(|e| panic!("default catalog entry failed validation: {e}"));
        }
        for material in catalog::default_material_profiles() {
            registry
                .register_material(material)
                .unwrap_or_else(|e| panic!("default catalog material failed validation: {e}"));
        }
        registry
    }

    /// Register a laser profile, replacing any existing profile of the same
    /// name.
    pub fn register(&self, profile: LaserProfile) -> ProfileResult<()> {
        profile.validate()?;
        debug!(name = %profile.name, laser_type = %profile.laser_type, "registering laser profile");
        self.lasers.write().insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Register a material profile under its kind. A profile with the same
    /// name replaces the previous entry in place; new names append.
    pub fn register_material(&self, material: MaterialProfile) -> ProfileResult<()> {
        material.validate()?;
        debug!(name = %material.name, kind = %material.kind, "registering material profile");
        let mut materials = self.materials.write();
        let entries = materials.entry(material.kind).or_default();
        if let Some(existing) = entries.iter_mut().find(|m| m.name == material.name) {
            *existing = material;
        } else {
            entries.push(material);
        }
        Ok(())
    }

    /// Look up a laser profile by name.
    pub fn get(&self, name: &str) -> Option<LaserProfile> {
        self.lasers.read().get(name).cloned()
    }

    /// Look up a laser profile by name, failing with
    /// [`ProfileError::ProfileNotFound`] when unregistered.
    pub fn require(&self, name: &str) -> ProfileResult<LaserProfile> {
        self.get(name)
            .ok_or_else(|| ProfileError::ProfileNotFound(name.to_string()))
    }

    /// All laser profiles of the given type, sorted by name.
    pub fn list_by_type(&self, laser_type: LaserType) -> Vec<LaserProfile> {
        let mut out: Vec<LaserProfile> = self
            .lasers
            .read()
            .values()
            .filter(|p| p.laser_type == laser_type)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// The ordered material profiles registered for a kind.
    pub fn materials_for(&self, kind: MaterialKind) -> Vec<MaterialProfile> {
        self.materials
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of registered laser profiles.
    pub fn laser_count(&self) -> usize {
        self.lasers.read().len()
    }
}
