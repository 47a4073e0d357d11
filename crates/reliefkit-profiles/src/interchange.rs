//! Profile import/export as a flat JSON envelope.
//!
//! The document shape is `{ "type": "laser" | "material", "profile": {...},
//! "version": N, "timestamp": "..." }`. This is the engine's only persisted
//! form; storage location and transport are the caller's concern.

use crate::error::{ProfileError, ProfileResult};
use crate::model::{LaserProfile, MaterialProfile};
use crate::registry::ProfileRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version written into exported documents.
pub const DOCUMENT_VERSION: u32 = 1;

/// Flat interchange envelope around a serialized profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Profile kind tag: `laser`, `material`, or the recognized-but-foreign
    /// `printer`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The profile body, schema per `kind`.
    pub profile: serde_json::Value,
    pub version: u32,
    pub timestamp: DateTime<Utc>,
}

/// A profile decoded from an interchange document.
#[derive(Debug, Clone)]
pub enum ImportedProfile {
    Laser(LaserProfile),
    Material(MaterialProfile),
}

/// Serialize a laser profile into an interchange document.
pub fn export_laser(profile: &LaserProfile) -> ProfileResult<String> {
    profile.validate()?;
    let doc = ProfileDocument {
        kind: "laser".to_string(),
        profile: serde_json::to_value(profile)?,
        version: DOCUMENT_VERSION,
        timestamp: Utc::now(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Serialize a material profile into an interchange document.
pub fn export_material(profile: &MaterialProfile) -> ProfileResult<String> {
    profile.validate()?;
    let doc = ProfileDocument {
        kind: "material".to_string(),
        profile: serde_json::to_value(profile)?,
        version: DOCUMENT_VERSION,
        timestamp: Utc::now(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Parse an interchange document and validate the embedded profile.
pub fn import(document: &str) -> ProfileResult<ImportedProfile> {
    let doc: ProfileDocument = serde_json::from_str(document)?;
    if doc.version > DOCUMENT_VERSION {
        return Err(ProfileError::UnsupportedVersion(doc.version));
    }
    match doc.kind.as_str() {
        "laser" => {
            let profile: LaserProfile = serde_json::from_value(doc.profile)?;
            profile.validate()?;
            Ok(ImportedProfile::Laser(profile))
        }
        "material" => {
            let profile: MaterialProfile = serde_json::from_value(doc.profile)?;
            profile.validate()?;
            Ok(ImportedProfile::Material(profile))
        }
        // 3D-printer documents share the envelope but not the engine
        other => Err(ProfileError::UnsupportedKind(other.to_string())),
    }
}

/// Import a document directly into a registry.
pub fn import_into(registry: &ProfileRegistry, document: &str) -> ProfileResult<()> {
    match import(document)? {
        ImportedProfile::Laser(profile) => {
            info!(name = %profile.name, "imported laser profile");
            registry.register(profile)
        }
        ImportedProfile::Material(profile) => {
            info!(name = %profile.name, "imported material profile");
            registry.register_material(profile)
        }
    }
}
