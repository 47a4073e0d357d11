//! # ReliefKit Profiles
//!
//! Laser and material profile definitions for the depth-engraving engine:
//! the profile data model with its 256-entry power/speed lookup curves, an
//! injectable in-memory registry with a fixed default catalog, and the flat
//! JSON interchange envelope used for import/export.

pub mod catalog;
pub mod error;
pub mod interchange;
pub mod model;
pub mod registry;

pub use error::{ProfileError, ProfileResult};
pub use interchange::{export_laser, export_material, import, import_into, ImportedProfile};
pub use model::{
    AssistGas, LaserProfile, LaserType, MaterialKind, MaterialProfile, MopaSettings, CURVE_LEN,
};
pub use registry::ProfileRegistry;
