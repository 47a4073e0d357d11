//! # ReliefKit
//!
//! A depth-engraving toolpath engine for laser relief work: depth-map
//! synthesis from a raster image, power/speed/focus mapping through laser
//! profiles, and progressive multi-pass toolpath planning.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`reliefkit_core`]: shared data model (images, depth maps, passes)
//! - [`reliefkit_profiles`]: laser/material profiles, registry, interchange
//! - [`reliefkit_engrave`]: the engine itself
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reliefkit::{
//!     DepthMapSettings, EngraveSession, ProfileRegistry, RasterImage, ToolpathSettings,
//! };
//!
//! let registry = Arc::new(ProfileRegistry::with_default_catalog());
//! let session = EngraveSession::new(registry);
//!
//! let image = RasterImage::from_rgba(64, 64, vec![200u8; 64 * 64 * 4])?;
//! let passes = session.plan(
//!     &image,
//!     "fiber-100w",
//!     &DepthMapSettings::default(),
//!     &ToolpathSettings::default(),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use reliefkit_core;
pub use reliefkit_engrave as engrave;
pub use reliefkit_profiles as profiles;

pub use reliefkit_core::{DepthMap, MotionPoint, Pass, RasterImage};
pub use reliefkit_engrave::{
    DepthMapGenerator, DepthMapSettings, EngraveError, EngraveResult, EngraveSession,
    PowerProfileMapper, ToolpathPlanner, ToolpathSettings,
};
pub use reliefkit_profiles::{LaserProfile, MaterialProfile, ProfileRegistry};
