//! # ReliefKit Engrave
//!
//! The depth-engraving toolpath engine: turns a 2-D raster image into a
//! sequence of multi-pass, depth-ramped laser motion commands for engraving
//! a 3-D relief.
//!
//! ## Pipeline
//!
//! - **Depth-map synthesis**: image + [`DepthMapSettings`] →
//!   normalized depth map with derived normal and height buffers
//! - **Power mapping**: depth/grayscale samples → device power, speed, and
//!   focus values through a laser profile's lookup curves
//! - **Toolpath planning**: depth map + [`ToolpathSettings`] → ordered
//!   passes with ramped power, decaying speed, and per-pass geometry
//!   (contour, spiral, hybrid, or adaptive)
//!
//! ## Supporting Infrastructure
//!
//! - **Session**: at-most-one active computation per session, prompt
//!   cancellation, profile resolution through an injected registry
//! - **Optimizer**: travel-distance segment reordering
//!
//! The engine is a pure computation over its inputs: no network, file
//! system, or device I/O. Export and preview are external collaborators
//! consuming the returned buffers and pass lists.

pub mod depth_map;
pub mod error;
pub mod optimizer;
pub mod planner;
pub mod power_map;
pub mod session;
pub mod strategy;

pub use depth_map::{
    interpolate_curve, CurvePoint, DepthCurve, DepthMapGenerator, DepthMapSettings, PYRAMID_SCALES,
};
pub use error::{EngraveError, EngraveResult, ParameterError, ParameterResult};
pub use planner::{
    OptimizationLevel, PathDirection, PowerRamp, SpeedProfile, ToolpathPlanner, ToolpathSettings,
    ToolpathStrategy,
};
pub use power_map::{MaterialOptics, PowerMapOptions, PowerProfileMapper};
pub use session::{CancelToken, EngraveSession};
