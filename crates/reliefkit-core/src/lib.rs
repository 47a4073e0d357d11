//! # ReliefKit Core
//!
//! Core data model and shared types for the ReliefKit depth-engraving
//! engine. Provides the buffers exchanged between the engine and its
//! collaborators (preview renderers, format exporters) and a handful of
//! type aliases used across the workspace.

pub mod data;
pub mod error;
pub mod types;

pub use data::{DepthMap, MotionPoint, Pass, RasterImage};
pub use error::{DataError, DataResult};
pub use types::{thread_safe, BoxedIterator, ThreadSafe};
