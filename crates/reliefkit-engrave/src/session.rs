//! Engraving session: request lifecycle and cancellation.
//!
//! A session owns at most one active computation. Starting a new depth-map
//! or plan request cancels whatever is still in flight, so a superseded
//! request resolves to `Cancelled` rather than racing the new one. The
//! profile registry is injected at construction; the session never consults
//! global state.

use crate::depth_map::{DepthMapGenerator, DepthMapSettings};
use crate::error::{EngraveError, EngraveResult};
use crate::planner::{ToolpathPlanner, ToolpathSettings};
use reliefkit_core::{thread_safe, DepthMap, Pass, RasterImage, ThreadSafe};
use reliefkit_profiles::{ProfileError, ProfileRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared cancellation flag checked by in-flight workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Bail out with [`EngraveError::Cancelled`] if cancellation was
    /// requested.
    #[inline]
    pub fn checkpoint(&self) -> EngraveResult<()> {
        if self.is_cancelled() {
            Err(EngraveError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One engraving session over an injected profile registry.
pub struct EngraveSession {
    registry: Arc<ProfileRegistry>,
    active: ThreadSafe<Option<CancelToken>>,
}

impl EngraveSession {
    /// Create a session over a registry assembled by the caller.
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self {
            registry,
            active: thread_safe(None),
        }
    }

    /// The registry this session resolves profile names through.
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Install a fresh token, cancelling any computation still in flight.
    fn begin(&self) -> CancelToken {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            debug!("superseding in-flight computation");
            previous.cancel();
        }
        let token = CancelToken::new();
        *active = Some(token.clone());
        token
    }

    /// Explicitly abort the active computation, if any.
    pub fn cancel_active(&self) {
        if let Some(token) = self.active.lock().take() {
            token.cancel();
        }
    }

    /// Generate a depth map, superseding any in-flight request.
    pub fn generate_depth_map(
        &self,
        image: &RasterImage,
        settings: &DepthMapSettings,
    ) -> EngraveResult<DepthMap> {
        let token = self.begin();
        DepthMapGenerator::generate_with_cancel(image, settings, &token)
    }

    /// Run the full pipeline: depth map synthesis, then multi-pass planning
    /// with the named laser profile. Supersedes any in-flight request.
    ///
    /// The profile name is resolved before any computation starts, so an
    /// unregistered name fails fast with [`EngraveError::ProfileNotFound`].
    pub fn plan(
        &self,
        image: &RasterImage,
        laser_name: &str,
        depth_settings: &DepthMapSettings,
        toolpath_settings: &ToolpathSettings,
    ) -> EngraveResult<Vec<Pass>> {
        let laser = self.resolve_laser(laser_name)?;
        let token = self.begin();
        let map = DepthMapGenerator::generate_with_cancel(image, depth_settings, &token)?;
        ToolpathPlanner::plan_with_cancel(&map, &laser, depth_settings, toolpath_settings, &token)
    }

    /// Plan over an already-synthesized depth map.
    pub fn plan_from_map(
        &self,
        depth_map: &DepthMap,
        laser_name: &str,
        depth_settings: &DepthMapSettings,
        toolpath_settings: &ToolpathSettings,
    ) -> EngraveResult<Vec<Pass>> {
        let laser = self.resolve_laser(laser_name)?;
        let token = self.begin();
        ToolpathPlanner::plan_with_cancel(
            depth_map,
            &laser,
            depth_settings,
            toolpath_settings,
            &token,
        )
    }

    fn resolve_laser(&self, name: &str) -> EngraveResult<reliefkit_profiles::LaserProfile> {
        self.registry.require(name).map_err(|e| match e {
            ProfileError::ProfileNotFound(name) => EngraveError::ProfileNotFound(name),
            other => EngraveError::InvalidInput(other.to_string()),
        })
    }
}
