//! The seam between the core and the environment that owns the devices

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::device::DeviceRef;

/// Stable identity of an output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An output surface as advertised by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub id: SurfaceId,
    /// Display name, used in diagnostics
    pub name: String,
    /// Raw configuration text attached to the surface
    pub config: String,
}

/// Everything the core consumes from its host
///
/// All calls happen synchronously from within one cycle.
pub trait Host {
    /// Enumerate every live device
    fn devices(&self) -> Vec<DeviceRef>;

    /// Resolve a device by display name
    fn device_by_name(&self, name: &str) -> Option<DeviceRef>;

    /// Enumerate every output surface, configured or not
    fn surfaces(&self) -> Vec<SurfaceInfo>;

    /// Replace the text shown on a surface
    fn write_surface(&mut self, id: SurfaceId, text: &str);

    /// Time elapsed since the previous cycle
    fn time_since_last_run(&self) -> Duration;

    /// Compute budget consumed by the current cycle so far
    fn budget_used(&self) -> u64;

    /// Per-cycle budget ceiling, if the host enforces one
    fn budget_limit(&self) -> Option<u64> {
        None
    }

    /// Name of the grid the devices belong to
    fn grid_name(&self) -> String;

    /// Diagnostic output channel
    fn echo(&mut self, _text: &str) {}
}
