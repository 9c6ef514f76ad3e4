//! Gridboard Core - Device registry, render cache and report surfaces
//!
//! This crate provides the polling and rendering pipeline:
//! - A TTL-gated device registry that amortizes full rescans across cycles
//! - A per-cycle memoization cache shared by every report surface
//! - Section formatters for device and aggregate status text
//! - Report surfaces and the orchestrator that drives one cycle
//!
//! The environment that owns the devices is abstracted by the [`Host`] trait.

pub mod config;
pub mod device;
pub mod format;
pub mod host;
pub mod memo;
pub mod orchestrator;
pub mod registry;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, SurfaceConfig};
pub use device::{Category, Device, DeviceId, DeviceKind, DeviceRef, DeviceState, Inventory, InventoryRef};
pub use host::{Host, SurfaceId, SurfaceInfo};
pub use memo::MemoCache;
pub use orchestrator::{CycleReport, Orchestrator, OrchestratorConfig};
pub use registry::DeviceRegistry;
pub use surface::ReportSurface;
