//! Gridboard Sim - A simulated device host
//!
//! This crate provides a [`Host`](gridboard_core::Host) implementation backed
//! by a JSON world fixture:
//! - World files describing devices, their telemetry and panels
//! - Device churn (spawn/destroy) that invalidates core handles
//! - Telemetry drift between cycles
//! - Per-cycle instruction metering

pub mod drift;
pub mod host;
pub mod world;

pub use host::{Panel, SimHost};
pub use world::{DeviceSpec, PanelSpec, World, WorldError};
