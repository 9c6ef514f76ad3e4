//! Device types for host-managed hardware
//!
//! Devices are owned by the host. The core only ever keeps [`DeviceRef`]s,
//! weak handles that turn dead as soon as the host drops the device.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};

/// Stable identity of a device, assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry bucket a device can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PowerProducer,
    Battery,
    Piston,
    Rotor,
    Drill,
    Connector,
    Production,
    Generic,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::PowerProducer,
        Category::Battery,
        Category::Piston,
        Category::Rotor,
        Category::Drill,
        Category::Connector,
        Category::Production,
        Category::Generic,
    ];
}

/// Battery charge behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeMode {
    #[default]
    Auto,
    Recharge,
    Discharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PistonStatus {
    #[default]
    Stopped,
    Extending,
    Extended,
    Retracting,
    Retracted,
}

impl std::fmt::Display for PistonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stopped => "Stopped",
            Self::Extending => "Extending",
            Self::Extended => "Extended",
            Self::Retracting => "Retracting",
            Self::Retracted => "Retracted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    #[default]
    Unconnected,
    Connectable,
    Connected,
}

impl std::fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unconnected => "Unconnected",
            Self::Connectable => "Connectable",
            Self::Connected => "Connected",
        };
        f.write_str(name)
    }
}

/// Output telemetry of a plain power producer (reactor, solar panel, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerTelemetry {
    /// Current output in MW
    #[serde(default)]
    pub current_output: f64,
    /// Maximum output in MW
    #[serde(default)]
    pub max_output: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryTelemetry {
    #[serde(default)]
    pub current_output: f64,
    #[serde(default)]
    pub max_output: f64,
    #[serde(default)]
    pub current_input: f64,
    /// Stored energy in MWh
    #[serde(default)]
    pub stored: f64,
    #[serde(default)]
    pub max_stored: f64,
    #[serde(default)]
    pub charge_mode: ChargeMode,
    #[serde(default)]
    pub is_charging: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PistonTelemetry {
    #[serde(default)]
    pub status: PistonStatus,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub velocity: f64,
    #[serde(default)]
    pub max_limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotorTelemetry {
    /// Current angle in radians
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub target_rpm: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillTelemetry {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorTelemetry {
    #[serde(default)]
    pub status: ConnectorStatus,
    /// Name of the grid on the other side, when docked
    #[serde(default)]
    pub docked_grid: Option<String>,
}

/// A single queued production job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub blueprint: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionTelemetry {
    #[serde(default)]
    pub queue: Vec<QueueItem>,
}

/// Device kind together with its kind-specific telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKind {
    PowerProducer(PowerTelemetry),
    Battery(BatteryTelemetry),
    Piston(PistonTelemetry),
    AdvancedRotor(RotorTelemetry),
    Drill(DrillTelemetry),
    Connector(ConnectorTelemetry),
    Production(ProductionTelemetry),
    Generic,
}

impl DeviceKind {
    /// Every registry bucket this kind belongs to
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::PowerProducer(_) => &[Category::PowerProducer],
            Self::Battery(_) => &[Category::PowerProducer, Category::Battery],
            Self::Piston(_) => &[Category::Piston],
            Self::AdvancedRotor(_) => &[Category::Rotor],
            Self::Drill(_) => &[Category::Drill],
            Self::Connector(_) => &[Category::Connector],
            Self::Production(_) => &[Category::Production],
            Self::Generic => &[Category::Generic],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PowerProducer(_) => "power_producer",
            Self::Battery(_) => "battery",
            Self::Piston(_) => "piston",
            Self::AdvancedRotor(_) => "advanced_rotor",
            Self::Drill(_) => "drill",
            Self::Connector(_) => "connector",
            Self::Production(_) => "production",
            Self::Generic => "generic",
        }
    }
}

/// One stored item stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub amount: f64,
}

/// An inventory attached to a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<Item>,
    /// Used volume in m^3
    #[serde(default)]
    pub current_volume: f64,
}

/// Mutable part of a device, updated by the host between cycles
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub kind: DeviceKind,
    pub inventories: Vec<Inventory>,
}

/// A host-owned device
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    name: String,
    state: RwLock<DeviceState>,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>, kind: DeviceKind, inventories: Vec<Inventory>) -> Self {
        Self {
            id,
            name: name.into(),
            state: RwLock::new(DeviceState { kind, inventories }),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the current telemetry
    ///
    /// A poisoned lock still holds the last written state, so it is read anyway.
    pub fn state(&self) -> RwLockReadGuard<'_, DeviceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate telemetry in place (host side)
    pub fn update<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn categories(&self) -> &'static [Category] {
        self.state().kind.categories()
    }

    pub fn inventory_count(&self) -> usize {
        self.state().inventories.len()
    }
}

/// Non-owning handle to a host device
#[derive(Debug, Clone)]
pub struct DeviceRef(Weak<Device>);

impl DeviceRef {
    pub fn new(device: &Arc<Device>) -> Self {
        Self(Arc::downgrade(device))
    }

    pub fn upgrade(&self) -> Option<Arc<Device>> {
        self.0.upgrade()
    }

    /// False once the host has destroyed the device
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn ptr_eq(&self, other: &DeviceRef) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl From<&Arc<Device>> for DeviceRef {
    fn from(device: &Arc<Device>) -> Self {
        Self::new(device)
    }
}

/// Handle to one inventory of a device; dies with its owner
#[derive(Debug, Clone)]
pub struct InventoryRef {
    owner: DeviceRef,
    index: usize,
}

impl InventoryRef {
    pub fn new(owner: DeviceRef, index: usize) -> Self {
        Self { owner, index }
    }

    pub fn owner(&self) -> &DeviceRef {
        &self.owner
    }

    pub fn is_alive(&self) -> bool {
        self.owner.is_alive()
    }

    /// Run `f` against the inventory if its owner is still alive
    pub fn with<R>(&self, f: impl FnOnce(&Inventory) -> R) -> Option<R> {
        let device = self.owner.upgrade()?;
        let state = device.state();
        state.inventories.get(self.index).map(f)
    }
}
