//! In-memory host used by the unit tests

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::device::{Device, DeviceId, DeviceKind, DeviceRef, Inventory, Item};
use crate::host::{Host, SurfaceId, SurfaceInfo};

#[derive(Default)]
pub(crate) struct FakeHost {
    pub devices: Vec<Arc<Device>>,
    pub surfaces: Vec<SurfaceInfo>,
    pub written: HashMap<SurfaceId, String>,
    pub elapsed: Duration,
    pub budget: u64,
    pub limit: Option<u64>,
    pub echoed: String,
    pub enumerations: Cell<usize>,
    pub name_lookups: Cell<usize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            elapsed: Duration::from_secs(1),
            ..Self::default()
        }
    }

    pub fn add(&mut self, id: u64, name: &str, kind: DeviceKind) -> Arc<Device> {
        self.add_with_inventories(id, name, kind, Vec::new())
    }

    pub fn add_with_inventories(
        &mut self,
        id: u64,
        name: &str,
        kind: DeviceKind,
        inventories: Vec<Inventory>,
    ) -> Arc<Device> {
        let device = Arc::new(Device::new(DeviceId(id), name, kind, inventories));
        self.devices.push(device.clone());
        device
    }

    /// Drop the host's reference, killing every handle the core holds
    pub fn destroy(&mut self, id: u64) {
        self.devices.retain(|d| d.id() != DeviceId(id));
    }

    pub fn add_surface(&mut self, id: u64, name: &str, config: &str) {
        self.surfaces.push(SurfaceInfo {
            id: SurfaceId(id),
            name: name.to_string(),
            config: config.to_string(),
        });
    }

    pub fn text(&self, id: u64) -> &str {
        self.written.get(&SurfaceId(id)).map(String::as_str).unwrap_or("")
    }
}

impl Host for FakeHost {
    fn devices(&self) -> Vec<DeviceRef> {
        self.enumerations.set(self.enumerations.get() + 1);
        self.devices.iter().map(DeviceRef::new).collect()
    }

    fn device_by_name(&self, name: &str) -> Option<DeviceRef> {
        self.name_lookups.set(self.name_lookups.get() + 1);
        self.devices.iter().find(|d| d.name() == name).map(DeviceRef::new)
    }

    fn surfaces(&self) -> Vec<SurfaceInfo> {
        self.surfaces.clone()
    }

    fn write_surface(&mut self, id: SurfaceId, text: &str) {
        self.written.insert(id, text.to_string());
    }

    fn time_since_last_run(&self) -> Duration {
        self.elapsed
    }

    fn budget_used(&self) -> u64 {
        self.budget
    }

    fn budget_limit(&self) -> Option<u64> {
        self.limit
    }

    fn grid_name(&self) -> String {
        "Base".to_string()
    }

    fn echo(&mut self, text: &str) {
        self.echoed = text.to_string();
    }
}

pub(crate) fn items(entries: &[(&str, f64)]) -> Inventory {
    Inventory {
        items: entries
            .iter()
            .map(|(name, amount)| Item {
                name: name.to_string(),
                amount: *amount,
            })
            .collect(),
        current_volume: 0.0,
    }
}
