//! Simulated host
//!
//! Owns the devices (the core only gets weak handles), keeps per-panel text,
//! and meters every host call against a per-cycle instruction budget so the
//! cost of full rescans versus partial refreshes is visible.

use gridboard_core::device::{Device, DeviceId, DeviceRef};
use gridboard_core::host::{Host, SurfaceId, SurfaceInfo};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::drift;
use crate::world::{DeviceSpec, PanelSpec, World};

/// Instruction cost of enumerating one device
pub const COST_PER_DEVICE: u64 = 8;
/// Instruction cost of one name lookup (a linear search on the host)
pub const COST_PER_LOOKUP: u64 = 40;
/// Instruction cost of enumerating one panel
pub const COST_PER_PANEL: u64 = 4;
/// Characters written per instruction
pub const CHARS_PER_INSTRUCTION: u64 = 16;

/// A panel and what was last written to it
#[derive(Debug, Clone)]
pub struct Panel {
    pub id: SurfaceId,
    pub name: String,
    pub config: String,
    pub text: String,
    pub writes: u64,
}

impl From<PanelSpec> for Panel {
    fn from(spec: PanelSpec) -> Self {
        Self {
            id: SurfaceId(spec.id),
            name: spec.name,
            config: spec.config,
            text: String::new(),
            writes: 0,
        }
    }
}

pub struct SimHost {
    grid: String,
    devices: Vec<Arc<Device>>,
    panels: Vec<Panel>,
    elapsed: Duration,
    budget_used: Cell<u64>,
    budget_limit: Option<u64>,
    echo: String,
    next_id: u64,
}

impl SimHost {
    pub fn new(grid: impl Into<String>) -> Self {
        Self {
            grid: grid.into(),
            devices: Vec::new(),
            panels: Vec::new(),
            elapsed: Duration::ZERO,
            budget_used: Cell::new(0),
            budget_limit: None,
            echo: String::new(),
            next_id: 1,
        }
    }

    pub fn from_world(world: World) -> Self {
        let mut host = Self::new(world.grid);
        for spec in world.devices {
            host.spawn(spec);
        }
        host.panels = world.panels.into_iter().map(Panel::from).collect();
        info!(
            grid = %host.grid,
            devices = host.devices.len(),
            panels = host.panels.len(),
            "Loaded world"
        );
        host
    }

    pub fn with_budget_limit(mut self, limit: Option<u64>) -> Self {
        self.budget_limit = limit;
        self
    }

    /// Start a new cycle: set the elapsed time, drift telemetry and reset
    /// the budget meter
    pub fn begin_cycle(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.budget_used.set(0);
        self.echo.clear();
        for device in &self.devices {
            device.update(|state| drift::advance(state, elapsed));
        }
    }

    /// Create a device; returns its id
    pub fn spawn(&mut self, spec: DeviceSpec) -> DeviceId {
        let id = DeviceId(spec.id);
        self.next_id = self.next_id.max(spec.id.saturating_add(1));
        let device = Arc::new(Device::new(id, spec.name, spec.kind, spec.inventories));
        debug!(device = %id, name = %device.name(), "Spawned device");
        self.devices.push(device);
        id
    }

    /// Id that no existing device uses
    pub fn next_device_id(&self) -> u64 {
        self.next_id
    }

    /// Destroy a device; every handle held by the core goes dead
    pub fn destroy(&mut self, id: DeviceId) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| d.id() != id);
        let removed = self.devices.len() != before;
        if removed {
            debug!(device = %id, "Destroyed device");
        }
        removed
    }

    pub fn device(&self, id: DeviceId) -> Option<&Arc<Device>> {
        self.devices.iter().find(|d| d.id() == id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn add_panel(&mut self, spec: PanelSpec) {
        self.panels.retain(|p| p.id != SurfaceId(spec.id));
        self.panels.push(Panel::from(spec));
    }

    pub fn set_panel_config(&mut self, id: SurfaceId, config: impl Into<String>) -> bool {
        match self.panels.iter_mut().find(|p| p.id == id) {
            Some(panel) => {
                panel.config = config.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_panel(&mut self, id: SurfaceId) -> bool {
        let before = self.panels.len();
        self.panels.retain(|p| p.id != id);
        self.panels.len() != before
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: SurfaceId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Last text echoed by the orchestrator
    pub fn echoed(&self) -> &str {
        &self.echo
    }

    fn charge(&self, cost: u64) {
        self.budget_used.set(self.budget_used.get() + cost);
    }
}

impl Host for SimHost {
    fn devices(&self) -> Vec<DeviceRef> {
        let inventories: usize = self.devices.iter().map(|d| d.inventory_count()).sum();
        self.charge(COST_PER_DEVICE * (self.devices.len() + inventories) as u64);
        self.devices.iter().map(DeviceRef::new).collect()
    }

    fn device_by_name(&self, name: &str) -> Option<DeviceRef> {
        self.charge(COST_PER_LOOKUP);
        self.devices.iter().find(|d| d.name() == name).map(DeviceRef::new)
    }

    fn surfaces(&self) -> Vec<SurfaceInfo> {
        self.charge(COST_PER_PANEL * self.panels.len() as u64);
        self.panels
            .iter()
            .map(|p| SurfaceInfo {
                id: p.id,
                name: p.name.clone(),
                config: p.config.clone(),
            })
            .collect()
    }

    fn write_surface(&mut self, id: SurfaceId, text: &str) {
        self.charge(1 + text.len() as u64 / CHARS_PER_INSTRUCTION);
        if let Some(panel) = self.panels.iter_mut().find(|p| p.id == id) {
            panel.text.clear();
            panel.text.push_str(text);
            panel.writes += 1;
            trace!(panel = %panel.name, chars = text.len(), "Panel written");
        }
    }

    fn time_since_last_run(&self) -> Duration {
        self.elapsed
    }

    fn budget_used(&self) -> u64 {
        self.budget_used.get()
    }

    fn budget_limit(&self) -> Option<u64> {
        self.budget_limit
    }

    fn grid_name(&self) -> String {
        self.grid.clone()
    }

    fn echo(&mut self, text: &str) {
        self.echo.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::device::{DeviceKind, DrillTelemetry, PistonStatus, PistonTelemetry};
    use gridboard_core::{Orchestrator, OrchestratorConfig};

    fn world() -> World {
        World::from_json(
            r#"{
            "grid": "Base",
            "devices": [
                { "id": 1, "name": "Drill", "kind": { "type": "drill", "enabled": true },
                  "inventories": [ { "items": [ { "name": "Ice", "amount": 5 } ], "current_volume": 0.25 } ] },
                { "id": 2, "name": "Arm", "kind": { "type": "piston", "status": "extending", "velocity": 1.0, "max_limit": 10.0 } }
            ],
            "panels": [
                { "id": 100, "name": "LCD", "config": "[dashboard]\nblocks = \"Drill Arm\"\ncargo = true" },
                { "id": 101, "name": "Notes", "config": "shopping list" }
            ]
        }"#,
        )
        .unwrap()
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            registry_ttl: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_orchestrator_renders_simulated_world() {
        let mut host = SimHost::from_world(world());
        let mut orchestrator = Orchestrator::new(&host, config());

        host.begin_cycle(Duration::from_secs(2));
        orchestrator.run_cycle(&mut host);

        let panel = host.panel(SurfaceId(100)).unwrap();
        assert_eq!(panel.writes, 1);
        assert!(panel.text.starts_with("= Cargo =\nIce:5  \n\n"));
        assert!(panel.text.contains("= Drill[Drill] =\nStatus: On\nInventory used (m^3): 0.25\n"));
        assert!(panel.text.contains("Position: 2\n"));
        assert_eq!(host.panel(SurfaceId(101)).unwrap().writes, 0);
        assert!(host.echoed().starts_with("Dashboards: 0\nGrid: Base\n"));
    }

    #[test]
    fn test_partial_cycles_cost_less_than_rescans() {
        let mut host = SimHost::from_world(world());
        let mut orchestrator = Orchestrator::new(&host, config());

        host.begin_cycle(Duration::from_secs(1));
        let first = orchestrator.run_cycle(&mut host);
        assert!(first.discovered);
        assert!(!first.rescanned);

        host.begin_cycle(Duration::from_secs(10));
        let full = orchestrator.run_cycle(&mut host);
        host.begin_cycle(Duration::from_secs(1));
        let partial = orchestrator.run_cycle(&mut host);

        assert!(full.rescanned);
        assert!(!partial.rescanned);
        assert!(partial.budget_used < full.budget_used);
    }

    #[test]
    fn test_churn_is_pruned_then_rediscovered() {
        let mut host = SimHost::from_world(world());
        let mut orchestrator = Orchestrator::new(&host, config());
        host.begin_cycle(Duration::from_secs(1));
        orchestrator.run_cycle(&mut host);

        assert!(host.destroy(DeviceId(2)));
        let id = host.next_device_id();
        host.spawn(DeviceSpec {
            id,
            name: "Arm".to_string(),
            kind: DeviceKind::Piston(PistonTelemetry {
                status: PistonStatus::Stopped,
                ..PistonTelemetry::default()
            }),
            inventories: Vec::new(),
        });

        host.begin_cycle(Duration::from_secs(1));
        orchestrator.run_cycle(&mut host);
        assert!(!host.panel(SurfaceId(100)).unwrap().text.contains("Piston[Arm]"));

        host.begin_cycle(Duration::from_secs(10));
        let report = orchestrator.run_cycle(&mut host);
        assert!(report.rescanned);
        assert!(host
            .panel(SurfaceId(100))
            .unwrap()
            .text
            .contains("= Piston[Arm] =\nStatus: Stopped\n"));
    }

    #[test]
    fn test_destroy_unknown_device() {
        let mut host = SimHost::new("Empty");
        assert!(!host.destroy(DeviceId(5)));
        host.spawn(DeviceSpec {
            id: 5,
            name: "Drill".to_string(),
            kind: DeviceKind::Drill(DrillTelemetry::default()),
            inventories: Vec::new(),
        });
        assert_eq!(host.next_device_id(), 6);
        assert!(host.destroy(DeviceId(5)));
        assert_eq!(host.device_count(), 0);
    }

    #[test]
    fn test_spawn_max_id_does_not_overflow() {
        let world = World::from_json(
            r#"{ "devices": [ { "id": 18446744073709551615, "name": "Last", "kind": { "type": "generic" } } ] }"#,
        )
        .unwrap();
        let host = SimHost::from_world(world);
        assert_eq!(host.device_count(), 1);
        assert_eq!(host.next_device_id(), u64::MAX);
        assert!(host.device(DeviceId(u64::MAX)).is_some());
    }
}
