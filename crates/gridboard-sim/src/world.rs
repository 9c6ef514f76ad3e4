//! World fixture files
//!
//! A world describes a grid: its devices with their initial telemetry and the
//! panels that may carry a dashboard configuration.
//!
//! ```json
//! {
//!   "grid": "Mining Base",
//!   "devices": [
//!     { "id": 1, "name": "Reactor", "kind": { "type": "power_producer", "max_output": 15.0 } }
//!   ],
//!   "panels": [
//!     { "id": 100, "name": "LCD Power", "config": "[dashboard]\npower = true" }
//!   ]
//! }
//! ```

use gridboard_core::device::{DeviceKind, Inventory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Duplicate device id {0}")]
    DuplicateDevice(u64),
    #[error("Duplicate panel id {0}")]
    DuplicatePanel(u64),
}

/// A device as written in the world file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub id: u64,
    pub name: String,
    pub kind: DeviceKind,
    #[serde(default)]
    pub inventories: Vec<Inventory>,
}

/// An output panel as written in the world file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub id: u64,
    pub name: String,
    /// Free-form configuration text; may contain a `[dashboard]` section
    #[serde(default)]
    pub config: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    #[serde(default = "default_grid")]
    pub grid: String,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
}

fn default_grid() -> String {
    "Grid".to_string()
}

impl Default for World {
    fn default() -> Self {
        Self {
            grid: default_grid(),
            devices: Vec::new(),
            panels: Vec::new(),
        }
    }
}

impl World {
    /// Load and validate a world from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, WorldError> {
        let world: World = serde_json::from_str(content)?;
        world.validate()?;
        Ok(world)
    }

    /// Ids must be unique; names may repeat, as on a real grid
    pub fn validate(&self) -> Result<(), WorldError> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id) {
                return Err(WorldError::DuplicateDevice(device.id));
            }
        }
        let mut seen = HashSet::new();
        for panel in &self.panels {
            if !seen.insert(panel.id) {
                return Err(WorldError::DuplicatePanel(panel.id));
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), WorldError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimHost;
    use gridboard_core::device::{DrillTelemetry, PowerTelemetry};
    use gridboard_core::{Orchestrator, OrchestratorConfig, SurfaceId};
    use std::time::Duration;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "grid": "Mining Base",
        "devices": [
            { "id": 1, "name": "Reactor", "kind": { "type": "power_producer", "current_output": 2.5, "max_output": 15.0 } },
            { "id": 2, "name": "Drill", "kind": { "type": "drill", "enabled": true },
              "inventories": [ { "items": [ { "name": "Stone", "amount": 12.5 } ], "current_volume": 0.5 } ] },
            { "id": 3, "name": "Light", "kind": { "type": "generic" } }
        ],
        "panels": [
            { "id": 100, "name": "LCD", "config": "[dashboard]\npower = true" }
        ]
    }"#;

    #[test]
    fn test_parse_sample_world() {
        let world = World::from_json(SAMPLE).unwrap();
        assert_eq!(world.grid, "Mining Base");
        assert_eq!(world.devices.len(), 3);
        assert_eq!(
            world.devices[0].kind,
            DeviceKind::PowerProducer(PowerTelemetry {
                current_output: 2.5,
                max_output: 15.0,
            })
        );
        assert_eq!(world.devices[1].kind, DeviceKind::Drill(DrillTelemetry { enabled: true }));
        assert_eq!(world.devices[1].inventories[0].items[0].amount, 12.5);
        assert_eq!(world.devices[2].kind, DeviceKind::Generic);
        assert_eq!(world.panels[0].config, "[dashboard]\npower = true");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{ "devices": [
            { "id": 1, "name": "A", "kind": { "type": "generic" } },
            { "id": 1, "name": "B", "kind": { "type": "generic" } }
        ] }"#;
        assert!(matches!(World::from_json(json), Err(WorldError::DuplicateDevice(1))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("worlds/base.json");

        let world = World::from_json(SAMPLE).unwrap();
        world.save(&path).unwrap();

        let loaded = World::from_file(&path).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = World::from_file(&temp_dir.path().join("absent.json"));
        assert!(matches!(result, Err(WorldError::IoError(_))));
    }

    #[test]
    fn test_demo_world_parses() {
        let world = World::from_json(include_str!("../../../demos/world.json")).unwrap();
        assert_eq!(world.grid, "Mining Base");
        assert_eq!(world.devices.len(), 9);
        assert_eq!(world.panels.len(), 4);

        let mut host = SimHost::from_world(world);
        let mut orchestrator = Orchestrator::new(&host, OrchestratorConfig::default());
        host.begin_cycle(Duration::from_secs(1));
        orchestrator.run_cycle(&mut host);

        let drilling = orchestrator.surface(SurfaceId(101)).unwrap();
        assert_eq!(drilling.discovery_status(), "");
        let text = &host.panel(SurfaceId(101)).unwrap().text;
        assert!(text.contains("= Piston[Drill Piston] ="));
        assert!(text.contains("Rotor[Drill Rotor]"));
        assert_eq!(text.matches("= Drill[Drill] =").count(), 1);
    }
}
