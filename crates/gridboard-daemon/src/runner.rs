//! Cycle loop and panel mirroring

use anyhow::{Context, Result};
use gridboard_core::{CycleReport, Orchestrator, SurfaceId};
use gridboard_sim::{Panel, SimHost};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::Config;

/// Mirrors panel text into files, rewriting only panels written since the
/// last sync
pub struct PanelMirror {
    dir: PathBuf,
    synced: HashMap<SurfaceId, u64>,
}

impl PanelMirror {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            synced: HashMap::new(),
        })
    }

    pub fn path_for(&self, panel: &Panel) -> PathBuf {
        let name: String = panel
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}-{}.txt", name, panel.id))
    }

    /// Write changed panels; returns how many files were written
    pub fn sync(&mut self, panels: &[Panel]) -> Result<usize> {
        let mut written = 0;
        for panel in panels {
            if self.synced.get(&panel.id) == Some(&panel.writes) || panel.writes == 0 {
                continue;
            }
            let path = self.path_for(panel);
            std::fs::write(&path, &panel.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            self.synced.insert(panel.id, panel.writes);
            written += 1;
        }
        Ok(written)
    }
}

pub struct Runner {
    host: SimHost,
    orchestrator: Orchestrator,
    mirror: Option<PanelMirror>,
}

impl Runner {
    pub fn new(config: &Config, host: SimHost, mirror: Option<PanelMirror>) -> Self {
        let host = host.with_budget_limit(config.budget_limit());
        let orchestrator = Orchestrator::new(&host, config.to_orchestrator_config());
        Self {
            host,
            orchestrator,
            mirror,
        }
    }

    /// One cycle: advance the simulated grid, render, mirror
    pub fn step(&mut self, elapsed: Duration) -> Result<CycleReport> {
        self.host.begin_cycle(elapsed);
        let report = self.orchestrator.run_cycle(&mut self.host);
        debug!(status = %self.host.echoed(), "Cycle status");

        if let Some(mirror) = self.mirror.as_mut() {
            let written = mirror.sync(self.host.panels())?;
            debug!(files = written, "Mirrored panels");
        }
        Ok(report)
    }

    /// Run cycles on a fixed interval until `max_cycles` (0 = unbounded)
    /// or Ctrl-C; returns the number of cycles run
    pub async fn run(&mut self, period: Duration, max_cycles: u64) -> Result<u64> {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();
        let mut cycles = 0;

        info!(interval_ms = period.as_millis() as u64, "Cycle scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping");
                    break;
                }
            }

            let now = Instant::now();
            let elapsed = now - last;
            last = now;

            let report = self.step(elapsed)?;
            cycles += 1;
            if report.rescanned {
                info!(
                    cycle = cycles,
                    devices = self.orchestrator.registry().device_count(),
                    surfaces = report.surfaces,
                    budget = report.budget_used,
                    "Full rescan"
                );
            }

            if max_cycles > 0 && cycles >= max_cycles {
                break;
            }
        }

        Ok(cycles)
    }

    pub fn host(&self) -> &SimHost {
        &self.host
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_sim::World;
    use tempfile::TempDir;

    fn host() -> SimHost {
        let world = World::from_json(
            r#"{
            "grid": "Outpost",
            "devices": [
                { "id": 1, "name": "Reactor", "kind": { "type": "power_producer", "current_output": 1.0, "max_output": 5.0 } }
            ],
            "panels": [
                { "id": 7, "name": "LCD Power #1", "config": "[dashboard]\npower = true" },
                { "id": 8, "name": "Idle", "config": "" }
            ]
        }"#,
        )
        .unwrap();
        SimHost::from_world(world)
    }

    #[test]
    fn test_step_mirrors_written_panels() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = PanelMirror::new(temp_dir.path().join("panels")).unwrap();
        let mut runner = Runner::new(&Config::default(), host(), Some(mirror));

        let report = runner.step(Duration::from_millis(1666)).unwrap();
        assert!(report.discovered);
        assert!(!report.rescanned);
        assert_eq!(report.surfaces, 1);

        let path = temp_dir.path().join("panels/LCD_Power__1-7.txt");
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "Power consumption: 1 / 5 MW\nStored: 0 / 0 MW/h (0 batteries)\n0 charging, 0 discharging batteries\n\n");
        assert!(!temp_dir.path().join("panels/Idle-8.txt").exists());
    }

    #[test]
    fn test_mirror_skips_unchanged_panels() {
        let temp_dir = TempDir::new().unwrap();
        let mut mirror = PanelMirror::new(temp_dir.path().to_path_buf()).unwrap();
        let mut runner = Runner::new(&Config::default(), host(), None);
        runner.step(Duration::from_secs(1)).unwrap();

        assert_eq!(mirror.sync(runner.host().panels()).unwrap(), 1);
        assert_eq!(mirror.sync(runner.host().panels()).unwrap(), 0);

        runner.step(Duration::from_secs(1)).unwrap();
        assert_eq!(mirror.sync(runner.host().panels()).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_after_max_cycles() {
        let mut runner = Runner::new(&Config::default(), host(), None);
        let cycles = runner.run(Duration::from_millis(1), 3).await.unwrap();
        assert_eq!(cycles, 3);
        assert_eq!(runner.orchestrator().cycles(), 3);
    }
}
