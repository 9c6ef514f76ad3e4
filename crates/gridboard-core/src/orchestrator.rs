//! One scheduling cycle
//!
//! Surface discovery piggybacks on the registry's TTL: surfaces are only
//! re-enumerated on the first cycle and on cycles where the registry did a
//! full rescan.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{self, SurfaceConfig, SECTION};
use crate::format::round_to;
use crate::host::{Host, SurfaceId};
use crate::memo::MemoCache;
use crate::registry::{DeviceRegistry, DEFAULT_TTL};
use crate::surface::ReportSurface;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Interval between full registry rescans (and surface discovery)
    pub registry_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            registry_ttl: DEFAULT_TTL,
        }
    }
}

/// Summary of one finished cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// The registry did a full rescan
    pub rescanned: bool,
    /// Surfaces were re-enumerated
    pub discovered: bool,
    pub surfaces: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub budget_used: u64,
}

/// Owns all cross-cycle state
pub struct Orchestrator {
    registry: DeviceRegistry,
    cache: MemoCache,
    surfaces: BTreeMap<SurfaceId, ReportSurface>,
    discovery_log: String,
    last_budget_used: u64,
    cycles: u64,
}

impl Orchestrator {
    /// Build the orchestrator; the registry does its initial full rescan here
    pub fn new<H: Host + ?Sized>(host: &H, config: OrchestratorConfig) -> Self {
        let registry = DeviceRegistry::new(host, config.registry_ttl);
        info!(
            devices = registry.device_count(),
            ttl_secs = config.registry_ttl.as_secs_f64(),
            "Orchestrator started"
        );
        Self {
            registry,
            cache: MemoCache::new(),
            surfaces: BTreeMap::new(),
            discovery_log: String::new(),
            last_budget_used: 0,
            cycles: 0,
        }
    }

    /// Run one cycle against the host
    pub fn run_cycle<H: Host + ?Sized>(&mut self, host: &mut H) -> CycleReport {
        let status = self.global_status(&*host);
        host.echo(&status);

        self.registry.refresh(&*host, false);
        self.cache.clear();

        // The initial rescan happens in `new`, so the first cycle always discovers
        let rescanned = self.registry.fresh_this_cycle();
        let discovered = rescanned || self.cycles == 0;
        if discovered {
            self.discovery_log.clear();
            self.discover_surfaces(&*host);
        }

        for surface in self.surfaces.values_mut() {
            surface.render(&status, &self.registry, &mut self.cache, &mut *host);
        }

        self.last_budget_used = host.budget_used();
        if let Some(limit) = host.budget_limit() {
            if self.last_budget_used > limit {
                warn!(used = self.last_budget_used, limit = limit, "Cycle exceeded compute budget");
            }
        }
        self.cycles += 1;

        let report = CycleReport {
            rescanned,
            discovered,
            surfaces: self.surfaces.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            budget_used: self.last_budget_used,
        };
        debug!(
            cycle = self.cycles,
            rescanned = report.rescanned,
            discovered = report.discovered,
            surfaces = report.surfaces,
            hits = report.cache_hits,
            misses = report.cache_misses,
            budget = report.budget_used,
            "Cycle complete"
        );
        report
    }

    /// Re-enumerate configured surfaces, keeping state for known ids
    fn discover_surfaces<H: Host + ?Sized>(&mut self, host: &H) {
        let mut previous = std::mem::take(&mut self.surfaces);

        for info in host.surfaces() {
            if !config::has_section(&info.config, SECTION) {
                continue;
            }

            let surface_config = match SurfaceConfig::parse(&info.config) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(surface = %info.name, error = %e, "Skipping surface with invalid configuration");
                    let _ = writeln!(self.discovery_log, "Failed to parse configuration of {}", info.name);
                    continue;
                }
            };

            let mut surface = match previous.remove(&info.id) {
                Some(mut existing) => {
                    existing.set_name(&info.name);
                    existing
                }
                None => {
                    info!(surface = %info.name, id = %info.id, "Discovered surface");
                    ReportSurface::new(&info)
                }
            };
            surface.load_configuration(&surface_config, &mut self.registry, host);
            self.surfaces.insert(info.id, surface);
        }

        for surface in previous.values() {
            info!(surface = %surface.name(), id = %surface.id(), "Surface removed");
        }
    }

    /// Status text shown in surface footers and echoed to the host
    ///
    /// Cache counters and budget describe the previous cycle.
    pub fn global_status<H: Host + ?Sized>(&self, host: &H) -> String {
        let mut status = format!(
            "Dashboards: {}\nGrid: {}\nBlocks: {}\nBlock cache age: {}s\nData cache: {} hits / {} misses\nLast instruction count: {}\n",
            self.surfaces.len(),
            host.grid_name(),
            self.registry.device_count(),
            round_to(self.registry.age().as_secs_f64(), 1),
            self.cache.hits(),
            self.cache.misses(),
            self.last_budget_used,
        );
        status.push_str(&self.discovery_log);
        for surface in self.surfaces.values() {
            status.push_str(surface.discovery_status());
        }
        status
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&ReportSurface> {
        self.surfaces.get(&id)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &ReportSurface> {
        self.surfaces.values()
    }

    /// Diagnostics from the last discovery pass (parse failures)
    pub fn discovery_log(&self) -> &str {
        &self.discovery_log
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
