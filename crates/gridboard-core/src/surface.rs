//! Report surfaces
//!
//! A surface is one configured output. It owns its options, the devices it is
//! subscribed to, and a log of names that failed to resolve on the last
//! configuration load. Surfaces outlive discovery passes; see
//! [`Orchestrator`](crate::orchestrator::Orchestrator).

use std::fmt::Write;
use tracing::{debug, warn};

use crate::config::SurfaceConfig;
use crate::device::DeviceRef;
use crate::format::{self, CARGO_KEY, POWER_KEY, PRODUCTION_KEY};
use crate::host::{Host, SurfaceId, SurfaceInfo};
use crate::memo::MemoCache;
use crate::registry::DeviceRegistry;

/// Header of the trailing status block
pub const STATUS_HEADER: &str = "= Dashboard System =\n";

#[derive(Debug)]
pub struct ReportSurface {
    id: SurfaceId,
    name: String,
    config: SurfaceConfig,
    subscriptions: Vec<DeviceRef>,
    discovery_log: String,
    text: String,
}

impl ReportSurface {
    pub fn new(info: &SurfaceInfo) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            config: SurfaceConfig::default(),
            subscriptions: Vec::new(),
            discovery_log: String::new(),
            text: String::new(),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Follow a rename on the host side
    pub fn set_name(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &[DeviceRef] {
        &self.subscriptions
    }

    /// Names that failed to resolve on the last configuration load
    pub fn discovery_status(&self) -> &str {
        &self.discovery_log
    }

    /// Text published by the last render
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Apply new options and re-resolve the subscription list
    pub fn load_configuration<H: Host + ?Sized>(
        &mut self,
        config: &SurfaceConfig,
        registry: &mut DeviceRegistry,
        host: &H,
    ) {
        self.discovery_log.clear();
        self.subscriptions.clear();
        self.config = config.clone();

        for name in &config.blocks {
            match registry.lookup_by_name(host, name) {
                Some(device) => self.subscriptions.push(device),
                None => {
                    warn!(surface = %self.name, device = %name, "Subscribed device not found");
                    let _ = writeln!(self.discovery_log, "{} failed to find {}", self.name, name);
                }
            }
        }

        debug!(
            surface = %self.name,
            subscribed = self.subscriptions.len(),
            power = self.config.power,
            cargo = self.config.cargo,
            production = self.config.production,
            status = self.config.status,
            width = self.config.width,
            "Loaded surface configuration"
        );
    }

    /// Build the report and publish it to the host
    pub fn render<H: Host + ?Sized>(
        &mut self,
        global_status: &str,
        registry: &DeviceRegistry,
        cache: &mut MemoCache,
        host: &mut H,
    ) {
        self.text.clear();
        self.subscriptions.retain(DeviceRef::is_alive);

        let width = self.config.width;
        if self.config.power {
            self.text.push_str(cache.get_or_generate(POWER_KEY, || format::power(registry)));
        }
        if self.config.cargo {
            self.text.push_str(cache.get_or_generate(CARGO_KEY, || format::cargo(registry, width)));
        }
        if self.config.production {
            self.text
                .push_str(cache.get_or_generate(PRODUCTION_KEY, || format::production(registry, width)));
        }

        for handle in &self.subscriptions {
            let Some(device) = handle.upgrade() else {
                continue;
            };
            let Some(formatter) = format::formatter_for(&device.state().kind) else {
                continue;
            };
            let section = cache.get_or_generate(&format::device_key(&device), || {
                formatter(device.name(), &device.state())
            });
            self.text.push_str(section);
        }

        if self.config.status {
            self.text.push_str(STATUS_HEADER);
            self.text.push_str(global_status);
        }

        host.write_surface(self.id, &self.text);
    }
}
