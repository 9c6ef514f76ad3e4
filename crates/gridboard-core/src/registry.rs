//! TTL-gated device registry
//!
//! A full rescan enumerates every device on the grid and sorts it into
//! category buckets. Because that is proportional to the whole population it
//! only happens once per TTL window; every other refresh just prunes handles
//! whose device the host has since destroyed. Devices created between full
//! rescans stay invisible until the next one.
//!
//! The name index is filled lazily. Misses are cached as `None` and are not
//! retried until the next full rescan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::device::{Category, Device, DeviceRef, InventoryRef};
use crate::host::Host;

/// Default interval between full rescans
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct DeviceRegistry {
    ttl: Duration,
    age: Duration,
    rescanned: bool,
    rescans: u64,
    devices: Vec<DeviceRef>,
    buckets: HashMap<Category, Vec<DeviceRef>>,
    inventories: Vec<InventoryRef>,
    by_name: HashMap<String, Option<DeviceRef>>,
}

impl DeviceRegistry {
    /// Create a registry and perform the initial full rescan
    pub fn new<H: Host + ?Sized>(host: &H, ttl: Duration) -> Self {
        let mut registry = Self {
            ttl,
            age: Duration::ZERO,
            rescanned: false,
            rescans: 0,
            devices: Vec::new(),
            buckets: HashMap::new(),
            inventories: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.refresh(host, true);
        registry
    }

    /// Advance the TTL clock and either prune or fully rescan
    pub fn refresh<H: Host + ?Sized>(&mut self, host: &H, force: bool) {
        self.age += host.time_since_last_run();

        if self.age < self.ttl && !force {
            self.prune();
            self.rescanned = false;
            return;
        }

        self.rescan(host);
    }

    /// Drop every handle whose device is gone
    fn prune(&mut self) {
        let before = self.devices.len();

        self.devices.retain(DeviceRef::is_alive);
        for bucket in self.buckets.values_mut() {
            bucket.retain(DeviceRef::is_alive);
        }
        self.inventories.retain(InventoryRef::is_alive);
        // Cached misses stay; only dead hits are dropped
        self.by_name
            .retain(|_, entry| entry.as_ref().map_or(true, DeviceRef::is_alive));

        trace!(
            pruned = before - self.devices.len(),
            age_ms = self.age.as_millis() as u64,
            "Pruned registry"
        );
    }

    fn rescan<H: Host + ?Sized>(&mut self, host: &H) {
        self.buckets.clear();
        self.inventories.clear();
        self.by_name.clear();

        self.devices = host.devices();
        self.devices.retain(DeviceRef::is_alive);

        for handle in &self.devices {
            let Some(device) = handle.upgrade() else {
                continue;
            };

            for category in device.categories() {
                self.buckets.entry(*category).or_default().push(handle.clone());
            }

            for index in 0..device.inventory_count() {
                self.inventories.push(InventoryRef::new(handle.clone(), index));
            }
        }

        self.age = Duration::ZERO;
        self.rescanned = true;
        self.rescans += 1;

        debug!(
            devices = self.devices.len(),
            inventories = self.inventories.len(),
            power = self.bucket(Category::PowerProducer).len(),
            batteries = self.bucket(Category::Battery).len(),
            production = self.bucket(Category::Production).len(),
            "Full registry rescan"
        );
    }

    /// True iff the most recent refresh was a full rescan
    pub fn fresh_this_cycle(&self) -> bool {
        self.rescanned
    }

    /// Resolve a device by name, caching the answer (including a miss)
    /// until the next full rescan
    pub fn lookup_by_name<H: Host + ?Sized>(&mut self, host: &H, name: &str) -> Option<DeviceRef> {
        if let Some(entry) = self.by_name.get(name) {
            return entry.clone();
        }

        let resolved = host.device_by_name(name);
        if resolved.is_none() {
            debug!(name = %name, "Device name did not resolve");
        }
        self.by_name.insert(name.to_string(), resolved.clone());
        resolved
    }

    pub fn bucket(&self, category: Category) -> &[DeviceRef] {
        self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live devices of one bucket
    pub fn live(&self, category: Category) -> impl Iterator<Item = Arc<Device>> + '_ {
        self.bucket(category).iter().filter_map(DeviceRef::upgrade)
    }

    pub fn inventories(&self) -> &[InventoryRef] {
        &self.inventories
    }

    pub fn devices(&self) -> &[DeviceRef] {
        &self.devices
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Time since the last full rescan
    pub fn age(&self) -> Duration {
        self.age
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of full rescans performed so far
    pub fn rescans(&self) -> u64 {
        self.rescans
    }

    /// Number of cached name lookups, misses included
    pub fn indexed_names(&self) -> usize {
        self.by_name.len()
    }
}
