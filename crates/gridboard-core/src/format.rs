//! Section formatters
//!
//! Pure functions from a device (or the whole registry) to a block of display
//! text, trailing blank line included. Surfaces call them through the
//! [`MemoCache`](crate::memo::MemoCache): per-device sections are keyed by the
//! device id, aggregate sections by the `*_KEY` literals below. Ids are
//! numeric, so the two key spaces never collide.

use std::collections::HashMap;
use std::fmt::Write;

use crate::device::{Category, ChargeMode, ConnectorStatus, Device, DeviceKind, DeviceState};
use crate::registry::DeviceRegistry;

pub const POWER_KEY: &str = "power";
pub const CARGO_KEY: &str = "cargo";
pub const PRODUCTION_KEY: &str = "production";

/// Renders one device block
pub type DeviceFormatter = fn(&str, &DeviceState) -> String;

/// Formatter table keyed by device kind. Kinds without a per-device section
/// return `None` and are skipped by the caller.
pub fn formatter_for(kind: &DeviceKind) -> Option<DeviceFormatter> {
    match kind {
        DeviceKind::Piston(_) => Some(piston),
        DeviceKind::AdvancedRotor(_) => Some(advanced_rotor),
        DeviceKind::Drill(_) => Some(drill),
        DeviceKind::Connector(_) => Some(connector),
        DeviceKind::PowerProducer(_)
        | DeviceKind::Battery(_)
        | DeviceKind::Production(_)
        | DeviceKind::Generic => None,
    }
}

/// Memo key of a device's section
pub fn device_key(device: &Device) -> String {
    device.id().to_string()
}

/// Round to `digits` decimals, ties to even
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

pub fn piston(name: &str, state: &DeviceState) -> String {
    let DeviceKind::Piston(piston) = &state.kind else {
        return String::new();
    };
    format!(
        "= Piston[{}] =\nStatus: {}\nPosition: {}\nVelocity: {}\nLimit: {}\n\n",
        name, piston.status, piston.position, piston.velocity, piston.max_limit
    )
}

pub fn advanced_rotor(name: &str, state: &DeviceState) -> String {
    let DeviceKind::AdvancedRotor(rotor) = &state.kind else {
        return String::new();
    };
    format!(
        "= AdvancedRotor[{}] =\nAngle (deg): {}\nTarget RPM: {}\n\n",
        name,
        round_to(rotor.angle.to_degrees(), 0),
        round_to(rotor.target_rpm, 1)
    )
}

pub fn drill(name: &str, state: &DeviceState) -> String {
    let DeviceKind::Drill(drill) = &state.kind else {
        return String::new();
    };
    format!(
        "= Drill[{}] =\nStatus: {}\nInventory used (m^3): {}\n\n",
        name,
        if drill.enabled { "On" } else { "Off" },
        used_volume(state)
    )
}

pub fn connector(name: &str, state: &DeviceState) -> String {
    let DeviceKind::Connector(connector) = &state.kind else {
        return String::new();
    };
    let mut text = format!(
        "= Connector[{}] =\nInventory used (m^3): {}\nStatus: {}\n",
        name,
        used_volume(state),
        connector.status
    );
    if connector.status == ConnectorStatus::Connected {
        let docked = connector.docked_grid.as_deref().unwrap_or("");
        let _ = writeln!(text, "Docked: {}", docked);
    }
    text.push('\n');
    text
}

fn used_volume(state: &DeviceState) -> f64 {
    state.inventories.first().map_or(0.0, |inv| inv.current_volume)
}

/// Aggregate output and storage over every power producer and battery
pub fn power(registry: &DeviceRegistry) -> String {
    let mut max_output = 0.0;
    let mut current_output = 0.0;
    for producer in registry.live(Category::PowerProducer) {
        match &producer.state().kind {
            DeviceKind::Battery(battery) if battery.charge_mode == ChargeMode::Recharge => {}
            DeviceKind::Battery(battery) => {
                max_output += battery.max_output;
                current_output += battery.current_output;
            }
            DeviceKind::PowerProducer(output) => {
                max_output += output.max_output;
                current_output += output.current_output;
            }
            _ => {}
        }
    }

    let mut text = format!(
        "Power consumption: {} / {} MW\n",
        round_to(current_output, 2),
        round_to(max_output, 2)
    );

    let mut stored = 0.0;
    let mut max_stored = 0.0;
    let mut batteries = 0;
    let mut charging = 0;
    let mut discharging = 0;
    for device in registry.live(Category::Battery) {
        let state = device.state();
        let DeviceKind::Battery(battery) = &state.kind else {
            continue;
        };
        batteries += 1;
        stored += battery.stored;
        max_stored += battery.max_stored;
        if battery.is_charging {
            charging += 1;
        } else if battery.current_output > 0.0 {
            discharging += 1;
        }
    }

    let _ = writeln!(
        text,
        "Stored: {} / {} MW/h ({} batteries)",
        round_to(stored, 2),
        round_to(max_stored, 2),
        batteries
    );
    let _ = writeln!(text, "{} charging, {} discharging batteries\n", charging, discharging);
    text
}

/// Item totals in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, amount: f64) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].1 += amount,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), amount));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lay the totals out as `name:qty` tokens wrapped at `width` characters
    ///
    /// Widths are counted in chars, not pixels. A token wider than `width` is
    /// still placed whole on its own line.
    pub fn layout(&self, width: u16) -> String {
        let width = usize::from(width);
        let mut text = String::new();
        let mut line_len = 0;
        for (name, amount) in &self.entries {
            let token = format!("{}:{}  ", name, round_to(*amount, 1));
            let token_len = token.chars().count();
            if line_len + token_len > width {
                text.push('\n');
                line_len = 0;
            }
            text.push_str(&token);
            line_len += token_len;
        }
        text.push('\n');
        text
    }
}

/// Contents of every inventory on the grid
pub fn cargo(registry: &DeviceRegistry, width: u16) -> String {
    let mut tally = Tally::new();
    for inventory in registry.inventories() {
        inventory.with(|inv| {
            for item in &inv.items {
                tally.add(&item.name, item.amount);
            }
        });
    }
    format!("= Cargo =\n{}\n", tally.layout(width))
}

/// Queued jobs of every production unit
pub fn production(registry: &DeviceRegistry, width: u16) -> String {
    let mut tally = Tally::new();
    for producer in registry.live(Category::Production) {
        if let DeviceKind::Production(queue) = &producer.state().kind {
            for job in &queue.queue {
                tally.add(&job.blueprint, job.amount);
            }
        }
    }
    format!("= Production =\n{}\n", tally.layout(width))
}
