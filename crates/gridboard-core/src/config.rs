//! Per-surface configuration
//!
//! A surface opts in by carrying a `[dashboard]` section in its configuration
//! text. Only that section is parsed (as TOML), so unrelated sections owned by
//! other scripts never cause a parse failure. Options of the wrong type fall
//! back to their default instead of rejecting the whole section.
//!
//! ```toml
//! [dashboard]
//! blocks = "Piston 1, Drill"
//! power = true
//! cargo = true
//! width = 32
//! ```

use thiserror::Error;
use toml::{Table, Value};
use tracing::warn;

/// Name of the recognized configuration section
pub const SECTION: &str = "dashboard";

pub const DEFAULT_WIDTH: u16 = 40;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse [{section}] section: {source}")]
    ParseError {
        section: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Missing [{0}] section")]
    MissingSection(String),
}

/// Options of one report surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    /// Subscribed device names, in display order
    pub blocks: Vec<String>,
    pub power: bool,
    pub cargo: bool,
    pub production: bool,
    pub status: bool,
    /// Character width used to wrap tally sections
    pub width: u16,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            power: false,
            cargo: false,
            production: false,
            status: false,
            width: DEFAULT_WIDTH,
        }
    }
}

impl SurfaceConfig {
    /// Parse the `[dashboard]` section of a surface's configuration text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let body = section_body(text, SECTION).ok_or_else(|| ConfigError::MissingSection(SECTION.to_string()))?;
        let table: Table = body.parse().map_err(|source| ConfigError::ParseError {
            section: SECTION.to_string(),
            source,
        })?;
        Ok(Self::from_table(&table))
    }

    fn from_table(table: &Table) -> Self {
        Self {
            blocks: blocks(table),
            power: flag(table, "power"),
            cargo: flag(table, "cargo"),
            production: flag(table, "production"),
            status: flag(table, "status"),
            width: width(table),
        }
    }
}

/// Cheap check for a `[section]` header line, without parsing anything
pub fn has_section(text: &str, section: &str) -> bool {
    text.lines().any(|line| header_name(line) == Some(section))
}

fn header_name(line: &str) -> Option<&str> {
    let line = line.trim();
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

/// Lines between `[section]` and the next header
fn section_body(text: &str, section: &str) -> Option<String> {
    let mut lines = text.lines().skip_while(|line| header_name(line) != Some(section));
    lines.next()?;
    let body: Vec<&str> = lines.take_while(|line| header_name(line).is_none()).collect();
    Some(body.join("\n"))
}

/// Split a subscription list on commas and whitespace
pub fn split_names(list: &str) -> Vec<String> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn blocks(table: &Table) -> Vec<String> {
    match table.get("blocks") {
        None => Vec::new(),
        Some(Value::String(list)) => split_names(list),
        // Arrays allow names containing spaces
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        Some(other) => {
            warn!(key = "blocks", value = %other, "Expected a name list, ignoring");
            Vec::new()
        }
    }
}

fn flag(table: &Table, key: &str) -> bool {
    match table.get(key) {
        None => false,
        Some(Value::Boolean(value)) => *value,
        Some(Value::String(value)) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => true,
            "false" | "no" | "off" => false,
            _ => {
                warn!(key = %key, value = %value, "Expected a boolean, using false");
                false
            }
        },
        Some(other) => {
            warn!(key = %key, value = %other, "Expected a boolean, using false");
            false
        }
    }
}

fn width(table: &Table) -> u16 {
    match table.get("width") {
        None => DEFAULT_WIDTH,
        Some(Value::Integer(value)) => u16::try_from(*value).unwrap_or_else(|_| {
            warn!(key = "width", value = *value, "Width out of range, using default");
            DEFAULT_WIDTH
        }),
        Some(other) => {
            warn!(key = "width", value = %other, "Expected an integer, using default");
            DEFAULT_WIDTH
        }
    }
}
