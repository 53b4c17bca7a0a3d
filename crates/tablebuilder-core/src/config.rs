//! Layered configuration for the table builder
//!
//! Every setting remembers the source that supplied it. Values are offered
//! from defaults, then a TOML file, then `TABLEBUILDER_*` environment
//! variables, then CLI flags; an offer replaces the current value only when
//! its source ranks higher.

use crate::error::{Result, TableBuilderError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MAX_TABLE_CELLS_ALLOWED: u64 = 25_000;
pub const DEFAULT_CROPPED_TABLE_MAX_ROWS: usize = 1_000;

pub const MAX_TABLE_CELLS_ALLOWED_VAR: &str = "TABLEBUILDER_MAX_TABLE_CELLS_ALLOWED";
pub const CROPPED_TABLE_MAX_ROWS_VAR: &str = "TABLEBUILDER_CROPPED_TABLE_MAX_ROWS";

/// Where a setting came from, lowest rank first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Cli,
}

/// A setting and the source that supplied it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn default_value(value: T) -> Self {
        Self { value, source: ConfigSource::Default }
    }

    /// Take `value` if `source` outranks the current source
    pub fn offer(&mut self, value: T, source: ConfigSource) {
        if source > self.source {
            self.value = value;
            self.source = source;
        }
    }

    fn offer_some(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            self.offer(value, source);
        }
    }
}

/// Size limits handed to the query optimiser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBuilderOptions {
    /// Ceiling on estimated result cells before a query is cropped
    pub max_table_cells_allowed: u64,

    /// Maximum number of time periods kept when a query is cropped
    pub cropped_table_max_rows: usize,
}

impl Default for TableBuilderOptions {
    fn default() -> Self {
        Self {
            max_table_cells_allowed: DEFAULT_MAX_TABLE_CELLS_ALLOWED,
            cropped_table_max_rows: DEFAULT_CROPPED_TABLE_MAX_ROWS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub max_table_cells_allowed: ConfigValue<u64>,
    pub cropped_table_max_rows: ConfigValue<usize>,
}

impl LayeredConfig {
    pub fn with_defaults() -> Self {
        Self {
            max_table_cells_allowed: ConfigValue::default_value(DEFAULT_MAX_TABLE_CELLS_ALLOWED),
            cropped_table_max_rows: ConfigValue::default_value(DEFAULT_CROPPED_TABLE_MAX_ROWS),
        }
    }

    /// Apply the settings present in a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| file_error(path, e))?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| file_error(path, e))?;

        self.max_table_cells_allowed
            .offer_some(file.max_table_cells_allowed, ConfigSource::File);
        self.cropped_table_max_rows
            .offer_some(file.cropped_table_max_rows, ConfigSource::File);

        Ok(self)
    }

    /// Apply `TABLEBUILDER_*` environment variables. Unparseable values are
    /// logged and skipped.
    pub fn load_from_env(mut self) -> Self {
        env_override(&mut self.max_table_cells_allowed, MAX_TABLE_CELLS_ALLOWED_VAR);
        env_override(&mut self.cropped_table_max_rows, CROPPED_TABLE_MAX_ROWS_VAR);
        self
    }

    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        self.max_table_cells_allowed
            .offer_some(overrides.max_table_cells_allowed, ConfigSource::Cli);
        self.cropped_table_max_rows
            .offer_some(overrides.cropped_table_max_rows, ConfigSource::Cli);
    }

    /// Validated limits for the query optimiser
    pub fn table_builder_options(&self) -> Result<TableBuilderOptions> {
        if self.max_table_cells_allowed.value == 0 {
            return Err(TableBuilderError::ConfigInvalid {
                key: "max_table_cells_allowed".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.cropped_table_max_rows.value == 0 {
            return Err(TableBuilderError::ConfigInvalid {
                key: "cropped_table_max_rows".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(TableBuilderOptions {
            max_table_cells_allowed: self.max_table_cells_allowed.value,
            cropped_table_max_rows: self.cropped_table_max_rows.value,
        })
    }

    /// Every setting rendered with its source, keyed by file key
    pub fn to_inspection_map(&self) -> BTreeMap<&'static str, (String, ConfigSource)> {
        BTreeMap::from([
            ("max_table_cells_allowed", describe(&self.max_table_cells_allowed)),
            ("cropped_table_max_rows", describe(&self.cropped_table_max_rows)),
        ])
    }
}

fn describe<T: Display>(setting: &ConfigValue<T>) -> (String, ConfigSource) {
    (setting.value.to_string(), setting.source)
}

fn env_override<T: FromStr>(setting: &mut ConfigValue<T>, var: &str) {
    let Ok(raw) = env::var(var) else {
        return;
    };

    match raw.trim().parse() {
        Ok(value) => setting.offer(value, ConfigSource::Environment),
        Err(_) => tracing::warn!("Ignoring {}='{}': expected a positive integer", var, raw),
    }
}

fn file_error(path: &Path, error: impl Display) -> TableBuilderError {
    TableBuilderError::ConfigInvalid {
        key: path.display().to_string(),
        reason: error.to_string(),
    }
}

/// Settings a TOML file may carry
#[derive(Debug, Deserialize)]
struct FileConfig {
    max_table_cells_allowed: Option<u64>,
    cropped_table_max_rows: Option<usize>,
}

/// Settings given as CLI flags
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub max_table_cells_allowed: Option<u64>,
    pub cropped_table_max_rows: Option<usize>,
}
