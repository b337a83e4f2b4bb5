//! Configuration loading and typed config structures for the Civitas engine.
//!
//! The canonical configuration lives in `civitas-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//!
//! The tunable sections reuse the parameter structs of the subsystem crates
//! (`EconomyParams`, `RouteParams`, `DiplomacyParams`) so every constant
//! has exactly one default. Seed data (resources, civilizations, actions)
//! sits next to them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use civitas_diplomacy::action::standard_actions;
use civitas_diplomacy::{ActionDef, DiplomacyParams};
use civitas_economy::{EconomyParams, ResourceSpec, RouteParams};
use civitas_types::{CivProfile, Position, ResourceId};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The file parsed but a value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `civitas-config.yaml`. All fields have
/// defaults, so an empty file describes a world with the standard
/// resources and actions and no civilizations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CivitasConfig {
    /// World-level settings (name, seed, cycle timing).
    #[serde(default)]
    pub world: WorldConfig,

    /// Market and pricing parameters.
    #[serde(default)]
    pub economy: EconomyParams,

    /// Trade route parameters.
    #[serde(default)]
    pub routes: RouteParams,

    /// Relation, incident, and agreement parameters.
    #[serde(default)]
    pub diplomacy: DiplomacyParams,

    /// Currency settings.
    #[serde(default)]
    pub treasury: TreasuryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Resource kinds registered at startup.
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceSpec>,

    /// Civilizations founded at startup.
    #[serde(default)]
    pub civilizations: Vec<CivilizationSpec>,

    /// Diplomatic actions available to every civilization.
    #[serde(default = "default_actions")]
    pub actions: Vec<ActionDef>,
}

impl Default for CivitasConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            economy: EconomyParams::default(),
            routes: RouteParams::default(),
            diplomacy: DiplomacyParams::default(),
            treasury: TreasuryConfig::default(),
            logging: LoggingConfig::default(),
            resources: default_resources(),
            civilizations: Vec::new(),
            actions: default_actions(),
        }
    }
}

impl CivitasConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_file`] for a file that exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });
        if self.world.economic_interval_ms == 0 {
            return invalid("world.economic_interval_ms must be positive".to_owned());
        }
        if self.world.diplomacy_interval_ms == 0 {
            return invalid("world.diplomacy_interval_ms must be positive".to_owned());
        }
        if !(self.world.days_per_second.is_finite() && self.world.days_per_second > 0.0) {
            return invalid(format!(
                "world.days_per_second must be positive, got {}",
                self.world.days_per_second
            ));
        }
        let economy = &self.economy;
        if !(economy.volatility.is_finite() && economy.volatility >= 0.0) {
            return invalid(format!(
                "economy.volatility must be finite and non-negative, got {}",
                economy.volatility
            ));
        }
        if !economy.inflation_rate.is_finite() {
            return invalid(format!("economy.inflation_rate must be finite, got {}", economy.inflation_rate));
        }
        if !(economy.epsilon.is_finite() && economy.epsilon > 0.0) {
            return invalid(format!("economy.epsilon must be positive, got {}", economy.epsilon));
        }
        if !(economy.starting_stock.is_finite() && economy.starting_stock >= 0.0) {
            return invalid(format!(
                "economy.starting_stock must be non-negative, got {}",
                economy.starting_stock
            ));
        }
        for (name, value) in [
            ("economy.price_change_threshold", economy.price_change_threshold),
            ("economy.strength_smoothing", economy.strength_smoothing),
            ("economy.stability_smoothing", economy.stability_smoothing),
            ("routes.smoothing", self.routes.smoothing),
            ("routes.min_viability", self.routes.min_viability),
            ("routes.base_risk", self.routes.base_risk),
            ("routes.raid_severity", self.routes.raid_severity),
        ] {
            // NaN is outside every range.
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must lie in [0, 1], got {value}"));
            }
        }
        let mut names = BTreeSet::new();
        for civ in &self.civilizations {
            if !names.insert(civ.name.as_str()) {
                return invalid(format!("civilization name {:?} is used twice", civ.name));
            }
        }
        let mut resources = BTreeSet::new();
        for resource in &self.resources {
            if !resources.insert(&resource.id) {
                return invalid(format!("resource {} is defined twice", resource.id));
            }
            if !(resource.base_value.is_finite() && resource.base_value > 0.0) {
                return invalid(format!("resource {} needs a positive base_value", resource.id));
            }
            if let Some(stock) = resource.starting_stock
                && !(stock.is_finite() && stock >= 0.0)
            {
                return invalid(format!("resource {} has an invalid starting_stock {stock}", resource.id));
            }
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated milliseconds per economic cycle.
    #[serde(default = "default_economic_interval_ms")]
    pub economic_interval_ms: u64,

    /// Simulated milliseconds per diplomacy cycle.
    #[serde(default = "default_diplomacy_interval_ms")]
    pub diplomacy_interval_ms: u64,

    /// Simulated days that pass per simulated second. Diplomacy ages
    /// incidents and agreements in days.
    #[serde(default = "default_days_per_second")]
    pub days_per_second: f64,

    /// Most cycles of one kind run by a single advance; the rest are
    /// dropped.
    #[serde(default = "default_max_catch_up_cycles")]
    pub max_catch_up_cycles: u32,

    /// Stop the engine after this many real seconds (0 = run until
    /// interrupted).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            economic_interval_ms: default_economic_interval_ms(),
            diplomacy_interval_ms: default_diplomacy_interval_ms(),
            days_per_second: default_days_per_second(),
            max_catch_up_cycles: default_max_catch_up_cycles(),
            max_real_time_seconds: 0,
        }
    }
}

/// Currency settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreasuryConfig {
    /// Opening balance for civilizations that do not set their own.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error). `RUST_LOG`
    /// takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Real seconds between world summary lines (0 = never).
    #[serde(default = "default_summary_interval_seconds")]
    pub summary_interval_seconds: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            summary_interval_seconds: default_summary_interval_seconds(),
        }
    }
}

/// A civilization founded at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CivilizationSpec {
    /// Display name, unique within the file.
    pub name: String,

    /// Inhabitants.
    #[serde(default)]
    pub population: u64,

    /// Military units.
    #[serde(default)]
    pub unit_count: u64,

    /// Unlocked capability tags (technologies, buildings).
    #[serde(default)]
    pub capabilities: BTreeSet<String>,

    /// Culture trait tags.
    #[serde(default)]
    pub culture_traits: BTreeSet<String>,

    /// Capital position.
    #[serde(default)]
    pub position: Position,

    /// Currency earned per simulated second.
    #[serde(default)]
    pub income_rate: f64,

    /// Opening balance; defaults to `treasury.starting_balance`.
    #[serde(default)]
    pub starting_balance: Option<f64>,

    /// Shared history in `[-1, 1]` with civilizations listed earlier,
    /// keyed by name.
    #[serde(default)]
    pub shared_history: BTreeMap<String, f64>,
}

impl CivilizationSpec {
    /// A fresh profile for this civilization.
    pub fn to_profile(&self) -> CivProfile {
        let mut profile = CivProfile::new(self.name.clone());
        profile.population = self.population;
        profile.unit_count = self.unit_count;
        profile.capabilities.clone_from(&self.capabilities);
        profile.culture_traits.clone_from(&self.culture_traits);
        profile.position = self.position;
        profile.income_rate = self.income_rate;
        profile
    }
}

fn default_world_name() -> String {
    "Civitas".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_economic_interval_ms() -> u64 {
    1_000
}

const fn default_diplomacy_interval_ms() -> u64 {
    5_000
}

const fn default_days_per_second() -> f64 {
    0.2
}

const fn default_max_catch_up_cycles() -> u32 {
    5
}

const fn default_starting_balance() -> f64 {
    1_000.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_summary_interval_seconds() -> u64 {
    30
}

fn default_actions() -> Vec<ActionDef> {
    standard_actions()
}

fn resource(
    id: &str,
    base_value: f64,
    starting_stock: Option<f64>,
    rates: (f64, f64),
    requirements: &[&str],
) -> ResourceSpec {
    ResourceSpec {
        id: ResourceId::from(id),
        name: None,
        base_value,
        starting_stock,
        production_rate: rates.0,
        consumption_rate: rates.1,
        per_capita_consumption: 0.01,
        per_unit_consumption: 0.05,
        luxury: false,
        strategic: false,
        requirements: requirements.iter().map(|t| (*t).to_owned()).collect(),
    }
}

fn default_resources() -> Vec<ResourceSpec> {
    let food = resource("food", 10.0, None, (2.0, 0.5), &["agriculture"]);
    let silk = ResourceSpec {
        luxury: true,
        per_capita_consumption: 0.001,
        per_unit_consumption: 0.0,
        ..resource("silk", 50.0, Some(20.0), (0.2, 0.05), &["weaving"])
    };
    let iron = ResourceSpec {
        strategic: true,
        per_capita_consumption: 0.0,
        ..resource("iron", 30.0, Some(150.0), (0.5, 0.1), &["mining"])
    };
    vec![food, silk, iron]
}
