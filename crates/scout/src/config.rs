//! Configuration management

use anyhow::{Context, Result, anyhow};
use probe::{DriverKind, ProbeEntry, Prober};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScoutConfig {
    #[serde(default)]
    pub scout: ScoutSettings,
    #[serde(default)]
    pub probe: ProbeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutSettings {
    /// Seconds between periodic enumeration passes while active.
    #[serde(default = "ScoutSettings::default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Default log level, overridden by RUST_LOG or --log-level.
    #[serde(default = "ScoutSettings::default_log_level")]
    pub log_level: String,
}

impl Default for ScoutSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: Self::default_refresh_interval(),
            log_level: Self::default_log_level(),
        }
    }
}

impl ScoutSettings {
    fn default_refresh_interval() -> u64 {
        5
    }

    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Extra capability rows appended to the built-in probe table.
///
/// # Example Configuration
/// ```toml
/// [[probe.extra]]
/// vendor_id = 0x0403
/// product_id = 0x8a98   # custom-EEPROM FTDI board
/// driver = "ftdi"
///
/// [[probe.extra]]
/// vendor_id = 0x1209    # no product_id: whole vendor
/// driver = "cdc-acm"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeSettings {
    #[serde(default)]
    pub extra: Vec<ExtraProbeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraProbeEntry {
    pub vendor_id: u16,
    /// Omit to match every product from the vendor.
    #[serde(default)]
    pub product_id: Option<u16>,
    pub driver: DriverKind,
}

impl From<&ExtraProbeEntry> for ProbeEntry {
    fn from(entry: &ExtraProbeEntry) -> Self {
        ProbeEntry {
            vendor_id: entry.vendor_id,
            product_id: entry.product_id,
            kind: entry.driver,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from the specified path, or from the standard
    /// locations when none is given.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/serial-scout/scout.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ScoutConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or fall back to defaults.
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("serial-scout").join("scout.toml")
        } else {
            PathBuf::from(".config/serial-scout/scout.toml")
        }
    }

    /// Build the prober from the built-in table plus the configured extras.
    pub fn prober(&self) -> Prober {
        Prober::with_extra_entries(self.probe.extra.iter().map(ProbeEntry::from))
    }

    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.scout.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.scout.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.scout.refresh_interval_secs == 0 {
            return Err(anyhow!("refresh_interval_secs must be at least 1"));
        }

        Ok(())
    }
}

/// Expand a user-supplied path (tilde and environment variables included).
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
