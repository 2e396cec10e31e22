//! Configuration file support for iperc
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.ipercrc.json` in the working directory
//! 3. `iperc.config.json` in the working directory
//!
//! All fields are optional. `IPERC_USE_LOCAL_STORE=true` forces the in-memory
//! store; CLI flags take precedence over both.

use crate::layout::{LayoutOptions, PageGeometry, TableSchema};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that forces the in-memory store
pub const LOCAL_STORE_ENV: &str = "IPERC_USE_LOCAL_STORE";

const DEFAULT_DATA_PATH: &str = "iperc.db";
const DEFAULT_LIST_LIMIT: usize = 50;

/// Backing store for evaluation records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Sqlite => "sqlite",
            StoreKind::Memory => "memory",
        }
    }

    /// Whether records outlive the process that wrote them
    pub fn is_persistent(&self) -> bool {
        matches!(self, StoreKind::Sqlite)
    }
}

/// iperc configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpercConfig {
    /// Store backend (default: sqlite)
    #[serde(default)]
    pub store: Option<StoreKind>,

    /// SQLite database file (default: iperc.db)
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Maximum number of summaries listed (default: 50)
    #[serde(default)]
    pub list_limit: Option<usize>,

    /// Report layout overrides
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
}

/// Report layout overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Repeat the column header row on continuation pages (default: true)
    pub repeat_header: Option<bool>,
    /// Widths of the ten table columns, in points
    pub column_widths: Option<Vec<f64>>,
}

/// Resolved configuration ready for use
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub store: StoreKind,
    pub data_path: PathBuf,
    pub list_limit: usize,
    pub layout: LayoutOptions,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl IpercConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.list_limit {
            if limit == 0 {
                anyhow::bail!("list_limit must be positive (got {})", limit);
            }
        }

        if let Some(ref path) = self.data_path {
            if path.as_os_str().is_empty() {
                anyhow::bail!("data_path must not be empty");
            }
        }

        if let Some(widths) = self.layout.as_ref().and_then(|l| l.column_widths.as_ref()) {
            let schema = TableSchema::with_widths(widths)
                .map_err(|e| anyhow::anyhow!("layout.column_widths: {}", e))?;
            let available = PageGeometry::A4_LANDSCAPE.content_width();
            if schema.total_width() > available {
                anyhow::bail!(
                    "layout.column_widths sum to {:.2}, which exceeds the printable width {:.2}",
                    schema.total_width(),
                    available
                );
            }
        }

        Ok(())
    }

    /// Resolve config into the form used by the store and renderer
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let mut layout = LayoutOptions::default();
        if let Some(ref l) = self.layout {
            if let Some(repeat) = l.repeat_header {
                layout.repeat_header = repeat;
            }
            if let Some(ref widths) = l.column_widths {
                layout.schema = TableSchema::with_widths(widths).map_err(anyhow::Error::msg)?;
            }
        }

        Ok(ResolvedConfig {
            store: self.store.unwrap_or_default(),
            data_path: self
                .data_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            list_limit: self.list_limit.unwrap_or(DEFAULT_LIST_LIMIT),
            layout,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        IpercConfig::default().resolve()
    }

    /// Apply the value of `IPERC_USE_LOCAL_STORE`
    ///
    /// Only `true` (any case) or `1` switch to the memory store.
    pub fn apply_local_store_override(&mut self, value: Option<&str>) {
        let forced = value
            .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
            .unwrap_or(false);
        if forced {
            log::debug!("{} set, using in-memory store", LOCAL_STORE_ENV);
            self.store = StoreKind::Memory;
        }
    }
}

/// Discover and load a config file from the working directory
///
/// Search order:
/// 1. `.ipercrc.json`
/// 2. `iperc.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(IpercConfig, PathBuf)>> {
    for name in [".ipercrc.json", "iperc.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<IpercConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: IpercConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from `root`.
/// Returns default config if nothing is found. The local store environment
/// override is applied last.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (IpercConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    resolved.apply_local_store_override(std::env::var(LOCAL_STORE_ENV).ok().as_deref());
    Ok(resolved)
}
