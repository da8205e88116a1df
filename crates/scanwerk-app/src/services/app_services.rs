// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: resolves the data directory and owns the detector
// configuration persisted there.

use std::path::{Path, PathBuf};

use scanwerk_core::DetectorConfig;
use scanwerk_core::error::Result;
use tracing::{info, warn};

use super::data_dir;

/// Shared services for the driver.
#[derive(Debug, Clone)]
pub struct AppServices {
    data_dir: PathBuf,
    config: DetectorConfig,
}

impl AppServices {
    /// Initialise services in the platform data directory.
    pub fn init() -> Self {
        Self::with_data_dir(data_dir::data_dir())
    }

    /// Initialise services rooted at `dir`.
    ///
    /// A missing, unreadable or invalid config file falls back to defaults.
    pub fn with_data_dir(dir: PathBuf) -> Self {
        info!(path = %dir.display(), "initialising app services");
        let config = load_config(&dir).unwrap_or_default();
        Self {
            data_dir: dir,
            config,
        }
    }

    /// Get a clone of the current config.
    pub fn config(&self) -> DetectorConfig {
        self.config.clone()
    }

    /// Update and persist the config.
    pub fn save_config(&mut self, config: &DetectorConfig) -> Result<()> {
        config.validate()?;
        persist_config(&self.data_dir, config)?;
        self.config = config.clone();
        info!(path = %self.config_path().display(), "detector config saved");
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }
}

// -- Config file persistence -------------------------------------------------

const CONFIG_FILE: &str = "detector.json";

fn load_config(data_dir: &Path) -> Option<DetectorConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    let config: DetectorConfig = match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable detector config; using defaults");
            return None;
        }
    };
    if let Err(e) = config.validate() {
        warn!(path = %path.display(), error = %e, "invalid detector config; using defaults");
        return None;
    }
    Some(config)
}

fn persist_config(data_dir: &Path, config: &DetectorConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
