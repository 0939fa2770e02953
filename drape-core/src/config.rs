/*
    Drape - garment design placement engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

/// Tunables shared by the editor and every rendering surface. Two surfaces
/// rendering the same payload must be given the same config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_safe_zone_min")]
    pub safe_zone_min: f32,
    #[serde(default = "default_safe_zone_max")]
    pub safe_zone_max: f32,
    /// Size slider value that renders the artwork at 1.0x.
    #[serde(default = "default_size_baseline")]
    pub size_baseline: f32,
    /// Width of the artwork at 1.0x, as a fraction of the container width.
    #[serde(default = "default_natural_width_fraction")]
    pub natural_width_fraction: f32,
    #[serde(default = "default_garment_sizes")]
    pub garment_sizes: Vec<String>,
    #[serde(default = "default_garment_colors")]
    pub garment_colors: Vec<String>,
}

fn default_max_upload_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_safe_zone_min() -> f32 {
    20.0
}

fn default_safe_zone_max() -> f32 {
    80.0
}

fn default_size_baseline() -> f32 {
    50.0
}

fn default_natural_width_fraction() -> f32 {
    0.5
}

fn default_garment_sizes() -> Vec<String> {
    ["S", "M", "L", "XL", "XXL"].iter().map(|s| s.to_string()).collect()
}

fn default_garment_colors() -> Vec<String> {
    ["#ffffff", "#18181b", "#1e3a8a", "#b91c1c", "#9ca3af"].iter().map(|s| s.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            safe_zone_min: default_safe_zone_min(),
            safe_zone_max: default_safe_zone_max(),
            size_baseline: default_size_baseline(),
            natural_width_fraction: default_natural_width_fraction(),
            garment_sizes: default_garment_sizes(),
            garment_colors: default_garment_colors(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, DesignError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| DesignError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DesignError> {
        if !(self.safe_zone_min.is_finite() && self.safe_zone_max.is_finite()) {
            return Err(DesignError::InvalidConfig("safe zone bounds must be finite".into()));
        }
        if self.safe_zone_min >= self.safe_zone_max {
            return Err(DesignError::InvalidConfig(format!(
                "safe zone min {} must be below max {}",
                self.safe_zone_min, self.safe_zone_max
            )));
        }
        if self.safe_zone_min < crate::POSITION_MIN || self.safe_zone_max > crate::POSITION_MAX {
            return Err(DesignError::InvalidConfig("safe zone must lie within 0..=100".into()));
        }
        if !(self.size_baseline.is_finite() && self.size_baseline > 0.0) {
            return Err(DesignError::InvalidConfig("size baseline must be positive".into()));
        }
        if !(self.natural_width_fraction.is_finite() && self.natural_width_fraction > 0.0) {
            return Err(DesignError::InvalidConfig("natural width fraction must be positive".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(DesignError::InvalidConfig("upload limit must be non-zero".into()));
        }
        Ok(())
    }

    pub fn scale_factor(&self, size: f32) -> f32 {
        size / self.size_baseline
    }

    /// Never panics, even for a config that skipped [`EngineConfig::validate`];
    /// inverted bounds collapse onto `safe_zone_max`.
    pub fn clamp_to_safe_zone(&self, percent: f32) -> f32 {
        percent.max(self.safe_zone_min).min(self.safe_zone_max)
    }
}
