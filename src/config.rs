//! Application configuration, loaded from YAML.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to override:
//!
//! ```yaml
//! max_attachments: 8
//! far_clip: 50.0
//! display:
//!   width: 1440
//!   height: 2560
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::attachment::MAX_ATTACHMENTS;
use crate::geometry::DisplayGeometry;
use crate::input::TAP_QUEUE_CAPACITY;

/// Runtime settings for the frame loop and the simulated session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pending taps kept before new ones are dropped.
    pub tap_queue_capacity: usize,
    /// Placed objects kept before the oldest is evicted.
    pub max_attachments: usize,
    /// Near clip plane of the projection (m).
    pub near_clip: f64,
    /// Far clip plane of the projection (m).
    pub far_clip: f64,
    /// Uniform scale applied to every placed object's model matrix.
    pub object_scale: f32,
    pub display: DisplayGeometry,
    pub vertical_fov_deg: f64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tap_queue_capacity: TAP_QUEUE_CAPACITY,
            max_attachments: MAX_ATTACHMENTS,
            near_clip: 0.1,
            far_clip: 100.0,
            object_scale: 1.0,
            display: DisplayGeometry::default(),
            vertical_fov_deg: 60.0,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tap_queue_capacity == 0 {
            bail!("tap_queue_capacity must be at least 1");
        }
        if self.max_attachments == 0 {
            bail!("max_attachments must be at least 1");
        }
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            bail!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near_clip,
                self.far_clip
            );
        }
        if !(self.object_scale > 0.0) {
            bail!("object_scale must be positive, got {}", self.object_scale);
        }
        if !self.display.is_valid() {
            bail!(
                "display must have a finite positive size, got {}x{}",
                self.display.width,
                self.display.height
            );
        }
        if !(self.vertical_fov_deg > 0.0 && self.vertical_fov_deg < 180.0) {
            bail!("vertical_fov_deg must be in (0, 180), got {}", self.vertical_fov_deg);
        }
        Ok(())
    }
}
