//! Indicator configuration, read from TOML.

use std::path::{Path, PathBuf};

use perch_platform::Size;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::position::{Alignment, ClippingPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerchConfig {
    pub alignment: Alignment,
    pub clipping: ClippingPolicy,
    /// Dismissal fade, in seconds.
    pub fade_seconds: f32,
    /// Content-driven resize animation, in seconds.
    pub resize_seconds: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub title: String,
    /// PNG used for the tray icon. The backend draws a placeholder when unset.
    pub icon_path: Option<PathBuf>,
    /// Starting value of the indicator visibility signal.
    pub visible: bool,
}

impl Default for PerchConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            clipping: ClippingPolicy::default(),
            fade_seconds: 0.3,
            resize_seconds: 0.2,
            content_width: 300.0,
            content_height: 200.0,
            title: "Perch".into(),
            icon_path: None,
            visible: true,
        }
    }
}

impl PerchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`PerchConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("no config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn content_size(&self) -> Size {
        Size::new(self.content_width, self.content_height)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let duration_ok = |seconds: f32| seconds.is_finite() && seconds >= 0.0;
        if !(duration_ok(self.fade_seconds) && duration_ok(self.resize_seconds)) {
            return Err(ConfigError::Invalid(
                "animation durations must be finite and non-negative".into(),
            ));
        }
        let extent_ok = |extent: f32| extent.is_finite() && extent > 0.0;
        if !(extent_ok(self.content_width) && extent_ok(self.content_height)) {
            return Err(ConfigError::Invalid(format!(
                "content size {}x{} must be positive",
                self.content_width, self.content_height
            )));
        }
        Ok(())
    }
}
