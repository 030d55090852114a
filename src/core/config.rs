//! Context configuration
//!
//! Supports saving and loading in RON (Rusty Object Notation) or JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{GfmError, GfmResult};
use crate::core::scheduler::DEFAULT_MAX_RATE;

/// Quadtree parameters used by the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadtreeConfig {
    pub max_depth: u32,
    pub max_nodes: usize,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_nodes: 10,
        }
    }
}

/// Everything a [`crate::core::Context`] is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Game title, also written to exported GIFs
    pub title: String,
    pub organization: String,
    pub version: String,
    /// Backbuffer width in pixels
    pub width: u32,
    /// Backbuffer height in pixels
    pub height: u32,
    /// Integer scale applied when presenting the backbuffer
    pub scale: u32,
    pub ups: u32,
    pub dps: u32,
    /// Highest update or draw rate the timer accepts
    pub max_rate: u32,
    pub quadtree: QuadtreeConfig,
    /// Where GIF frames are buffered; the system temp dir when unset
    pub gif_temp_dir: Option<PathBuf>,
    /// Frames captured before recording stops on its own
    pub gif_max_frames: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            title: String::from("GFraMe game"),
            organization: String::from("gframe"),
            version: String::from(env!("CARGO_PKG_VERSION")),
            width: 320,
            height: 240,
            scale: 2,
            ups: 60,
            dps: 60,
            max_rate: DEFAULT_MAX_RATE,
            quadtree: QuadtreeConfig::default(),
            gif_temp_dir: None,
            gif_max_frames: 600,
        }
    }
}

impl ContextConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set backbuffer dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Set updates and draws per second
    pub fn with_fps(mut self, ups: u32, dps: u32) -> Self {
        self.ups = ups;
        self.dps = dps;
        self
    }

    pub fn with_max_rate(mut self, max_rate: u32) -> Self {
        self.max_rate = max_rate;
        self
    }

    pub fn with_quadtree(mut self, max_depth: u32, max_nodes: usize) -> Self {
        self.quadtree = QuadtreeConfig {
            max_depth,
            max_nodes,
        };
        self
    }

    pub fn with_gif_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gif_temp_dir = Some(dir.into());
        self
    }

    pub fn with_gif_max_frames(mut self, frames: u32) -> Self {
        self.gif_max_frames = frames;
        self
    }

    /// Check the values a context can't start without
    pub fn validate(&self) -> GfmResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "backbuffer of {}x{}",
                self.width, self.height
            )));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(GfmError::InvalidArgument(format!(
                "backbuffer of {}x{} is too large",
                self.width, self.height
            )));
        }
        if self.scale == 0 {
            return Err(GfmError::InvalidArgument("scale of zero".into()));
        }
        if self.quadtree.max_depth == 0 || self.quadtree.max_nodes == 0 {
            return Err(GfmError::InvalidArgument(
                "quadtree depth and node count must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> GfmResult<()> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GfmError::Config(e.to_string()))?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> GfmResult<Self> {
        let content = fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| GfmError::Config(e.to_string()))
    }

    /// Save the config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> GfmResult<()> {
        let json_string =
            serde_json::to_string_pretty(self).map_err(|e| GfmError::Config(e.to_string()))?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> GfmResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| GfmError::Config(e.to_string()))
    }
}
