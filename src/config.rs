//! Fog configuration, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::cascade::{CascadeParams, LayerMask};
use crate::error::{FogError, FogResult};
use crate::occlusion::{Obstacle, ObstacleField};
use crate::proxy::AnimationParams;

/// Configuration for a fog-of-war instance.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    /// Logical grid size in cells.
    pub map_width: i32,
    pub map_height: i32,
    /// Proxy window size in cells (odd, so it has a center).
    pub window_width: i32,
    pub window_height: i32,
    /// Maximum propagation hops per pass.
    pub max_steps: u32,
    /// Maximum per-axis displacement from the viewer.
    pub max_distance: i32,
    /// Scale units per second.
    pub scale_speed: f32,
    pub max_size: f32,
    pub shrink_epsilon: f32,
    /// Height of sight lines above the ground.
    pub ray_height: f32,
    /// Obstacle layers that block vision.
    pub obstacle_mask: u32,
    /// Static obstacles for the built-in line-of-sight test.
    pub obstacles: Vec<Obstacle>,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            map_width: 200,
            map_height: 200,
            window_width: 41,
            window_height: 25,
            max_steps: 12,
            max_distance: 8,
            scale_speed: 5.0,
            max_size: 1.0,
            shrink_epsilon: 0.01,
            ray_height: 0.5,
            obstacle_mask: u32::MAX,
            obstacles: Vec::new(),
        }
    }
}

impl FogConfig {
    pub fn from_toml_str(text: &str) -> FogResult<Self> {
        let config: FogConfig = toml::from_str(text).map_err(|e| FogError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> FogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FogError::ConfigRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded fog config from {}", path.display());
        Ok(config)
    }

    /// Check sizes and rates. Capacity problems are fatal at startup.
    pub fn validate(&self) -> FogResult<()> {
        if self.map_width <= 0 || self.map_height <= 0 {
            return Err(FogError::InvalidGridSize {
                width: self.map_width as i64,
                height: self.map_height as i64,
            });
        }

        let capacity = |reason| FogError::WindowCapacity {
            window_width: self.window_width as i64,
            window_height: self.window_height as i64,
            map_width: self.map_width as i64,
            map_height: self.map_height as i64,
            reason,
        };
        if self.window_width <= 0 || self.window_height <= 0 {
            return Err(capacity("window dimensions must be positive"));
        }
        if self.window_width % 2 == 0 || self.window_height % 2 == 0 {
            return Err(capacity("window dimensions must be odd"));
        }
        if self.window_width > self.map_width || self.window_height > self.map_height {
            return Err(capacity("window is larger than the map"));
        }

        if !(self.scale_speed.is_finite() && self.scale_speed > 0.0) {
            return Err(FogError::InvalidConfig(format!(
                "scale_speed must be positive, got {}",
                self.scale_speed
            )));
        }
        if !(self.max_size.is_finite() && self.max_size > 0.0) {
            return Err(FogError::InvalidConfig(format!("max_size must be positive, got {}", self.max_size)));
        }
        if !(0.0..self.max_size).contains(&self.shrink_epsilon) {
            return Err(FogError::InvalidConfig(format!(
                "shrink_epsilon must be in [0, {}), got {}",
                self.max_size, self.shrink_epsilon
            )));
        }
        if self.max_distance < 0 {
            return Err(FogError::InvalidConfig(format!(
                "max_distance must not be negative, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }

    pub fn animation(&self) -> AnimationParams {
        AnimationParams {
            scale_speed: self.scale_speed,
            max_size: self.max_size,
            shrink_epsilon: self.shrink_epsilon,
        }
    }

    pub fn cascade(&self) -> CascadeParams {
        CascadeParams {
            max_steps: self.max_steps,
            max_distance: self.max_distance,
            ray_height: self.ray_height,
            obstacle_mask: LayerMask(self.obstacle_mask),
        }
    }

    pub fn obstacle_field(&self) -> ObstacleField {
        ObstacleField::with_obstacles(self.obstacles.clone())
    }
}
