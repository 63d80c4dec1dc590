//! Box obstacles and a segment test against them.
//!
//! This is the line-of-sight capability used by the CLI modes and the tests.
//! Hosts with their own physics implement `LineOfSight` directly.

use glam::{IVec2, Vec3};
use serde::Deserialize;

use crate::cascade::{LayerMask, LineOfSight};

/// Half extent of a block placed on a single cell.
///
/// Slightly under half a cell so sight lines along a row of blocks do not
/// graze their neighbors.
pub const BLOCK_HALF_EXTENT: f32 = 0.45;

/// Height of a block placed on a single cell.
pub const BLOCK_HEIGHT: f32 = 2.0;

/// Axis-aligned opaque box.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "ObstacleCorners")]
pub struct Obstacle {
    pub min: Vec3,
    pub max: Vec3,
    pub layer: LayerMask,
}

/// Obstacle as written in a config file. Corners may come in any order.
#[derive(Deserialize)]
struct ObstacleCorners {
    min: Vec3,
    max: Vec3,
    #[serde(default = "default_layer")]
    layer: LayerMask,
}

impl From<ObstacleCorners> for Obstacle {
    fn from(corners: ObstacleCorners) -> Self {
        Obstacle {
            layer: corners.layer,
            ..Obstacle::new(corners.min, corners.max)
        }
    }
}

fn default_layer() -> LayerMask {
    LayerMask(1)
}

impl Obstacle {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Obstacle {
            min: min.min(max),
            max: min.max(max),
            layer: default_layer(),
        }
    }

    /// A block covering the cell at `(x, z)`.
    pub fn block(coords: IVec2) -> Self {
        let center = Vec3::new(coords.x as f32, 0.0, coords.y as f32);
        let half = Vec3::new(BLOCK_HALF_EXTENT, 0.0, BLOCK_HALF_EXTENT);
        Obstacle::new(center - half, center + half + Vec3::Y * BLOCK_HEIGHT)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test: does the segment `from`..`to` touch this box?
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dir = to - from;
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;

        for axis in 0..3 {
            let origin = from[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if dir[axis].abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir[axis];
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// A static set of obstacles.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_obstacles(obstacles: Vec<Obstacle>) -> Self {
        ObstacleField { obstacles }
    }

    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Add a block on `coords`, or remove it if one is already there.
    ///
    /// Returns true if a block now stands on the cell.
    pub fn toggle_block(&mut self, coords: IVec2) -> bool {
        let block = Obstacle::block(coords);
        if let Some(pos) = self.obstacles.iter().position(|o| *o == block) {
            self.obstacles.remove(pos);
            false
        } else {
            self.obstacles.push(block);
            true
        }
    }

    /// True if any obstacle covers the center of the cell at `height`.
    pub fn blocks_cell(&self, coords: IVec2, height: f32) -> bool {
        let point = Vec3::new(coords.x as f32, height, coords.y as f32);
        self.obstacles.iter().any(|o| o.contains(point))
    }
}

/// Boxes that contain `from` are ignored, so a cell covered by a wall can
/// still be seen from outside it.
impl LineOfSight for ObstacleField {
    fn has_line_of_sight(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool {
        !self
            .obstacles
            .iter()
            .any(|o| mask.intersects(o.layer) && !o.contains(from) && o.intersects_segment(from, to))
    }
}
