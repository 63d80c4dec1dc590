//! Cascade checks: the directional flood-fill that decides what the viewer sees.
//!
//! A pass starts at the viewer's cell and walks the neighbor graph outward.
//! Each branch keeps the direction it left the seed in and never turns back
//! toward it. A reached cell is validated against the step budget and a
//! direction-specific distance bound, then tested for line of sight to the
//! viewer. Visible cells are revealed and keep propagating; an occluded cell
//! is fogged and ends its branch.

pub mod flood;

pub use flood::{run_cascade, CascadeReport, CascadeVisit, VisitOutcome};

use glam::{IVec2, Vec3};
use serde::Deserialize;

use crate::grid::Direction;

/// Bitmask selecting which obstacle layers block vision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// Line-of-sight capability supplied by the host.
///
/// Implementations must be pure queries: deterministic for static geometry
/// and free of side effects.
pub trait LineOfSight {
    /// True if no obstacle on a layer in `mask` lies on the segment `from`..`to`.
    fn has_line_of_sight(&self, from: Vec3, to: Vec3, mask: LayerMask) -> bool;
}

/// Which variant of the pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    /// Startup pass: explores every cell the bounds allow.
    Initial,
    /// Pass after a re-center: only re-tests slots already known to be in range.
    Incremental,
}

/// Bounds and inputs shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParams {
    /// Maximum propagation hops from the seed.
    pub max_steps: u32,
    /// Maximum displacement from the seed on either axis.
    pub max_distance: i32,
    /// Height at which sight lines are cast.
    pub ray_height: f32,
    pub obstacle_mask: LayerMask,
}

impl Default for CascadeParams {
    fn default() -> Self {
        CascadeParams {
            max_steps: 12,
            max_distance: 8,
            ray_height: 0.5,
            obstacle_mask: LayerMask::ALL,
        }
    }
}

impl CascadeParams {
    /// Whether a cell displaced by `offset` from the seed, reached after
    /// `steps` hops on a branch heading `dir`, is within bounds.
    ///
    /// The forward axis is capped only ahead of the seed; the cross axis is
    /// capped on both sides.
    pub fn validate(&self, dir: Direction, offset: IVec2, steps: u32) -> bool {
        if steps > self.max_steps {
            return false;
        }
        let d = self.max_distance;
        let (dx, dz) = (offset.x, offset.y);
        let within = |v: i32| (-d..=d).contains(&v);
        match dir {
            Direction::North => dz <= d && within(dx),
            Direction::South => dz >= -d && within(dx),
            Direction::West => dx >= -d && within(dz),
            Direction::East => dx <= d && within(dz),
        }
    }
}
