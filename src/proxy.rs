//! Live proxies: the animated objects that materialize cells near the viewer.
//!
//! A proxy keeps a fixed slot in the window around the viewer. Re-centering
//! changes which logical cell it is bound to, never its slot. While bound it
//! runs the per-frame scale animation and mirrors the result into its cell.

use glam::{IVec2, Vec3};

use crate::grid::{CellState, LogicalCell, LogicalGrid};

/// Rates and bounds for the scale animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParams {
    /// Scale units per second, applied uniformly on all axes.
    pub scale_speed: f32,
    /// Fully grown scale.
    pub max_size: f32,
    /// A shrinking proxy at or below this scale snaps to zero.
    pub shrink_epsilon: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        AnimationParams {
            scale_speed: 5.0,
            max_size: 1.0,
            shrink_epsilon: 0.01,
        }
    }
}

/// One slot of the window pool.
#[derive(Debug, Clone)]
pub struct Proxy {
    slot: IVec2,
    array_offset: isize,
    /// Logical cell currently represented, if the slot lands on the map.
    pub bound_cell: Option<usize>,
    pub scale: Vec3,
    pub state: CellState,
    pub translucent: bool,
    /// Visited marker for the running cascade pass.
    pub checked: bool,
    /// Set once any pass validated this slot as within range. Never cleared.
    pub in_vision_range: bool,
}

impl Proxy {
    /// Create a proxy from the spawn position handed out by the pool.
    ///
    /// `anchor` is the window center at spawn time. The slot and the index
    /// offset are derived once here and stay fixed afterwards.
    pub fn from_spawn(spawn: Vec3, anchor: Vec3, map_height: usize) -> Self {
        let slot = LogicalGrid::round_coords(spawn.x, spawn.z) - LogicalGrid::round_coords(anchor.x, anchor.z);
        let array_offset = slot.y as isize + slot.x as isize * map_height as isize;
        Proxy {
            slot,
            array_offset,
            bound_cell: None,
            scale: Vec3::ONE,
            state: CellState::Active,
            translucent: false,
            checked: false,
            in_vision_range: false,
        }
    }

    /// Position in the window relative to the viewer's cell.
    #[inline]
    pub fn slot(&self) -> IVec2 {
        self.slot
    }

    /// Index delta between the viewer's cell and this proxy's cell.
    #[inline]
    pub fn array_offset(&self) -> isize {
        self.array_offset
    }

    /// Cell this proxy should represent when the viewer stands on `viewer`.
    ///
    /// The index comes from the viewer's cell plus the fixed offset. A result
    /// that falls off the array or wraps into another column means the slot
    /// hangs over the map edge, and the proxy stays unbound.
    pub fn bind_target(&self, grid: &LogicalGrid, viewer: IVec2) -> Option<usize> {
        let expected = IVec2::new(
            viewer.x.saturating_add(self.slot.x),
            viewer.y.saturating_add(self.slot.y),
        );
        match grid.index_of(viewer) {
            Some(viewer_index) => grid
                .offset_index(viewer_index, self.array_offset)
                .filter(|&i| grid.coordinates_of(i) == Some(expected)),
            None => grid.index_of(expected),
        }
    }

    /// Copy the authoritative cell state into this proxy.
    pub fn pull(&mut self, cell: &LogicalCell) {
        self.scale = cell.target_scale;
        self.state = cell.state;
        self.translucent = cell.translucent;
    }

    /// Mirror the live animation into the bound cell.
    pub fn write_back(&self, cell: &mut LogicalCell) {
        cell.target_scale = self.scale;
        cell.state = self.state;
        if self.translucent {
            cell.translucent = true;
        }
    }

    /// Switch state on both the proxy and its cell.
    pub fn set_state(&mut self, state: CellState, cell: &mut LogicalCell) {
        self.state = state;
        cell.state = state;
    }

    pub fn enter_shrinking(&mut self, cell: &mut LogicalCell) {
        self.set_state(CellState::Shrinking, cell);
    }

    pub fn enter_growing(&mut self, cell: &mut LogicalCell) {
        self.set_state(CellState::Growing, cell);
    }

    /// Advance the scale animation by `dt` seconds.
    ///
    /// Returns true on the frame the proxy first turns translucent.
    pub fn animate(&mut self, dt: f32, params: &AnimationParams) -> bool {
        let delta = Vec3::splat(dt * params.scale_speed);
        match self.state {
            CellState::Active => false,
            CellState::Shrinking => {
                if self.scale.x >= params.shrink_epsilon {
                    self.scale -= delta;
                }
                if self.scale.x <= params.shrink_epsilon {
                    self.scale = Vec3::ZERO;
                    if !self.translucent {
                        self.translucent = true;
                        return true;
                    }
                }
                false
            }
            CellState::Growing => {
                if self.scale.x < params.max_size {
                    self.scale += delta;
                }
                if self.scale.x >= params.max_size {
                    self.scale = Vec3::splat(params.max_size);
                    self.state = CellState::Active;
                }
                false
            }
        }
    }
}
