//! Persistent per-location fog record.

use glam::Vec3;

/// Animation state shared by logical cells and the proxies that mirror them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    /// Idle and fully grown (fogged).
    #[default]
    Active,
    /// Revealed: scaling toward zero, or already collapsed.
    Shrinking,
    /// Returning to fog; becomes `Active` once fully grown.
    Growing,
}

/// One entry of the world-sized grid.
///
/// Cells are allocated once and never removed. Links to neighbors and to the
/// bound proxy are indices; `None` means absent.
#[derive(Debug, Clone)]
pub struct LogicalCell {
    /// Authoritative uniform scale, 0..=max per axis.
    pub target_scale: Vec3,
    pub state: CellState,
    /// Set once the cell has fully collapsed; never cleared.
    pub translucent: bool,
    /// Neighbor indices, ordered North, West, East, South.
    pub neighbors: [Option<usize>; 4],
    /// Index of the proxy currently representing this cell.
    pub bound_proxy: Option<usize>,
}

impl Default for LogicalCell {
    fn default() -> Self {
        LogicalCell {
            target_scale: Vec3::ONE,
            state: CellState::Active,
            translucent: false,
            neighbors: [None; 4],
            bound_proxy: None,
        }
    }
}

impl LogicalCell {
    /// Overwrite scale and state in one step.
    pub fn define(&mut self, scale: Vec3, state: CellState) {
        self.target_scale = scale;
        self.state = state;
    }

    pub fn is_revealed(&self) -> bool {
        self.state == CellState::Shrinking
    }
}
