//! World-sized logical grid and its neighbor graph.
//!
//! Cells are stored column by column: `index = z + x * height`, so moving
//! North/South steps the index by one and moving West/East steps it by a whole
//! column. The neighbor graph is built once; links that would leave the map or
//! wrap into the next column are left empty.

pub mod cell;

pub use cell::{CellState, LogicalCell};

use glam::{IVec2, Vec3};

use crate::error::{FogError, FogResult};

/// Cardinal direction on the grid. North is +z, East is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    West,
    East,
    South,
}

impl Direction {
    /// All directions in neighbor-slot order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::East,
        Direction::South,
    ];

    /// Slot in `LogicalCell::neighbors`.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::West => 1,
            Direction::East => 2,
            Direction::South => 3,
        }
    }

    /// Unit step in `(x, z)` cell coordinates.
    #[inline]
    pub fn step(self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, 1),
            Direction::West => IVec2::new(-1, 0),
            Direction::East => IVec2::new(1, 0),
            Direction::South => IVec2::new(0, -1),
        }
    }

    /// Directions explored from a cell reached by propagating in `self`.
    ///
    /// Everything except the way back toward the origin.
    #[inline]
    pub fn fan_out(self) -> [Direction; 3] {
        match self {
            Direction::North => [Direction::North, Direction::West, Direction::East],
            Direction::West => [Direction::North, Direction::West, Direction::South],
            Direction::East => [Direction::North, Direction::East, Direction::South],
            Direction::South => [Direction::West, Direction::East, Direction::South],
        }
    }
}

/// The persistent grid of logical cells.
#[derive(Debug, Clone)]
pub struct LogicalGrid {
    width: usize,
    height: usize,
    cells: Vec<LogicalCell>,
}

impl LogicalGrid {
    /// Allocate `width * height` cells and link their neighbors.
    pub fn build(width: i32, height: i32) -> FogResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(FogError::InvalidGridSize {
                width: width as i64,
                height: height as i64,
            });
        }

        let width = width as usize;
        let height = height as usize;
        let mut grid = LogicalGrid {
            width,
            height,
            cells: vec![LogicalCell::default(); width * height],
        };

        for index in 0..grid.cells.len() {
            let neighbors = Direction::ALL.map(|dir| grid.linked_neighbor(index, dir));
            grid.cells[index].neighbors = neighbors;
        }

        log::debug!("Built logical grid {}x{} ({} cells)", width, height, grid.cells.len());
        Ok(grid)
    }

    /// Neighbor index arithmetic, bounded by the column as well as the array.
    fn linked_neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
        let h = self.height;
        let z = index % h;
        let x = index / h;
        match dir {
            Direction::North if z + 1 < h => Some(index + 1),
            Direction::South if z > 0 => Some(index - 1),
            Direction::West if x > 0 => Some(index - h),
            Direction::East if x + 1 < self.width => Some(index + h),
            _ => None,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the cell at `(x, z)`, or `None` off the map.
    #[inline]
    pub fn index_of(&self, coords: IVec2) -> Option<usize> {
        if coords.x < 0 || coords.y < 0 {
            return None;
        }
        let (x, z) = (coords.x as usize, coords.y as usize);
        if x >= self.width || z >= self.height {
            return None;
        }
        Some(z + x * self.height)
    }

    /// `(x, z)` coordinates of a cell index, or `None` past the end.
    #[inline]
    pub fn coordinates_of(&self, index: usize) -> Option<IVec2> {
        if index >= self.cells.len() {
            return None;
        }
        let x = index / self.height;
        let z = index - x * self.height;
        Some(IVec2::new(x as i32, z as i32))
    }

    /// Neighbor of `index` in `dir`, if one exists.
    #[inline]
    pub fn neighbor_of(&self, index: usize, dir: Direction) -> Option<usize> {
        self.cells.get(index)?.neighbors[dir.slot()]
    }

    /// `index + offset`, kept inside `[0, len)`.
    ///
    /// Only the array range is checked here; callers that need column
    /// correctness compare coordinates afterwards.
    #[inline]
    pub fn offset_index(&self, index: usize, offset: isize) -> Option<usize> {
        let target = index.checked_add_signed(offset)?;
        (target < self.cells.len()).then_some(target)
    }

    /// World-space center of a cell at height `y`.
    pub fn world_position(&self, index: usize, y: f32) -> Option<Vec3> {
        let c = self.coordinates_of(index)?;
        Some(Vec3::new(c.x as f32, y, c.y as f32))
    }

    /// Cell coordinates for a world position, rounded to the nearest integer.
    #[inline]
    pub fn round_coords(x: f32, z: f32) -> IVec2 {
        IVec2::new(x.round() as i32, z.round() as i32)
    }

    #[inline]
    pub fn cell(&self, index: usize) -> Option<&LogicalCell> {
        self.cells.get(index)
    }

    #[inline]
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut LogicalCell> {
        self.cells.get_mut(index)
    }

    /// Cell at `(x, z)`.
    pub fn cell_at(&self, coords: IVec2) -> Option<&LogicalCell> {
        self.index_of(coords).and_then(|i| self.cell(i))
    }

    pub fn cells(&self) -> &[LogicalCell] {
        &self.cells
    }
}
