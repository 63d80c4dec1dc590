//! The proxy window that follows the viewer across the logical grid.
//!
//! Each frame the viewer position is rounded to a cell. When that cell
//! changes, every proxy is remapped to the cell at its fixed offset from the
//! viewer, the grid state is pulled into the proxies, and an incremental
//! cascade pass runs from the viewer's new cell. The remap always completes
//! before the pass reads any state.

use glam::{IVec2, Vec3};
use rayon::prelude::*;

use crate::cascade::{run_cascade, CascadeMode, CascadeParams, CascadeReport, LineOfSight};
use crate::config::FogConfig;
use crate::error::{FogError, FogResult};
use crate::grid::{CellState, LogicalCell, LogicalGrid};
use crate::proxy::{AnimationParams, Proxy};

/// Source of the viewer's world position, sampled once per tick.
pub trait ViewerSource {
    fn current_viewer_position(&self) -> Vec3;
}

impl ViewerSource for Vec3 {
    fn current_viewer_position(&self) -> Vec3 {
        *self
    }
}

/// Spawn positions for a `width x height` window centered on `anchor`.
///
/// Columns are emitted west to east, each from south to north. Proxies sit
/// half a unit above the anchor.
pub fn materialize_window(width: i32, height: i32, anchor: Vec3) -> Vec<Vec3> {
    let half_w = (width - 1) / 2;
    let half_h = (height - 1) / 2;
    let mut spawns = Vec::with_capacity((width * height).max(0) as usize);
    for x in -half_w..=half_w {
        for z in -half_h..=half_h {
            spawns.push(Vec3::new(anchor.x + x as f32, anchor.y + 0.5, anchor.z + z as f32));
        }
    }
    spawns
}

/// Pull a viewer cell far off the map back to just outside the window's reach.
///
/// Past one cell beyond the half extent no slot lands on the map, so every
/// position out there binds the same way.
fn clamp_to_reach(coords: IVec2, grid: &LogicalGrid, half_extent: IVec2) -> IVec2 {
    let min = -half_extent - IVec2::ONE;
    let max = IVec2::new(grid.width() as i32, grid.height() as i32) + half_extent;
    coords.clamp(min, max)
}

/// Owns the logical grid and the proxy pool, and keeps them in sync with the viewer.
pub struct WindowManager {
    grid: LogicalGrid,
    proxies: Vec<Proxy>,
    half_extent: IVec2,
    animation: AnimationParams,
    cascade: CascadeParams,
    viewer: IVec2,
    last_report: Option<CascadeReport>,
}

impl WindowManager {
    /// Build the grid, spawn the window around `viewer` and run the initial pass.
    pub fn new(config: &FogConfig, viewer: Vec3, los: &dyn LineOfSight) -> FogResult<Self> {
        config.validate()?;
        let grid = LogicalGrid::build(config.map_width, config.map_height)?;

        let half_extent = IVec2::new((config.window_width - 1) / 2, (config.window_height - 1) / 2);
        let coords = clamp_to_reach(LogicalGrid::round_coords(viewer.x, viewer.z), &grid, half_extent);
        let anchor = Vec3::new(coords.x as f32, 0.0, coords.y as f32);
        let proxies: Vec<Proxy> = materialize_window(config.window_width, config.window_height, anchor)
            .into_iter()
            .map(|spawn| Proxy::from_spawn(spawn, anchor, grid.height()))
            .collect();

        log::info!(
            "Fog of war: {}x{} grid, {}x{} window ({} proxies)",
            grid.width(),
            grid.height(),
            config.window_width,
            config.window_height,
            proxies.len()
        );

        let mut manager = WindowManager {
            grid,
            proxies,
            half_extent,
            animation: config.animation(),
            cascade: config.cascade(),
            viewer: coords,
            last_report: None,
        };
        manager.remap(coords);
        manager.run_pass(CascadeMode::Initial, los);

        if let Some(report) = &manager.last_report {
            log::info!(
                "Initial cascade: {} cells visited, {} revealed",
                report.visits.len(),
                report.revealed()
            );
        }
        Ok(manager)
    }

    /// One frame: sample the viewer, re-center if needed, then animate.
    pub fn update(&mut self, source: &dyn ViewerSource, dt: f32, los: &dyn LineOfSight) {
        let position = source.current_viewer_position();
        self.on_viewer_moved(position.x, position.z, los);
        self.animate(dt);
    }

    /// Re-center on the viewer's rounded position.
    ///
    /// Returns false without touching anything if the viewer is still on the
    /// same cell.
    pub fn on_viewer_moved(&mut self, x: f32, z: f32, los: &dyn LineOfSight) -> bool {
        let coords = clamp_to_reach(LogicalGrid::round_coords(x, z), &self.grid, self.half_extent);
        if coords == self.viewer {
            return false;
        }
        log::debug!("Viewer moved {} -> {}", self.viewer, coords);
        self.viewer = coords;
        self.remap(coords);
        self.run_pass(CascadeMode::Incremental, los);
        true
    }

    /// Re-run the remap and incremental pass at the current cell.
    ///
    /// Needed after the obstacle geometry changes.
    pub fn refresh(&mut self, los: &dyn LineOfSight) {
        self.remap(self.viewer);
        self.run_pass(CascadeMode::Incremental, los);
    }

    /// Move every proxy onto the cell at its offset from `viewer`.
    fn remap(&mut self, viewer: IVec2) {
        let full = Vec3::splat(self.animation.max_size);

        // Release old bindings. Cells leaving the window go back to full fog;
        // cells that stay keep their live scale but must be re-revealed by the
        // coming pass.
        let mut vacated = 0usize;
        for proxy in &mut self.proxies {
            let Some(prev) = proxy.bound_cell.take() else {
                continue;
            };
            let Some(prev_coords) = self.grid.coordinates_of(prev) else {
                continue;
            };
            let Some(cell) = self.grid.cell_mut(prev) else {
                continue;
            };
            cell.bound_proxy = None;

            let dx = prev_coords.x.abs_diff(viewer.x);
            let dz = prev_coords.y.abs_diff(viewer.y);
            if dx > self.half_extent.x as u32 || dz > self.half_extent.y as u32 {
                cell.define(full, CellState::Growing);
                vacated += 1;
            } else {
                proxy.write_back(cell);
                cell.state = CellState::Growing;
            }
        }

        for (index, proxy) in self.proxies.iter_mut().enumerate() {
            proxy.bound_cell = proxy.bind_target(&self.grid, viewer);
            if let Some(cell) = proxy.bound_cell.and_then(|c| self.grid.cell_mut(c)) {
                cell.bound_proxy = Some(index);
            }
        }

        self.rebind();
        log::debug!("Remapped window to {} ({} cells vacated)", viewer, vacated);
    }

    /// Pull the authoritative cell state into every bound proxy.
    fn rebind(&mut self) {
        let full = Vec3::splat(self.animation.max_size);
        for proxy in &mut self.proxies {
            match proxy.bound_cell.and_then(|c| self.grid.cell(c)) {
                Some(cell) => proxy.pull(cell),
                None => {
                    proxy.scale = full;
                    proxy.state = CellState::Active;
                    proxy.translucent = false;
                }
            }
        }
    }

    fn run_pass(&mut self, mode: CascadeMode, los: &dyn LineOfSight) {
        self.last_report = match self.grid.index_of(self.viewer) {
            Some(seed) => Some(run_cascade(
                &mut self.grid,
                &mut self.proxies,
                seed,
                mode,
                &self.cascade,
                los,
            )),
            None => {
                log::warn!("Viewer at {} is off the map, no cascade", self.viewer);
                None
            }
        };
    }

    /// Advance every bound proxy's animation and mirror it into the grid.
    pub fn animate(&mut self, dt: f32) {
        let params = self.animation;
        let collapsed: usize = self
            .proxies
            .par_iter_mut()
            .filter(|p| p.bound_cell.is_some())
            .map(|p| p.animate(dt, &params) as usize)
            .sum();

        for proxy in &self.proxies {
            if let Some(cell) = proxy.bound_cell.and_then(|c| self.grid.cell_mut(c)) {
                proxy.write_back(cell);
            }
        }

        if collapsed > 0 {
            log::trace!("{} cells turned translucent", collapsed);
        }
    }

    /// Whether the cell under `position` is currently revealed.
    ///
    /// Cells without a proxy are never revealed.
    pub fn is_revealed_at(&self, position: Vec3) -> bool {
        self.proxy_at(LogicalGrid::round_coords(position.x, position.z))
            .is_some_and(|p| p.state == CellState::Shrinking)
    }

    /// Check that every binding points back at its owner.
    pub fn verify_bindings(&self) -> FogResult<()> {
        for (index, proxy) in self.proxies.iter().enumerate() {
            if let Some(cell) = proxy.bound_cell {
                if self.grid.cell(cell).and_then(|c| c.bound_proxy) != Some(index) {
                    return Err(FogError::StaleBinding { proxy: index, cell });
                }
            }
        }
        for (cell, entry) in self.grid.cells().iter().enumerate() {
            if let Some(proxy) = entry.bound_proxy {
                if self.proxies.get(proxy).and_then(|p| p.bound_cell) != Some(cell) {
                    return Err(FogError::StaleBinding { proxy, cell });
                }
            }
        }
        Ok(())
    }

    /// Proxy bound to the cell at `coords`.
    pub fn proxy_at(&self, coords: IVec2) -> Option<&Proxy> {
        let index = self.grid.cell_at(coords)?.bound_proxy?;
        self.proxies.get(index)
    }

    /// Logical cell at `coords`.
    pub fn cell_at(&self, coords: IVec2) -> Option<&LogicalCell> {
        self.grid.cell_at(coords)
    }

    pub fn grid(&self) -> &LogicalGrid {
        &self.grid
    }

    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    /// Rounded viewer coordinates the window is centered on.
    pub fn viewer(&self) -> IVec2 {
        self.viewer
    }

    /// Window half extent in cells on each axis.
    pub fn half_extent(&self) -> IVec2 {
        self.half_extent
    }

    pub fn cascade_params(&self) -> &CascadeParams {
        &self.cascade
    }

    /// Report of the most recent cascade pass.
    pub fn last_report(&self) -> Option<&CascadeReport> {
        self.last_report.as_ref()
    }
}
