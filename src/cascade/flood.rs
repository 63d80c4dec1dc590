//! Worklist implementation of a cascade pass.
//!
//! Pending cells are kept in a FIFO queue of `(cell, direction, steps)` so the
//! first visit to any cell is along one of its shortest branches. The visited
//! marker lives on the proxy and is tested-and-set when an entry is popped.

use std::collections::VecDeque;

use rayon::prelude::*;

use super::{CascadeMode, CascadeParams, LineOfSight};
use crate::grid::{CellState, Direction, LogicalGrid};
use crate::proxy::Proxy;

/// What happened to a cell visited during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Validated and visible: shrinking, branch continues.
    Revealed,
    /// Validated but occluded: growing, branch ends.
    Occluded,
    /// Failed the step or distance bound.
    OutOfRange,
    /// Skipped by an incremental pass because it was never in range.
    NotInRange,
}

/// One visited cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeVisit {
    pub cell: usize,
    pub direction: Direction,
    pub steps: u32,
    /// Cell this one was reached from.
    pub parent: usize,
    pub outcome: VisitOutcome,
}

/// Summary of a finished pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub mode: CascadeMode,
    /// Seed cell, or `None` if the pass could not start.
    pub seed: Option<usize>,
    pub visits: Vec<CascadeVisit>,
}

impl CascadeReport {
    fn empty(mode: CascadeMode) -> Self {
        CascadeReport {
            mode,
            seed: None,
            visits: Vec::new(),
        }
    }

    pub fn count(&self, outcome: VisitOutcome) -> usize {
        self.visits.iter().filter(|v| v.outcome == outcome).count()
    }

    pub fn revealed(&self) -> usize {
        self.count(VisitOutcome::Revealed)
    }

    pub fn occluded(&self) -> usize {
        self.count(VisitOutcome::Occluded)
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    cell: usize,
    direction: Direction,
    steps: u32,
    parent: usize,
}

/// Run one pass seeded at `seed`.
///
/// Only cells bound to a proxy take part; everything else counts as absent.
/// The pass runs to completion before returning.
pub fn run_cascade(
    grid: &mut LogicalGrid,
    proxies: &mut [Proxy],
    seed: usize,
    mode: CascadeMode,
    params: &CascadeParams,
    los: &dyn LineOfSight,
) -> CascadeReport {
    // Bulk reset before the first visit of this pass.
    proxies.par_iter_mut().for_each(|p| p.checked = false);

    let (Some(seed_coords), Some(seed_proxy)) = (
        grid.coordinates_of(seed),
        grid.cell(seed).and_then(|c| c.bound_proxy),
    ) else {
        log::warn!("Cascade seed {} has no bound proxy, skipping pass", seed);
        return CascadeReport::empty(mode);
    };
    let viewer = seed_coords.as_vec2();
    let viewer = glam::Vec3::new(viewer.x, params.ray_height, viewer.y);

    {
        let proxy = &mut proxies[seed_proxy];
        proxy.checked = true;
        proxy.in_vision_range = true;
        if let Some(cell) = grid.cell_mut(seed) {
            if mode == CascadeMode::Initial || proxy.state != CellState::Shrinking {
                proxy.enter_shrinking(cell);
            }
        }
    }

    let mut report = CascadeReport {
        mode,
        seed: Some(seed),
        visits: Vec::new(),
    };
    let mut queue: VecDeque<Pending> = Direction::ALL
        .iter()
        .filter_map(|&direction| {
            grid.neighbor_of(seed, direction).map(|cell| Pending {
                cell,
                direction,
                steps: 1,
                parent: seed,
            })
        })
        .collect();

    while let Some(pending) = queue.pop_front() {
        let Some(p) = grid.cell(pending.cell).and_then(|c| c.bound_proxy) else {
            continue;
        };
        if proxies[p].checked {
            continue;
        }
        proxies[p].checked = true;

        let outcome = visit(grid, &mut proxies[p], &pending, seed_coords, viewer, mode, params, los);
        log::trace!(
            "cascade {:?} cell {} via {:?} step {}: {:?}",
            mode,
            pending.cell,
            pending.direction,
            pending.steps,
            outcome
        );

        if outcome == VisitOutcome::Revealed {
            for next in pending.direction.fan_out() {
                if let Some(cell) = grid.neighbor_of(pending.cell, next) {
                    queue.push_back(Pending {
                        cell,
                        direction: pending.direction,
                        steps: pending.steps + 1,
                        parent: pending.cell,
                    });
                }
            }
        }

        report.visits.push(CascadeVisit {
            cell: pending.cell,
            direction: pending.direction,
            steps: pending.steps,
            parent: pending.parent,
            outcome,
        });
    }

    log::debug!(
        "{:?} cascade from cell {}: {} visited, {} revealed, {} occluded",
        mode,
        seed,
        report.visits.len(),
        report.revealed(),
        report.occluded()
    );
    report
}

#[allow(clippy::too_many_arguments)]
fn visit(
    grid: &mut LogicalGrid,
    proxy: &mut Proxy,
    pending: &Pending,
    seed_coords: glam::IVec2,
    viewer: glam::Vec3,
    mode: CascadeMode,
    params: &CascadeParams,
    los: &dyn LineOfSight,
) -> VisitOutcome {
    if mode == CascadeMode::Incremental && !proxy.in_vision_range {
        return VisitOutcome::NotInRange;
    }

    let (Some(coords), Some(position)) = (
        grid.coordinates_of(pending.cell),
        grid.world_position(pending.cell, params.ray_height),
    ) else {
        return VisitOutcome::OutOfRange;
    };
    if !params.validate(pending.direction, coords - seed_coords, pending.steps) {
        return VisitOutcome::OutOfRange;
    }
    proxy.in_vision_range = true;

    let Some(cell) = grid.cell_mut(pending.cell) else {
        return VisitOutcome::OutOfRange;
    };
    if los.has_line_of_sight(position, viewer, params.obstacle_mask) {
        proxy.enter_shrinking(cell);
        VisitOutcome::Revealed
    } else {
        proxy.enter_growing(cell);
        VisitOutcome::Occluded
    }
}
