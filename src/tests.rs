//! Scenario tests for the fog of war

use std::collections::HashSet;

use glam::{IVec2, Vec3};

use crate::{
    CascadeMode, CellState, FogConfig, LineOfSight, Obstacle, ObstacleField, VisitOutcome, WindowManager,
};

const VIEWER: IVec2 = IVec2::new(100, 100);

fn viewer_pos(c: IVec2) -> Vec3 {
    Vec3::new(c.x as f32, 0.0, c.y as f32)
}

fn cell_pos(c: IVec2) -> Vec3 {
    Vec3::new(c.x as f32, 0.5, c.y as f32)
}

fn in_diamond(offset: IVec2, max_distance: i32, max_steps: i32) -> bool {
    offset.x.abs() <= max_distance
        && offset.y.abs() <= max_distance
        && offset.x.abs() + offset.y.abs() <= max_steps
}

/// Thin wall across the sight line between `(100, 101)` and `(100, 102)`.
fn wall_north_of_viewer() -> ObstacleField {
    ObstacleField::with_obstacles(vec![Obstacle::new(
        Vec3::new(99.8, 0.0, 101.4),
        Vec3::new(100.2, 2.0, 101.6),
    )])
}

/// Every shrinking proxy must have a clear line to the viewer.
fn assert_revealed_cells_visible(fog: &WindowManager, los: &ObstacleField) {
    let eye = cell_pos(fog.viewer());
    for proxy in fog.proxies() {
        let Some(cell) = proxy.bound_cell else { continue };
        if proxy.state != CellState::Shrinking {
            continue;
        }
        let coords = fog.grid().coordinates_of(cell).unwrap();
        assert!(
            los.has_line_of_sight(cell_pos(coords), eye, fog.cascade_params().obstacle_mask),
            "cell {} is revealed without line of sight",
            coords
        );
    }
}

#[test]
fn test_main() {
    crate::main();
}

#[test]
fn test_open_field_reveals_diamond() {
    let config = FogConfig::default();
    let los = ObstacleField::new();
    let fog = WindowManager::new(&config, viewer_pos(VIEWER), &los).unwrap();

    let report = fog.last_report().unwrap();
    assert_eq!(report.mode, CascadeMode::Initial);
    assert_eq!(report.occluded(), 0);

    let mut revealed = 0;
    for proxy in fog.proxies() {
        let offset = proxy.slot();
        if in_diamond(offset, config.max_distance, config.max_steps as i32) {
            assert_eq!(proxy.state, CellState::Shrinking, "slot {} should be revealed", offset);
            assert!(proxy.in_vision_range, "slot {} should be in range", offset);
            revealed += 1;
        } else {
            assert_eq!(proxy.state, CellState::Active, "slot {} should stay fogged", offset);
            assert!(!proxy.in_vision_range, "slot {} should be out of range", offset);
        }
    }
    println!("Revealed {} cells", revealed);

    // Cells and proxies agree.
    for proxy in fog.proxies() {
        let cell = fog.grid().cell(proxy.bound_cell.unwrap()).unwrap();
        assert_eq!(cell.state, proxy.state);
    }
}

#[test]
fn test_obstacle_ends_branch() {
    let los = wall_north_of_viewer();
    let fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();

    let one_hop = fog.proxy_at(VIEWER + IVec2::new(0, 1)).unwrap();
    let two_hops = fog.proxy_at(VIEWER + IVec2::new(0, 2)).unwrap();
    assert_eq!(one_hop.state, CellState::Shrinking);
    assert_eq!(two_hops.state, CellState::Growing);

    for dz in 3..=8 {
        let behind = fog.proxy_at(VIEWER + IVec2::new(0, dz)).unwrap();
        assert_ne!(behind.state, CellState::Shrinking, "cell {} behind the wall is revealed", dz);
    }

    // Side cells with a clear view are unaffected.
    assert_eq!(fog.proxy_at(VIEWER + IVec2::new(-1, 2)).unwrap().state, CellState::Shrinking);
    assert_revealed_cells_visible(&fog, &los);
}

#[test]
fn test_wall_cells_are_seen_from_outside() {
    let mut los = ObstacleField::new();
    los.toggle_block(VIEWER + IVec2::new(0, 1));
    let fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();

    // The wall face itself is visible, the cell behind it is not.
    assert_eq!(fog.proxy_at(VIEWER + IVec2::new(0, 1)).unwrap().state, CellState::Shrinking);
    assert_eq!(fog.proxy_at(VIEWER + IVec2::new(0, 2)).unwrap().state, CellState::Growing);
    assert!(fog.is_revealed_at(Vec3::new(100.0, 0.0, 101.0)));
}

#[test]
fn test_occluded_cells_have_no_descendants() {
    let los = ObstacleField::with_obstacles(vec![
        Obstacle::block(VIEWER + IVec2::new(2, 1)),
        Obstacle::block(VIEWER + IVec2::new(-3, -2)),
        Obstacle::new(Vec3::new(95.0, 0.0, 104.4), Vec3::new(101.0, 2.0, 104.6)),
    ]);
    let fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();
    let report = fog.last_report().unwrap();
    assert!(report.occluded() > 0);

    let occluded: HashSet<usize> = report
        .visits
        .iter()
        .filter(|v| v.outcome == VisitOutcome::Occluded)
        .map(|v| v.cell)
        .collect();
    for visit in &report.visits {
        assert!(
            !occluded.contains(&visit.parent),
            "cell {} was reached through occluded cell {}",
            visit.cell,
            visit.parent
        );
    }
    assert_revealed_cells_visible(&fog, &los);
}

#[test]
fn test_each_cell_visited_once_per_pass() {
    let los = wall_north_of_viewer();
    let mut fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();

    for step in [IVec2::new(1, 0), IVec2::new(1, 1), IVec2::new(0, 3)] {
        let target = fog.viewer() + step;
        assert!(fog.on_viewer_moved(target.x as f32, target.y as f32, &los));

        let report = fog.last_report().unwrap();
        let unique: HashSet<usize> = report.visits.iter().map(|v| v.cell).collect();
        assert_eq!(unique.len(), report.visits.len(), "a cell was visited twice");

        // Every visit plus the seed flipped exactly one marker.
        let checked = fog.proxies().iter().filter(|p| p.checked).count();
        assert_eq!(checked, report.visits.len() + 1);
    }
}

#[test]
fn test_validated_cells_respect_bounds() {
    let config = FogConfig {
        max_steps: 10,
        max_distance: 6,
        ..FogConfig::default()
    };
    let los = ObstacleField::with_obstacles(vec![
        Obstacle::block(VIEWER + IVec2::new(1, 3)),
        Obstacle::block(VIEWER + IVec2::new(-4, 0)),
    ]);
    let fog = WindowManager::new(&config, viewer_pos(VIEWER), &los).unwrap();
    let report = fog.last_report().unwrap();
    let params = config.cascade();

    for visit in &report.visits {
        if !matches!(visit.outcome, VisitOutcome::Revealed | VisitOutcome::Occluded) {
            continue;
        }
        let offset = fog.grid().coordinates_of(visit.cell).unwrap() - VIEWER;
        assert!(visit.steps <= config.max_steps);
        assert!(offset.x.abs() <= config.max_distance && offset.y.abs() <= config.max_distance);
        assert!(params.validate(visit.direction, offset, visit.steps));
    }
}

#[test]
fn test_animation_settles_into_grid() {
    let config = FogConfig {
        scale_speed: 2.0,
        ..FogConfig::default()
    };
    let los = ObstacleField::new();
    let mut fog = WindowManager::new(&config, viewer_pos(VIEWER), &los).unwrap();

    // 0.25 per tick: four ticks to collapse.
    for _ in 0..4 {
        fog.update(&viewer_pos(VIEWER), 0.125, &los);
    }

    for proxy in fog.proxies() {
        let cell = fog.grid().cell(proxy.bound_cell.unwrap()).unwrap();
        if proxy.state == CellState::Shrinking {
            assert_eq!(proxy.scale, Vec3::ZERO);
            assert!(proxy.translucent);
            assert_eq!(cell.target_scale, Vec3::ZERO);
            assert!(cell.translucent);
        } else {
            assert_eq!(cell.target_scale, Vec3::ONE);
            assert!(!cell.translucent);
        }
    }
}

#[test]
fn test_move_north_resets_vacated_cells() {
    let config = FogConfig {
        map_width: 30,
        map_height: 30,
        window_width: 5,
        window_height: 5,
        ..FogConfig::default()
    };
    let los = ObstacleField::new();
    let start = IVec2::new(10, 10);
    let mut fog = WindowManager::new(&config, viewer_pos(start), &los).unwrap();
    for _ in 0..10 {
        fog.animate(0.1);
    }

    let bottom_row: Vec<IVec2> = (8..=12).map(|x| IVec2::new(x, 8)).collect();
    for &c in &bottom_row {
        let cell = fog.cell_at(c).unwrap();
        assert_eq!(cell.state, CellState::Shrinking);
        assert_eq!(cell.target_scale, Vec3::ZERO);
    }

    assert!(fog.on_viewer_moved(10.0, 11.0, &los));
    fog.verify_bindings().unwrap();

    for &c in &bottom_row {
        let cell = fog.cell_at(c).unwrap();
        assert_eq!(cell.target_scale, Vec3::ONE, "vacated cell {} kept its scale", c);
        assert_eq!(cell.state, CellState::Growing);
        assert!(cell.bound_proxy.is_none());
        assert!(cell.translucent, "explored marker survives leaving the window");
    }

    // The new top row is bound and revealed by the incremental pass.
    for x in 8..=12 {
        let proxy = fog.proxy_at(IVec2::new(x, 13)).unwrap();
        assert_eq!(proxy.state, CellState::Shrinking);
        assert_eq!(proxy.scale, Vec3::ONE);
    }
    // Retained cells carry their collapsed scale over.
    assert_eq!(fog.proxy_at(IVec2::new(10, 9)).unwrap().scale, Vec3::ZERO);
}

#[test]
fn test_bindings_stay_bijective() {
    let config = FogConfig {
        map_width: 60,
        map_height: 40,
        ..FogConfig::default()
    };
    let los = ObstacleField::new();
    let mut fog = WindowManager::new(&config, Vec3::new(30.0, 0.0, 20.0), &los).unwrap();
    fog.verify_bindings().unwrap();

    let path = [(31.2, 20.0), (35.0, 24.6), (2.0, 1.0), (58.9, 39.4), (30.0, 20.0), (-3.0, 20.0)];
    for (x, z) in path {
        fog.on_viewer_moved(x, z, &los);
        fog.animate(0.016);
        fog.verify_bindings().unwrap();
        let bound = fog.grid().cells().iter().filter(|c| c.bound_proxy.is_some()).count();
        let proxies = fog.proxies().iter().filter(|p| p.bound_cell.is_some()).count();
        assert_eq!(bound, proxies);
    }
}

#[test]
fn test_incremental_pass_keeps_bounded_horizon() {
    // A wall of blocks across the north side hides everything beyond it at startup.
    let mut wall = ObstacleField::new();
    for x in 90..=110 {
        wall.toggle_block(IVec2::new(x, 101));
    }
    let mut fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &wall).unwrap();
    assert!(!fog.proxy_at(VIEWER + IVec2::new(0, 3)).unwrap().in_vision_range);

    // The wall disappears and the viewer steps east. Slots never reached
    // before are not explored by the incremental pass.
    let open = ObstacleField::new();
    assert!(fog.on_viewer_moved(101.0, 100.0, &open));
    let report = fog.last_report().unwrap();
    assert_eq!(report.mode, CascadeMode::Incremental);
    assert!(report.count(VisitOutcome::NotInRange) > 0);

    let viewer = fog.viewer();
    let far = fog.proxy_at(viewer + IVec2::new(0, 3)).unwrap();
    assert_ne!(far.state, CellState::Shrinking);
    assert!(!far.in_vision_range);

    // Slots already known to be in range are re-tested and revealed.
    assert_eq!(fog.proxy_at(viewer + IVec2::new(0, 1)).unwrap().state, CellState::Shrinking);
    assert_eq!(fog.proxy_at(viewer + IVec2::new(-3, -2)).unwrap().state, CellState::Shrinking);
}

#[test]
fn test_refresh_hides_cells_behind_new_wall() {
    let mut los = ObstacleField::new();
    let mut fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();
    assert_eq!(fog.proxy_at(VIEWER + IVec2::new(0, 4)).unwrap().state, CellState::Shrinking);

    los.push(Obstacle::new(Vec3::new(99.8, 0.0, 101.4), Vec3::new(100.2, 2.0, 101.6)));
    fog.refresh(&los);

    assert_eq!(fog.proxy_at(VIEWER + IVec2::new(0, 1)).unwrap().state, CellState::Shrinking);
    for dz in 2..=8 {
        assert_ne!(fog.proxy_at(VIEWER + IVec2::new(0, dz)).unwrap().state, CellState::Shrinking);
    }
    assert_revealed_cells_visible(&fog, &los);
}

#[test]
fn test_is_revealed_at() {
    let los = wall_north_of_viewer();
    let fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();

    assert!(fog.is_revealed_at(Vec3::new(100.2, 3.0, 99.8)));
    assert!(fog.is_revealed_at(Vec3::new(100.4, 0.0, 100.6)));
    assert!(!fog.is_revealed_at(Vec3::new(100.0, 0.0, 102.0)));
    // Outside the vision bounds but inside the window.
    assert!(!fog.is_revealed_at(Vec3::new(115.0, 0.0, 100.0)));
    // Off the window and off the map.
    assert!(!fog.is_revealed_at(Vec3::new(10.0, 0.0, 10.0)));
    assert!(!fog.is_revealed_at(Vec3::new(-50.0, 0.0, 10.0)));
}

#[test]
fn test_walking_viewer_keeps_vision_consistent() {
    let los = ObstacleField::with_obstacles(vec![
        Obstacle::block(IVec2::new(104, 103)),
        Obstacle::block(IVec2::new(98, 97)),
        Obstacle::new(Vec3::new(102.0, 0.0, 90.0), Vec3::new(102.4, 2.0, 99.0)),
    ]);
    let mut fog = WindowManager::new(&FogConfig::default(), viewer_pos(VIEWER), &los).unwrap();

    let mut pos = viewer_pos(VIEWER);
    for frame in 0..240 {
        let heading = match frame / 60 {
            0 => Vec3::X,
            1 => Vec3::Z,
            2 => -Vec3::X,
            _ => -Vec3::Z,
        };
        pos += heading * 0.1;
        fog.update(&pos, 1.0 / 60.0, &los);

        let seed = fog.proxy_at(fog.viewer()).unwrap();
        assert_eq!(seed.state, CellState::Shrinking, "viewer cell fogged at frame {}", frame);
        assert_revealed_cells_visible(&fog, &los);
    }
    fog.verify_bindings().unwrap();
}
