//! Rendering helpers for turning the proxy window into text or pixels

use std::fs::File;
use std::io::{self, Write};

use glam::IVec2;

use crate::grid::CellState;
use crate::occlusion::ObstacleField;
use crate::proxy::Proxy;
use crate::window::WindowManager;

const GROUND: (f32, f32, f32) = (0.27, 0.43, 0.24);
const WALL: (f32, f32, f32) = (0.25, 0.25, 0.25);
const FOG: (f32, f32, f32) = (0.86, 0.86, 0.9);
/// Fog over cells that were revealed at some point.
const EXPLORED_FOG: (f32, f32, f32) = (0.55, 0.57, 0.65);
const VIEWER: (u8, u8, u8) = (220, 40, 40);

/// Convert a float value (0.0-1.0) to a byte (0-255)
#[inline]
pub fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Color of one window slot.
///
/// Fog coverage follows the proxy's scale: a fully grown proxy shows only
/// fog, a collapsed one shows the ground (or wall) underneath.
pub fn slot_color(proxy: Option<&Proxy>, blocked: bool, is_viewer: bool, max_size: f32) -> (u8, u8, u8) {
    if is_viewer {
        return VIEWER;
    }
    let Some(proxy) = proxy else {
        return (0, 0, 0);
    };

    let base = if blocked { WALL } else { GROUND };
    let fog = if proxy.translucent { EXPLORED_FOG } else { FOG };
    let t = (proxy.scale.x / max_size).clamp(0.0, 1.0);
    let mix = |a: f32, b: f32| to_byte(a + (b - a) * t);
    (mix(base.0, fog.0), mix(base.1, fog.1), mix(base.2, fog.2))
}

/// Visit every window slot in display order: north row first, west to east.
///
/// The callback receives the display column and row and the cell coordinates.
pub fn for_each_slot(fog: &WindowManager, mut f: impl FnMut(usize, usize, IVec2)) {
    let half = fog.half_extent();
    let viewer = fog.viewer();
    for (row, dz) in (-half.y..=half.y).rev().enumerate() {
        for (col, dx) in (-half.x..=half.x).enumerate() {
            f(col, row, viewer + IVec2::new(dx, dz));
        }
    }
}

/// Converts the proxy window to a character map for debugging.
///
/// `@` viewer, `.` revealed and collapsed, `:` revealed and shrinking,
/// `+` growing, `#` fog, `%` fog over explored ground, `X` obstacle in
/// revealed space, blank for slots off the map.
pub fn fog_to_string(fog: &WindowManager, obstacles: Option<&ObstacleField>) -> String {
    let width = (fog.half_extent().x * 2 + 1) as usize;
    let ray_height = fog.cascade_params().ray_height;
    let mut result = String::new();

    for_each_slot(fog, |col, _row, coords| {
        let ch = if coords == fog.viewer() {
            '@'
        } else {
            match fog.proxy_at(coords) {
                None => ' ',
                Some(p) => match p.state {
                    CellState::Shrinking if obstacles.is_some_and(|o| o.blocks_cell(coords, ray_height)) => 'X',
                    CellState::Shrinking if p.scale.x <= 0.0 => '.',
                    CellState::Shrinking => ':',
                    CellState::Growing => '+',
                    CellState::Active if p.translucent => '%',
                    CellState::Active => '#',
                },
            }
        };
        result.push(ch);
        if col + 1 == width {
            result.push('\n');
        }
    });
    result
}

/// Save the proxy window to a PPM file, optionally showing obstacles
pub fn save_ppm(
    fog: &WindowManager,
    obstacles: Option<&ObstacleField>,
    max_size: f32,
    filename: &str,
    scale: usize,
) -> io::Result<()> {
    let half = fog.half_extent();
    let width = (half.x * 2 + 1) as usize;
    let height = (half.y * 2 + 1) as usize;
    let ray_height = fog.cascade_params().ray_height;

    let mut pixels = vec![(0u8, 0u8, 0u8); width * height];
    for_each_slot(fog, |col, row, coords| {
        let blocked = obstacles.is_some_and(|o| o.blocks_cell(coords, ray_height));
        pixels[row * width + col] = slot_color(fog.proxy_at(coords), blocked, coords == fog.viewer(), max_size);
    });

    let img_width = width * scale;
    let img_height = height * scale;

    let mut file = File::create(filename)?;
    writeln!(file, "P3")?;
    writeln!(file, "{} {}", img_width, img_height)?;
    writeln!(file, "255")?;

    for img_y in 0..img_height {
        for img_x in 0..img_width {
            let (r, g, b) = pixels[(img_y / scale) * width + img_x / scale];
            write!(file, "{} {} {} ", r, g, b)?;
        }
        writeln!(file)?;
    }

    log::info!("Wrote {}x{} snapshot to {}", img_width, img_height, filename);
    Ok(())
}
