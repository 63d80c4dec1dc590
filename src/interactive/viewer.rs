//! Interactive fog viewer - keyboard moves the viewer, mouse places walls

use std::time::Instant;

use glam::{IVec2, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::config::FogConfig;
use crate::occlusion::ObstacleField;
use crate::render::{for_each_slot, slot_color};
use crate::window::WindowManager;

/// Configuration for the interactive viewer
#[derive(Clone)]
pub struct ViewerConfig {
    /// Fog settings, including any preset obstacles
    pub fog: FogConfig,
    /// Pixel scale factor (each cell = scale x scale pixels)
    pub scale: usize,
    /// Viewer speed in cells per second
    pub move_speed: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fog: FogConfig::default(),
            scale: 20,
            move_speed: 4.0,
        }
    }
}

/// Interactive viewer for walking through the fog
pub struct InteractiveViewer {
    config: ViewerConfig,
    fog: WindowManager,
    obstacles: ObstacleField,
    viewer_pos: Vec3,
    window: Window,
    buffer: Vec<u32>,
    size: (usize, usize),
}

impl InteractiveViewer {
    /// Create a new interactive viewer with the given configuration
    pub fn new(config: ViewerConfig) -> Result<Self, String> {
        let obstacles = config.fog.obstacle_field();
        let viewer_pos = Vec3::new(
            (config.fog.map_width / 2) as f32,
            0.0,
            (config.fog.map_height / 2) as f32,
        );
        let fog = WindowManager::new(&config.fog, viewer_pos, &obstacles).map_err(|e| e.to_string())?;

        let half = fog.half_extent();
        let size = ((half.x * 2 + 1) as usize, (half.y * 2 + 1) as usize);
        let window_w = size.0 * config.scale;
        let window_h = size.1 * config.scale;

        let window = Window::new(
            "Fog Cascade - Interactive Viewer (ESC to exit)",
            window_w,
            window_h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        Ok(Self {
            config,
            fog,
            obstacles,
            viewer_pos,
            window,
            buffer: vec![0u32; window_w * window_h],
            size,
        })
    }

    /// Run the interactive viewer loop
    pub fn run(&mut self) -> Result<(), String> {
        let scale = self.config.scale;
        self.window.set_target_fps(60);

        println!("=== Interactive Fog Viewer ===");
        println!("Controls:");
        println!("  WASD/Arrows - Move viewer");
        println!("  Left Click  - Toggle wall");
        println!("  R           - Remove all walls");
        println!("  ESC         - Exit");
        println!();

        let mut last_frame = Instant::now();
        let mut last_wall_pos: Option<IVec2> = None;

        while self.window.is_open() && !self.window.is_key_down(Key::Escape) {
            let now = Instant::now();
            let dt = (now - last_frame).as_secs_f32();
            last_frame = now;

            self.move_viewer(dt);

            if self.window.is_key_pressed(Key::R, KeyRepeat::No) {
                self.obstacles.clear();
                self.fog.refresh(&self.obstacles);
                println!("Walls cleared");
            }

            // Toggle once per cell while the button is held
            if self.window.get_mouse_down(MouseButton::Left) {
                if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
                    let half = self.fog.half_extent();
                    let col = (mx as usize / scale).min(self.size.0 - 1) as i32;
                    let row = (my as usize / scale).min(self.size.1 - 1) as i32;
                    let coords = self.fog.viewer() + IVec2::new(col - half.x, half.y - row);
                    if last_wall_pos != Some(coords) && coords != self.fog.viewer() {
                        let placed = self.obstacles.toggle_block(coords);
                        self.fog.refresh(&self.obstacles);
                        log::debug!("Wall at {} {}", coords, if placed { "placed" } else { "removed" });
                        last_wall_pos = Some(coords);
                    }
                }
            } else {
                last_wall_pos = None;
            }

            self.fog.update(&self.viewer_pos, dt, &self.obstacles);
            self.render_fog_to_buffer();

            self.window
                .update_with_buffer(&self.buffer, self.size.0 * scale, self.size.1 * scale)
                .map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// Apply keyboard movement, keeping the viewer on the map
    fn move_viewer(&mut self, dt: f32) {
        let mut dir = Vec3::ZERO;
        if self.window.is_key_down(Key::W) || self.window.is_key_down(Key::Up) {
            dir.z += 1.0;
        }
        if self.window.is_key_down(Key::S) || self.window.is_key_down(Key::Down) {
            dir.z -= 1.0;
        }
        if self.window.is_key_down(Key::A) || self.window.is_key_down(Key::Left) {
            dir.x -= 1.0;
        }
        if self.window.is_key_down(Key::D) || self.window.is_key_down(Key::Right) {
            dir.x += 1.0;
        }
        if dir == Vec3::ZERO {
            return;
        }

        let next = self.viewer_pos + dir.normalize() * self.config.move_speed * dt;
        let max = Vec3::new(
            (self.config.fog.map_width - 1) as f32,
            0.0,
            (self.config.fog.map_height - 1) as f32,
        );
        self.viewer_pos = next.clamp(Vec3::ZERO, max);
    }

    /// Render the proxy window to the pixel buffer
    fn render_fog_to_buffer(&mut self) {
        let scale = self.config.scale;
        let stride = self.size.0 * scale;
        let max_size = self.config.fog.max_size;
        let ray_height = self.config.fog.ray_height;
        let fog = &self.fog;
        let obstacles = &self.obstacles;
        let buffer = &mut self.buffer;

        for_each_slot(fog, |col, row, coords| {
            let blocked = obstacles.blocks_cell(coords, ray_height);
            let (r, g, b) = slot_color(fog.proxy_at(coords), blocked, coords == fog.viewer(), max_size);
            let color_u32 = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;

            // Fill scaled pixels
            for sy in 0..scale {
                let start = (row * scale + sy) * stride + col * scale;
                buffer[start..start + scale].fill(color_u32);
            }
        });
    }
}
