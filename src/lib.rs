//! Bitfire - flip binary digits by shooting them
//!
//! Core modules:
//! - `sim`: Platform-free simulation (input, physics, collisions, round lifecycle)
//! - `renderer`: Canvas 2D rendering pass (pure read of world state)
//! - `platform`: Browser scheduling (animation frames, countdown interval)
//! - `audio`: Procedural Web Audio cues
//! - `settings` / `highscores`: LocalStorage-backed preferences and leaderboard

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
#[cfg(target_arch = "wasm32")]
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Per-round countdown budget (seconds)
    pub const ROUND_SECONDS: u32 = 11;
    /// Countdown value at which the alarm cue fires
    pub const ALARM_SECONDS: u32 = 3;

    /// Minimum interval between accepted fire inputs (ms, monotonic clock)
    pub const FIRE_COOLDOWN_MS: f64 = 25.0;
    /// How long a hit cell shows its flash color (ms)
    pub const HIT_FLASH_MS: f64 = 25.0;

    /// Player ship
    pub const PLAYER_W: f32 = 40.0;
    pub const PLAYER_H: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 10.0;
    /// Ship baseline sits this far above the bottom edge
    pub const PLAYER_BOTTOM_MARGIN: f32 = 10.0;

    /// Projectiles
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    pub const PROJECTILE_SPEED: f32 = 25.0;

    /// Bit-width (number of cells) progression
    pub const START_BIT_WIDTH: u32 = 3;
    pub const MAX_BIT_WIDTH: u32 = 9;
    /// Level-up every this many points
    pub const LEVEL_UP_EVERY: u32 = 5;

    pub const START_LIVES: u32 = 3;

    /// Decorative starfield
    pub const STARS_START: usize = 25;
    pub const STARS_INCREASE: usize = 15;

    /// Row geometry: decimal labels on top, bit cells below
    pub const LABEL_ROW_Y: f32 = 0.0;
    pub const LABEL_ROW_H: f32 = 20.0;
    pub const CELL_ROW_Y: f32 = 20.0;
    pub const CELL_ROW_H: f32 = 50.0;

    /// Palette
    pub const LABEL_COLOR: &str = "#2E5A88";
    pub const CELL_COLOR: &str = "#3D7A5B";
    pub const CELL_FLASH_COLOR: &str = "#F1E0A3";
    pub const PROJECTILE_COLOR: &str = "#E8734A";
    pub const TEXT_COLOR: &str = "#EEEEEE";
    pub const HUD_COLOR: &str = "#FFFFFF";
    /// Ship hull accents, cycled by level
    pub const SHIP_LIVERIES: [&str; 5] = ["#9AD1EA", "#EAC59A", "#C79AEA", "#9AEAB4", "#EA9A9A"];
}

/// Axis-aligned rectangle, the geometry shared by cells and the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }
}
