//! Canvas 2D renderer
//!
//! One `draw` call per animation frame, after the update step has fully
//! resolved any round transition, so the HUD never shows stale values.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{Facing, WorldState};

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderer {
    /// Grab the 2D context. Fails (and startup must abort) when the canvas
    /// has no drawing context.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { ctx })
    }

    /// Paint the whole frame from the current world state.
    pub fn draw(&self, state: &WorldState, settings: &Settings) {
        let (vw, vh) = (state.viewport_w as f64, state.viewport_h as f64);
        self.ctx.clear_rect(0.0, 0.0, vw, vh);

        self.draw_stars(state);
        self.draw_ship(state);
        self.draw_rows(state, settings);
        self.draw_projectiles(state);
        if settings.show_hud {
            self.draw_hud(state);
        }
    }

    fn draw_stars(&self, state: &WorldState) {
        self.ctx.set_fill_style_str("white");
        for star in &state.stars {
            self.ctx.begin_path();
            let _ = self.ctx.arc(
                star.pos.x as f64,
                star.pos.y as f64,
                star.radius as f64,
                0.0,
                std::f64::consts::TAU,
            );
            self.ctx.fill();
        }
    }

    /// Vector ship: hull triangle leaning with the facing, livery keyed to
    /// the current level.
    fn draw_ship(&self, state: &WorldState) {
        let p = &state.player;
        let (x, y, w, h) = (
            p.pos.x as f64,
            p.pos.y as f64,
            p.w as f64,
            p.h as f64,
        );
        let lean = match p.facing {
            Facing::Left => -6.0,
            Facing::Right => 6.0,
            Facing::Straight => 0.0,
        };
        let livery = SHIP_LIVERIES[(state.level as usize - 1) % SHIP_LIVERIES.len()];

        // Hull
        self.ctx.set_fill_style_str(livery);
        self.ctx.begin_path();
        self.ctx.move_to(x + w / 2.0 + lean, y); // nose
        self.ctx.line_to(x + w, y + h);
        self.ctx.line_to(x, y + h);
        self.ctx.close_path();
        self.ctx.fill();

        // Thruster block
        self.ctx.set_fill_style_str("#444B55");
        self.ctx
            .fill_rect(x + w * 0.3, y + h - 6.0, w * 0.4, 6.0);

        // Cockpit
        self.ctx.set_fill_style_str("#1B2430");
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            x + w / 2.0 + lean * 0.5,
            y + h * 0.55,
            w * 0.12,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.fill();
    }

    fn draw_rows(&self, state: &WorldState, settings: &Settings) {
        // Font sizes shrink once the row gets crowded
        let crowded = state.bit_width >= 7;
        let label_size = if crowded { 12 } else { 14 };
        let digit_size = if crowded { 18 } else { 24 };

        for label in &state.labels {
            self.ctx.set_fill_style_str(LABEL_COLOR);
            let r = label.rect;
            self.ctx
                .fill_rect(r.x as f64, r.y as f64, r.w as f64, r.h as f64);
            self.text(
                &label.value.to_string(),
                label_size,
                r.center_x() as f64,
                r.center_y() as f64,
                "center",
                TEXT_COLOR,
            );
        }

        for cell in &state.cells {
            let color = if cell.flash && !settings.reduced_flash {
                CELL_FLASH_COLOR
            } else {
                CELL_COLOR
            };
            self.ctx.set_fill_style_str(color);
            let r = cell.rect;
            self.ctx
                .fill_rect(r.x as f64, r.y as f64, r.w as f64, r.h as f64);
            self.text(
                if cell.active { "1" } else { "0" },
                digit_size,
                r.center_x() as f64,
                r.center_y() as f64,
                "center",
                TEXT_COLOR,
            );
        }
    }

    fn draw_projectiles(&self, state: &WorldState) {
        self.ctx.set_fill_style_str(PROJECTILE_COLOR);
        for projectile in &state.projectiles {
            self.ctx.begin_path();
            let _ = self.ctx.arc(
                projectile.pos.x as f64,
                projectile.pos.y as f64,
                projectile.radius as f64,
                0.0,
                std::f64::consts::TAU,
            );
            self.ctx.fill();
        }
    }

    fn draw_hud(&self, state: &WorldState) {
        let (vw, vh) = (state.viewport_w as f64, state.viewport_h as f64);
        self.text(
            &format!("{} - {}", state.current_value(), state.target),
            60,
            vw / 2.0,
            vh / 2.0,
            "center",
            HUD_COLOR,
        );
        self.text(
            &format!("Time: {}", state.seconds_left),
            16,
            5.0,
            vh - 70.0,
            "left",
            HUD_COLOR,
        );
        self.text(
            &format!("Life: {}", state.lives),
            16,
            5.0,
            vh - 40.0,
            "left",
            HUD_COLOR,
        );
        self.text(
            &format!("Level: {}", state.level),
            16,
            5.0,
            vh - 10.0,
            "left",
            HUD_COLOR,
        );
    }

    fn text(&self, content: &str, size: u32, x: f64, y: f64, align: &str, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.set_font(&format!("{size}px Arial"));
        self.ctx.set_text_align(align);
        self.ctx.set_text_baseline("middle");
        let _ = self.ctx.fill_text(content, x, y);
    }
}
