//! World state and core simulation types
//!
//! One mutable [`WorldState`] owns every entity and counter. The update step,
//! collision pass, and round lifecycle all borrow it mutably in turn; the
//! renderer only ever reads it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::Rect;

/// Which way the ship is leaning, derived from held movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    Right,
    #[default]
    Straight,
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Steady state: rounds are running
    Playing,
    /// Session ended; schedules are torn down until the host restarts
    GameOver,
}

/// The player's ship. Never destroyed; wraps at the horizontal edges.
#[derive(Debug, Clone)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub w: f32,
    pub h: f32,
    pub speed: f32,
    pub facing: Facing,
}

impl Player {
    fn new(viewport_w: f32, viewport_h: f32) -> Self {
        Self {
            pos: Vec2::new(
                (viewport_w - PLAYER_W) / 2.0,
                viewport_h - PLAYER_BOTTOM_MARGIN - PLAYER_H,
            ),
            w: PLAYER_W,
            h: PLAYER_H,
            speed: PLAYER_SPEED,
            facing: Facing::Straight,
        }
    }

    /// Horizontal center of the ship (projectile muzzle x)
    pub fn muzzle(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.w / 2.0, self.pos.y)
    }
}

/// One shot in flight. Removed on first cell hit or once fully above the top edge.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
}

/// One toggleable slot in the binary row.
///
/// `id` is world-unique so deferred flash reverts can target this exact cell:
/// after a layout rebuild the old ids are gone and stale reverts fall through
/// harmlessly instead of recoloring whatever now sits at the same index.
#[derive(Debug, Clone)]
pub struct BitCell {
    pub id: u32,
    pub rect: Rect,
    pub active: bool,
    /// Positional value, `2^(width-1-index)`
    pub value: u32,
    /// Showing the transient hit color
    pub flash: bool,
}

/// Read-only decimal label above a bit cell
#[derive(Debug, Clone)]
pub struct LabelCell {
    pub rect: Rect,
    pub value: u32,
}

/// Decorative background star; recycled to the top when it exits the bottom
#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
}

/// Scheduled revert of a cell's hit flash
#[derive(Debug, Clone, Copy)]
pub struct PendingFlash {
    pub cell_id: u32,
    pub due_ms: f64,
}

/// RNG wrapper so the seed stays inspectable
#[derive(Debug, Clone)]
pub struct RngState {
    pub seed: u64,
    rng: Pcg32,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[1, max]`
    pub fn roll(&mut self, max: u32) -> u32 {
        self.rng.random_range(1..=max)
    }

    pub fn unit(&mut self) -> f32 {
        self.rng.random_range(0.0..1.0)
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct WorldState {
    pub viewport_w: f32,
    pub viewport_h: f32,
    pub phase: GamePhase,

    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub cells: Vec<BitCell>,
    pub labels: Vec<LabelCell>,
    pub stars: Vec<Star>,
    pub star_count: usize,
    pub pending_flashes: Vec<PendingFlash>,

    pub score: u32,
    pub level: u32,
    pub lives: u32,
    /// Number of bit cells in play ("potency")
    pub bit_width: u32,
    pub seconds_left: u32,
    pub target: u32,

    pub rng: RngState,
    next_id: u32,
}

impl WorldState {
    pub fn new(seed: u64, viewport_w: f32, viewport_h: f32) -> Self {
        let mut state = Self {
            viewport_w,
            viewport_h,
            phase: GamePhase::Playing,
            player: Player::new(viewport_w, viewport_h),
            projectiles: Vec::new(),
            cells: Vec::new(),
            labels: Vec::new(),
            stars: Vec::new(),
            star_count: STARS_START,
            pending_flashes: Vec::new(),
            score: 0,
            level: 1,
            lives: START_LIVES,
            bit_width: START_BIT_WIDTH,
            seconds_left: ROUND_SECONDS,
            target: 1,
            rng: RngState::new(seed),
            next_id: 1,
        };
        state.roll_target();
        state.rebuild_cells();
        state.spawn_stars();
        state
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Largest value representable at the current bit-width
    pub fn max_value(&self) -> u32 {
        (1u32 << self.bit_width) - 1
    }

    /// Roll a fresh target in `[1, 2^width - 1]`, no adjacency constraint
    pub fn roll_target(&mut self) {
        self.target = self.rng.roll(self.max_value());
    }

    /// Roll a fresh target guaranteed to differ from the current one
    /// (used after a timeout so the player sees a new goal)
    pub fn roll_target_distinct(&mut self) {
        let previous = self.target;
        let max = self.max_value();
        if max <= 1 {
            self.target = 1;
            return;
        }
        loop {
            let rolled = self.rng.roll(max);
            if rolled != previous {
                self.target = rolled;
                break;
            }
        }
    }

    /// Rebuild the bit and label rows for the current viewport and bit-width.
    ///
    /// Idempotent: derives purely from `(viewport_w, bit_width)`. Old cells
    /// (and their ids) are discarded, which orphans any pending flash reverts
    /// for them.
    pub fn rebuild_cells(&mut self) {
        let columns = column_widths(self.viewport_w as u32, self.bit_width);

        self.cells.clear();
        self.labels.clear();
        let mut x = 0.0f32;
        for (i, w) in columns.iter().enumerate() {
            let w = *w as f32;
            let value = 1u32 << (self.bit_width - 1 - i as u32);
            self.labels.push(LabelCell {
                rect: Rect::new(x, LABEL_ROW_Y, w, LABEL_ROW_H),
                value,
            });
            let id = self.next_entity_id();
            self.cells.push(BitCell {
                id,
                rect: Rect::new(x, CELL_ROW_Y, w, CELL_ROW_H),
                active: false,
                value,
                flash: false,
            });
            x += w;
        }
    }

    /// Clear all active flags (start of a round)
    pub fn clear_active(&mut self) {
        for cell in &mut self.cells {
            cell.active = false;
        }
    }

    /// Decimal value of the currently active bits
    pub fn current_value(&self) -> u32 {
        self.cells
            .iter()
            .filter(|c| c.active)
            .map(|c| c.value)
            .sum()
    }

    /// Active bit pattern, MSB first
    pub fn bit_string(&self) -> String {
        self.cells
            .iter()
            .map(|c| if c.active { '1' } else { '0' })
            .collect()
    }

    /// Append one projectile at the ship's muzzle
    pub fn spawn_projectile(&mut self) {
        self.projectiles.push(Projectile {
            pos: self.player.muzzle(),
            radius: PROJECTILE_RADIUS,
            speed: PROJECTILE_SPEED,
        });
    }

    /// Regenerate the starfield at the current star count
    pub fn spawn_stars(&mut self) {
        let (vw, vh) = (self.viewport_w, self.viewport_h);
        self.stars.clear();
        for _ in 0..self.star_count {
            let star = Star {
                pos: Vec2::new(self.rng.unit() * vw, self.rng.unit() * vh),
                radius: self.rng.unit() * 2.0 + 1.0,
                speed: self.rng.unit() * 2.0 + 1.0,
            };
            self.stars.push(star);
        }
    }

    /// Re-enter Playing after a game over. State was already reset by the
    /// game-over transition; the host calls this when it restarts the
    /// schedules.
    pub fn resume(&mut self) {
        self.phase = GamePhase::Playing;
    }

    /// Apply a viewport resize.
    ///
    /// Only geometry moves: cell widths are recomputed in place so active
    /// flags, ids, and pending flashes survive, and the ship is re-anchored
    /// to the bottom edge.
    pub fn resize(&mut self, viewport_w: f32, viewport_h: f32) {
        self.viewport_w = viewport_w;
        self.viewport_h = viewport_h;
        self.player.pos.y = viewport_h - PLAYER_BOTTOM_MARGIN - PLAYER_H;
        self.player.pos.x = self.player.pos.x.min(viewport_w);

        let columns = column_widths(viewport_w as u32, self.bit_width);
        let mut x = 0.0f32;
        for (i, w) in columns.iter().enumerate() {
            let w = *w as f32;
            self.labels[i].rect = Rect::new(x, LABEL_ROW_Y, w, LABEL_ROW_H);
            let cell = &mut self.cells[i];
            cell.rect = Rect::new(x, CELL_ROW_Y, w, CELL_ROW_H);
            x += w;
        }
    }
}

/// Partition `viewport_w` into `n` integer column widths.
///
/// Every column gets `viewport_w / n`; the last column absorbs the whole
/// integer-division remainder so the row covers the viewport exactly.
pub fn column_widths(viewport_w: u32, n: u32) -> Vec<u32> {
    debug_assert!(n >= 1);
    let base = viewport_w / n;
    let remainder = viewport_w - base * n;
    let mut widths = vec![base; n as usize];
    if let Some(last) = widths.last_mut() {
        *last += remainder;
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world(width: u32) -> WorldState {
        let mut w = WorldState::new(7, 800.0, 600.0);
        w.bit_width = width;
        w.rebuild_cells();
        w
    }

    #[test]
    fn columns_partition_exactly() {
        for vw in [90u32, 800, 1024, 1366, 1919] {
            for n in 1..=9u32 {
                let widths = column_widths(vw, n);
                assert_eq!(widths.len(), n as usize);
                assert_eq!(widths.iter().sum::<u32>(), vw, "vw={vw} n={n}");
            }
        }
    }

    #[test]
    fn remainder_lands_in_last_column() {
        // 1000 / 3 = 333 rem 1
        let widths = column_widths(1000, 3);
        assert_eq!(widths, vec![333, 333, 334]);
    }

    proptest! {
        #[test]
        fn columns_partition_any_viewport(vw in 9u32..4000, n in 1u32..=9) {
            let widths = column_widths(vw, n);
            prop_assert_eq!(widths.iter().sum::<u32>(), vw);
            // Remainder goes entirely to the last column
            let base = vw / n;
            for w in &widths[..widths.len() - 1] {
                prop_assert_eq!(*w, base);
            }
        }

        #[test]
        fn value_roundtrip(width in 3u32..=9, pattern in 0u32..512) {
            let mut w = world(width);
            let pattern = pattern & w.max_value();
            for (i, cell) in w.cells.iter_mut().enumerate() {
                cell.active = pattern & (1 << (width - 1 - i as u32)) != 0;
            }
            prop_assert_eq!(w.current_value(), pattern);
        }
    }

    #[test]
    fn active_bits_sum_to_decimal_value() {
        // width=3, bits [1,0,1] -> 5
        let mut w = world(3);
        w.cells[0].active = true;
        w.cells[2].active = true;
        assert_eq!(w.current_value(), 5);
        assert_eq!(w.bit_string(), "101");
    }

    #[test]
    fn cell_values_descend_by_powers_of_two() {
        let w = world(4);
        let values: Vec<u32> = w.cells.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![8, 4, 2, 1]);
        let labels: Vec<u32> = w.labels.iter().map(|l| l.value).collect();
        assert_eq!(labels, values);
    }

    #[test]
    fn target_always_in_range() {
        for seed in 0..50u64 {
            let mut w = WorldState::new(seed, 800.0, 600.0);
            for width in 3..=9 {
                w.bit_width = width;
                for _ in 0..20 {
                    w.roll_target();
                    assert!(w.target >= 1 && w.target <= w.max_value());
                }
            }
        }
    }

    #[test]
    fn distinct_roll_never_repeats_previous() {
        let mut w = WorldState::new(3, 800.0, 600.0);
        for _ in 0..200 {
            let previous = w.target;
            w.roll_target_distinct();
            assert_ne!(w.target, previous);
            assert!(w.target >= 1 && w.target <= w.max_value());
        }
    }

    #[test]
    fn rebuild_discards_old_cell_ids() {
        let mut w = world(3);
        let old_ids: Vec<u32> = w.cells.iter().map(|c| c.id).collect();
        w.rebuild_cells();
        for cell in &w.cells {
            assert!(!old_ids.contains(&cell.id));
        }
    }

    #[test]
    fn resize_preserves_active_flags() {
        let mut w = world(3);
        w.cells[1].active = true;
        w.resize(1200.0, 700.0);
        assert!(w.cells[1].active);
        let total: f32 = w.cells.iter().map(|c| c.rect.w).sum();
        assert_eq!(total, 1200.0);
        assert_eq!(w.player.pos.y, 700.0 - 10.0 - 40.0);
    }
}
