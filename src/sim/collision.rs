//! Projectile-vs-cell collision pass
//!
//! Cells are tested in index order (left to right) and the first overlap
//! wins: the cell toggles, flashes, and the projectile is consumed. A
//! projectile that hits nothing survives to the next frame.

use glam::Vec2;

use super::events::{Cue, EventSink};
use super::state::{PendingFlash, WorldState};
use crate::consts::HIT_FLASH_MS;
use crate::Rect;

/// Inclusive circle-vs-AABB overlap test.
///
/// Touching counts: a projectile whose rim exactly meets a cell edge is a
/// hit.
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    center.x + radius >= rect.x
        && center.x - radius <= rect.x + rect.w
        && center.y + radius >= rect.y
        && center.y - radius <= rect.y + rect.h
}

/// Run the collision pass for every surviving projectile.
///
/// `now_ms` is the frame clock, used to schedule the flash revert for each
/// hit cell.
pub fn process_collisions(state: &mut WorldState, sink: &mut dyn EventSink, now_ms: f64) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    projectiles.retain(|projectile| {
        let hit = state
            .cells
            .iter_mut()
            .find(|cell| circle_rect_overlap(projectile.pos, projectile.radius, &cell.rect));
        match hit {
            Some(cell) => {
                cell.active = !cell.active;
                cell.flash = true;
                state.pending_flashes.push(PendingFlash {
                    cell_id: cell.id,
                    due_ms: now_ms + HIT_FLASH_MS,
                });
                sink.play_cue(Cue::Hit);
                false
            }
            None => true,
        }
    });
    state.projectiles = projectiles;
}

/// Revert the flash color of every cell whose flash timer has expired.
///
/// Reverts are matched by cell id: if the layout was rebuilt since the flash
/// was scheduled, the id no longer exists and the entry is dropped without
/// touching the new cells.
pub fn expire_flashes(state: &mut WorldState, now_ms: f64) {
    let cells = &mut state.cells;
    state.pending_flashes.retain(|pending| {
        if now_ms < pending.due_ms {
            return true;
        }
        if let Some(cell) = cells.iter_mut().find(|c| c.id == pending.cell_id) {
            cell.flash = false;
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::{EventQueue, GameEvent};

    fn world() -> WorldState {
        WorldState::new(11, 900.0, 600.0)
    }

    #[test]
    fn touching_left_edge_counts_as_hit() {
        let rect = Rect::new(300.0, 20.0, 300.0, 50.0);
        // Rim exactly on the left edge
        assert!(circle_rect_overlap(Vec2::new(294.0, 40.0), 6.0, &rect));
        // One pixel short
        assert!(!circle_rect_overlap(Vec2::new(293.0, 40.0), 6.0, &rect));
    }

    #[test]
    fn touching_bottom_edge_counts_as_hit() {
        let rect = Rect::new(0.0, 20.0, 300.0, 50.0);
        assert!(circle_rect_overlap(Vec2::new(150.0, 76.0), 6.0, &rect));
        assert!(!circle_rect_overlap(Vec2::new(150.0, 77.0), 6.0, &rect));
    }

    #[test]
    fn hit_toggles_cell_and_consumes_projectile() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let cell = w.cells[1].rect;
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(cell.center_x(), cell.center_y()),
            radius: 6.0,
            speed: 25.0,
        });

        process_collisions(&mut w, &mut sink, 0.0);
        assert!(w.cells[1].active);
        assert!(w.cells[1].flash);
        assert!(w.projectiles.is_empty());
        assert_eq!(sink.events, vec![GameEvent::Cue(Cue::Hit)]);

        // A second hit toggles it back off
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(cell.center_x(), cell.center_y()),
            radius: 6.0,
            speed: 25.0,
        });
        process_collisions(&mut w, &mut sink, 10.0);
        assert!(!w.cells[1].active);
    }

    #[test]
    fn first_cell_in_index_order_wins() {
        let mut w = world();
        let mut sink = EventQueue::new();
        // Straddle the boundary between cells 0 and 1: overlaps both
        let boundary_x = w.cells[1].rect.x;
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(boundary_x, w.cells[0].rect.center_y()),
            radius: 6.0,
            speed: 25.0,
        });

        process_collisions(&mut w, &mut sink, 0.0);
        assert!(w.cells[0].active);
        assert!(!w.cells[1].active);
    }

    #[test]
    fn miss_survives_to_next_frame() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(100.0, 400.0),
            radius: 6.0,
            speed: 25.0,
        });
        process_collisions(&mut w, &mut sink, 0.0);
        assert_eq!(w.projectiles.len(), 1);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn flash_reverts_after_delay() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let cell = w.cells[0].rect;
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(cell.center_x(), cell.center_y()),
            radius: 6.0,
            speed: 25.0,
        });
        process_collisions(&mut w, &mut sink, 1000.0);
        assert!(w.cells[0].flash);

        expire_flashes(&mut w, 1020.0);
        assert!(w.cells[0].flash, "revert must not fire early");
        expire_flashes(&mut w, 1025.0);
        assert!(!w.cells[0].flash);
        assert!(w.pending_flashes.is_empty());
    }

    #[test]
    fn stale_flash_revert_cannot_touch_rebuilt_cells() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let cell = w.cells[0].rect;
        w.projectiles.push(crate::sim::state::Projectile {
            pos: Vec2::new(cell.center_x(), cell.center_y()),
            radius: 6.0,
            speed: 25.0,
        });
        process_collisions(&mut w, &mut sink, 0.0);

        // Level-up style rebuild replaces the whole array
        w.rebuild_cells();
        for c in &mut w.cells {
            c.flash = true;
        }

        expire_flashes(&mut w, 100.0);
        // The stale revert found no matching id, so the new cells kept their state
        assert!(w.cells.iter().all(|c| c.flash));
        assert!(w.pending_flashes.is_empty());
    }
}
