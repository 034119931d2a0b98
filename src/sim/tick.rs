//! Per-frame update and round lifecycle
//!
//! The host drives two schedules: [`frame`] once per animation frame and
//! [`second`] once per 1000 ms countdown tick. Both mutate the same
//! [`WorldState`] on the same execution context, so a success resolved inside
//! a frame completes (re-roll, resets, notifications) before the renderer
//! reads that frame's state.

use super::collision::{expire_flashes, process_collisions};
use super::events::{Cue, EventSink, MessageKind, RoundUpdate};
use super::input::InputTracker;
use super::state::{Facing, GamePhase, WorldState};
use crate::consts::*;

/// Advance the world by one animation frame.
///
/// Order matters: movement, projectile advance and cull, flash expiry,
/// starfield, collisions, then the win check. Win detection happens here and
/// only here; the renderer never mutates state.
pub fn frame(state: &mut WorldState, input: &InputTracker, sink: &mut dyn EventSink, now_ms: f64) {
    if state.phase != GamePhase::Playing {
        return;
    }

    move_player(state, input);
    advance_projectiles(state);
    expire_flashes(state, now_ms);
    advance_stars(state);

    let before = state.current_value();
    process_collisions(state, sink, now_ms);
    let current = state.current_value();
    if current != before {
        sink.on_target_snapshot(state.target, current);
    }

    if current == state.target {
        resolve_round(state, sink, RoundOutcome::Success);
    }
}

/// Advance the countdown by one second and resolve a timeout if it expires.
pub fn second(state: &mut WorldState, sink: &mut dyn EventSink) {
    if state.phase != GamePhase::Playing {
        return;
    }

    state.seconds_left = state.seconds_left.saturating_sub(1);
    if state.seconds_left == ALARM_SECONDS {
        sink.play_cue(Cue::Alarm);
    }
    if state.seconds_left == 0 {
        resolve_round(state, sink, RoundOutcome::Timeout);
    } else {
        notify_counters(state, sink);
    }
}

/// Attempt a rate-limited fire. On acceptance, spawns one projectile and
/// requests the fire cue.
pub fn try_fire(
    state: &mut WorldState,
    input: &mut InputTracker,
    sink: &mut dyn EventSink,
    now_ms: f64,
) -> bool {
    if state.phase != GamePhase::Playing || !input.try_fire(now_ms) {
        return false;
    }
    state.spawn_projectile();
    sink.play_cue(Cue::Fire);
    true
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Current value matched the target
    Success,
    /// Countdown expired
    Timeout,
}

/// Resolve a round boundary: scoring or life loss, then reset into the next
/// round (or game over).
pub fn resolve_round(state: &mut WorldState, sink: &mut dyn EventSink, outcome: RoundOutcome) {
    sink.on_binary_snapshot(&state.bit_string());

    match outcome {
        RoundOutcome::Success => {
            state.score += 1;
            sink.play_cue(Cue::Score);
            sink.on_message(MessageKind::Success, "Good job!");
            if state.score % LEVEL_UP_EVERY == 0 {
                level_up(state, sink);
            }
            // Geometry regeneration is idempotent; always rebuild for the
            // (possibly new) bit-width. This also clears active flags.
            state.rebuild_cells();
            state.roll_target();
        }
        RoundOutcome::Timeout => {
            state.lives -= 1;
            sink.play_cue(Cue::Timeout);
            sink.on_message(MessageKind::Error, "Time's up");
            if state.lives == 0 {
                game_over(state, sink);
                return;
            }
            state.clear_active();
            state.roll_target_distinct();
        }
    }

    state.seconds_left = ROUND_SECONDS;
    notify_counters(state, sink);
    sink.on_target_snapshot(state.target, state.current_value());
}

fn level_up(state: &mut WorldState, sink: &mut dyn EventSink) {
    state.level += 1;
    state.star_count += STARS_INCREASE;
    state.spawn_stars();
    sink.play_cue(Cue::LevelUp);
    sink.on_message(MessageKind::Info, "Level up!");
    if state.bit_width < MAX_BIT_WIDTH {
        state.bit_width += 1;
    }
}

/// Terminal transition: report the final score, then reset the session into
/// a clean state. The host cancels both schedules on the game-over event and
/// decides when to resume.
fn game_over(state: &mut WorldState, sink: &mut dyn EventSink) {
    state.phase = GamePhase::GameOver;
    sink.play_cue(Cue::GameOver);
    sink.on_game_over(state.score, state.level);

    state.score = 0;
    state.level = 1;
    state.lives = START_LIVES;
    state.bit_width = START_BIT_WIDTH;
    state.star_count = STARS_START;
    state.seconds_left = ROUND_SECONDS;
    state.projectiles.clear();
    state.pending_flashes.clear();
    state.rebuild_cells();
    state.roll_target();
    state.spawn_stars();
    notify_counters(state, sink);
    sink.on_target_snapshot(state.target, 0);
}

fn notify_counters(state: &WorldState, sink: &mut dyn EventSink) {
    sink.on_round_update(RoundUpdate {
        score: state.score,
        level: state.level,
        lives: state.lives,
        seconds_remaining: state.seconds_left,
    });
}

fn move_player(state: &mut WorldState, input: &InputTracker) {
    let player = &mut state.player;
    if input.left {
        player.facing = Facing::Left;
        player.pos.x -= player.speed;
        // Wrap once fully off the left edge
        if player.pos.x + player.w < 0.0 {
            player.pos.x = state.viewport_w;
        }
    } else if input.right {
        player.facing = Facing::Right;
        player.pos.x += player.speed;
        if player.pos.x > state.viewport_w {
            player.pos.x = -player.w;
        }
    } else {
        player.facing = Facing::Straight;
    }
}

fn advance_projectiles(state: &mut WorldState) {
    for projectile in &mut state.projectiles {
        projectile.pos.y -= projectile.speed;
    }
    // Cull once fully above the top edge
    state.projectiles.retain(|p| p.pos.y + p.radius > 0.0);
}

fn advance_stars(state: &mut WorldState) {
    let vh = state.viewport_h;
    for star in &mut state.stars {
        star.pos.y += star.speed;
        if star.pos.y > vh {
            star.pos.y = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::{EventQueue, GameEvent};
    use crate::sim::state::Projectile;
    use glam::Vec2;

    fn world() -> WorldState {
        WorldState::new(42, 900.0, 600.0)
    }

    /// Set the active bits to the target pattern, then run one frame so the
    /// win check fires through the normal update path.
    fn force_success(state: &mut WorldState, sink: &mut EventQueue) {
        let target = state.target;
        let width = state.bit_width;
        for (i, cell) in state.cells.iter_mut().enumerate() {
            cell.active = target & (1 << (width - 1 - i as u32)) != 0;
        }
        let input = InputTracker::new();
        frame(state, &input, sink, 0.0);
    }

    #[test]
    fn success_detected_during_update_and_resets_round() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.seconds_left = 4;
        force_success(&mut w, &mut sink);

        assert_eq!(w.score, 1);
        assert_eq!(w.seconds_left, ROUND_SECONDS);
        assert!(w.cells.iter().all(|c| !c.active));
        assert!(sink.events.contains(&GameEvent::Cue(Cue::Score)));
    }

    #[test]
    fn score_five_levels_up_and_widens_layout() {
        let mut w = world();
        let mut sink = EventQueue::new();
        for _ in 0..5 {
            force_success(&mut w, &mut sink);
        }
        assert_eq!(w.score, 5);
        assert_eq!(w.level, 2);
        assert_eq!(w.bit_width, 4);
        assert_eq!(w.cells.len(), 4);
        assert_eq!(w.labels.len(), 4);
        assert_eq!(w.star_count, STARS_START + STARS_INCREASE);
        assert!(sink.events.contains(&GameEvent::Cue(Cue::LevelUp)));
    }

    #[test]
    fn level_up_only_on_multiples_of_five() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let mut last_score = 0;
        for _ in 0..12 {
            force_success(&mut w, &mut sink);
            assert!(w.score > last_score, "score is monotone within a session");
            last_score = w.score;
            let expected_level = 1 + w.score / LEVEL_UP_EVERY;
            assert_eq!(w.level, expected_level, "score={}", w.score);
            assert_eq!(w.bit_width, START_BIT_WIDTH + w.score / LEVEL_UP_EVERY);
        }
    }

    #[test]
    fn bit_width_caps_at_nine() {
        let mut w = world();
        let mut sink = EventQueue::new();
        // 7 level-ups would take width past the cap of 9
        for _ in 0..35 {
            force_success(&mut w, &mut sink);
        }
        assert_eq!(w.level, 8);
        assert_eq!(w.bit_width, MAX_BIT_WIDTH);
        assert_eq!(w.cells.len(), MAX_BIT_WIDTH as usize);
    }

    #[test]
    fn timeout_decrements_life_and_rerolls_distinct_target() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.seconds_left = 1;
        let previous_target = w.target;
        w.cells[2].active = true;

        second(&mut w, &mut sink);
        assert_eq!(w.lives, START_LIVES - 1);
        assert_ne!(w.target, previous_target);
        assert_eq!(w.seconds_left, ROUND_SECONDS);
        assert!(w.cells.iter().all(|c| !c.active));
        assert!(sink.events.contains(&GameEvent::Cue(Cue::Timeout)));
        // The pattern on the board at the moment of timeout is reported
        assert!(sink.events.contains(&GameEvent::BinarySnapshot("001".into())));
    }

    #[test]
    fn last_life_timeout_fires_game_over_once_and_resets_session() {
        let mut w = world();
        let mut sink = EventQueue::new();
        for _ in 0..3 {
            force_success(&mut w, &mut sink);
        }
        w.lives = 1;
        w.seconds_left = 1;
        second(&mut w, &mut sink);

        assert_eq!(sink.count_game_overs(), 1);
        assert!(sink
            .events
            .contains(&GameEvent::GameOver { final_score: 3, final_level: 1 }));
        assert_eq!(w.phase, GamePhase::GameOver);
        // Session reset to a clean state
        assert_eq!(w.score, 0);
        assert_eq!(w.level, 1);
        assert_eq!(w.lives, START_LIVES);
        assert_eq!(w.bit_width, START_BIT_WIDTH);
        assert!(w.target >= 1 && w.target <= w.max_value());
    }

    #[test]
    fn no_ticks_mutate_state_after_game_over() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.lives = 1;
        w.seconds_left = 1;
        second(&mut w, &mut sink);
        assert_eq!(w.phase, GamePhase::GameOver);

        let target = w.target;
        let input = InputTracker::new();
        frame(&mut w, &input, &mut sink, 100.0);
        second(&mut w, &mut sink);
        assert_eq!(w.target, target);
        assert_eq!(w.seconds_left, ROUND_SECONDS);
        assert_eq!(sink.count_game_overs(), 1);
    }

    #[test]
    fn alarm_fires_at_three_seconds() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.seconds_left = 4;
        second(&mut w, &mut sink);
        assert_eq!(w.seconds_left, 3);
        assert!(sink.events.contains(&GameEvent::Cue(Cue::Alarm)));
    }

    #[test]
    fn one_success_per_frame_even_with_multiple_hits() {
        let mut w = world();
        let mut sink = EventQueue::new();
        w.target = 3; // bits 011 at width 3
        let input = InputTracker::new();
        // Two projectiles landing on cells 1 and 2 in the same frame
        for i in [1usize, 2] {
            let rect = w.cells[i].rect;
            w.projectiles.push(Projectile {
                pos: Vec2::new(rect.center_x(), rect.center_y() + PROJECTILE_SPEED),
                radius: PROJECTILE_RADIUS,
                speed: PROJECTILE_SPEED,
            });
        }
        frame(&mut w, &input, &mut sink, 0.0);
        assert_eq!(w.score, 1, "the decimal recompute happens once per frame");
    }

    #[test]
    fn player_wraps_fully_offscreen_left_to_right_edge() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let mut input = InputTracker::new();
        input.set_key("a", true);
        w.player.pos.x = 0.0;
        // 40px ship at 10px per frame: five frames to be fully off
        for _ in 0..5 {
            frame(&mut w, &input, &mut sink, 0.0);
        }
        assert_eq!(w.player.pos.x, w.viewport_w);
        assert_eq!(w.player.facing, Facing::Left);
    }

    #[test]
    fn player_wraps_right_to_left_edge() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let mut input = InputTracker::new();
        input.set_key("d", true);
        w.player.pos.x = w.viewport_w - 5.0;
        frame(&mut w, &input, &mut sink, 0.0);
        assert_eq!(w.player.pos.x, -w.player.w);
    }

    #[test]
    fn facing_neutral_when_no_key_held() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let input = InputTracker::new();
        w.player.facing = Facing::Left;
        frame(&mut w, &input, &mut sink, 0.0);
        assert_eq!(w.player.facing, Facing::Straight);
    }

    #[test]
    fn projectiles_advance_and_cull_above_viewport() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let input = InputTracker::new();
        w.projectiles.push(Projectile {
            pos: Vec2::new(100.0, 300.0),
            radius: PROJECTILE_RADIUS,
            speed: PROJECTILE_SPEED,
        });
        frame(&mut w, &input, &mut sink, 0.0);
        assert_eq!(w.projectiles[0].pos.y, 275.0);

        // One more step takes the trailing edge past the top: culled
        w.projectiles[0].pos.y = PROJECTILE_SPEED - PROJECTILE_RADIUS - 0.5;
        frame(&mut w, &input, &mut sink, 0.0);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn stars_recycle_to_top() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let input = InputTracker::new();
        let count = w.stars.len();
        w.stars[0].pos.y = w.viewport_h - 0.1;
        w.stars[0].speed = 2.0;
        frame(&mut w, &input, &mut sink, 0.0);
        assert_eq!(w.stars.len(), count, "stars are recycled, never destroyed");
        assert_eq!(w.stars[0].pos.y, 0.0);
    }

    #[test]
    fn fire_spawns_projectile_and_cue() {
        let mut w = world();
        let mut sink = EventQueue::new();
        let mut input = InputTracker::new();
        assert!(try_fire(&mut w, &mut input, &mut sink, 1000.0));
        assert_eq!(w.projectiles.len(), 1);
        assert_eq!(w.projectiles[0].pos, w.player.muzzle());
        assert!(sink.events.contains(&GameEvent::Cue(Cue::Fire)));

        // Inside the cooldown: dropped, no projectile, no cue
        sink.drain();
        assert!(!try_fire(&mut w, &mut input, &mut sink, 1010.0));
        assert_eq!(w.projectiles.len(), 1);
        assert!(sink.events.is_empty());
    }
}
