//! Input tracking
//!
//! Held movement keys are level-triggered booleans; fire is edge-triggered
//! and rate-limited against the host's monotonic clock. Fire attempts inside
//! the cooldown window are dropped, never queued.

use crate::consts::FIRE_COOLDOWN_MS;

/// Currently-held movement keys plus the fire rate limiter
#[derive(Debug, Clone)]
pub struct InputTracker {
    pub left: bool,
    pub right: bool,
    last_fire_ms: f64,
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTracker {
    pub fn new() -> Self {
        Self {
            left: false,
            right: false,
            // Far enough in the past that the first shot is always accepted
            last_fire_ms: f64::NEG_INFINITY,
        }
    }

    /// Record a key transition by logical key name.
    /// Returns false for keys this tracker does not handle.
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        match key {
            "a" | "A" | "ArrowLeft" => {
                self.left = pressed;
                true
            }
            "d" | "D" | "ArrowRight" => {
                self.right = pressed;
                true
            }
            _ => false,
        }
    }

    /// True if `key` is the fire control
    pub fn is_fire_key(key: &str) -> bool {
        matches!(key, " " | "j" | "J")
    }

    /// Attempt a fire at monotonic time `now_ms`.
    /// Accepted only if the cooldown has elapsed since the last accepted shot.
    pub fn try_fire(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_fire_ms < FIRE_COOLDOWN_MS {
            return false;
        }
        self.last_fire_ms = now_ms;
        true
    }

    /// Drop all held keys (used when the window loses focus)
    pub fn release_all(&mut self) {
        self.left = false;
        self.right = false;
    }
}
