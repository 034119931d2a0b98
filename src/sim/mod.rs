//! Platform-free simulation
//!
//! Everything under this module is pure Rust with no DOM, audio, or storage
//! dependencies:
//! - Time arrives as millisecond timestamps from the host's monotonic clock
//! - Randomness comes from a seeded RNG in the world state
//! - All outward effects go through the [`events::EventSink`] boundary
//!
//! This keeps the whole game logic unit-testable off the browser.

pub mod collision;
pub mod events;
pub mod input;
pub mod state;
pub mod tick;

pub use collision::{circle_rect_overlap, expire_flashes, process_collisions};
pub use events::{Cue, EventQueue, EventSink, GameEvent, MessageKind, NullSink, RoundUpdate};
pub use input::InputTracker;
pub use state::{
    column_widths, BitCell, Facing, GamePhase, LabelCell, PendingFlash, Player, Projectile, Star,
    WorldState,
};
pub use tick::{frame, resolve_round, second, try_fire, RoundOutcome};
