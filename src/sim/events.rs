//! Simulation-to-host boundary
//!
//! The simulation never talks to the DOM, audio, or storage directly. It
//! reports through an [`EventSink`] with one method per event kind; the host
//! decides what (if anything) to do with each call. All methods default to
//! no-ops so partial sinks are cheap to write.

/// Audio cue names the simulation can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Fire,
    Hit,
    LevelUp,
    Score,
    Timeout,
    GameOver,
    /// Three seconds left on the countdown
    Alarm,
    Start,
}

/// Toast/message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

/// Counter snapshot sent whenever score/level/lives/countdown changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundUpdate {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub seconds_remaining: u32,
}

/// Observer interface for everything the simulation reports outward.
///
/// Calls are fire-and-forget: the simulation never depends on a result and a
/// sink must not assume any particular call ordering beyond "game over is
/// delivered exactly once per session".
pub trait EventSink {
    /// Session ended; delivered exactly once per game-over transition.
    fn on_game_over(&mut self, _final_score: u32, _final_level: u32) {}

    /// Toast-style message for the player.
    fn on_message(&mut self, _kind: MessageKind, _text: &str) {}

    /// One or more session counters changed.
    fn on_round_update(&mut self, _update: RoundUpdate) {}

    /// Bit pattern active at a round boundary, MSB first.
    fn on_binary_snapshot(&mut self, _bits: &str) {}

    /// Target or current decimal value changed.
    fn on_target_snapshot(&mut self, _target: u32, _current: u32) {}

    /// Fire-and-forget audio request.
    fn play_cue(&mut self, _cue: Cue) {}
}

/// Sink that ignores everything (headless ticking)
pub struct NullSink;

impl EventSink for NullSink {}

/// Recorded event, used by [`EventQueue`]
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameOver {
        final_score: u32,
        final_level: u32,
    },
    Message {
        kind: MessageKind,
        text: String,
    },
    RoundUpdate(RoundUpdate),
    BinarySnapshot(String),
    TargetSnapshot {
        target: u32,
        current: u32,
    },
    Cue(Cue),
}

/// Sink that records events as values.
///
/// The wasm host drains this once per frame to dispatch to the DOM and audio;
/// tests assert against the recorded sequence.
#[derive(Debug, Default)]
pub struct EventQueue {
    pub events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count_game_overs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }
}

impl EventSink for EventQueue {
    fn on_game_over(&mut self, final_score: u32, final_level: u32) {
        self.events.push(GameEvent::GameOver {
            final_score,
            final_level,
        });
    }

    fn on_message(&mut self, kind: MessageKind, text: &str) {
        self.events.push(GameEvent::Message {
            kind,
            text: text.to_string(),
        });
    }

    fn on_round_update(&mut self, update: RoundUpdate) {
        self.events.push(GameEvent::RoundUpdate(update));
    }

    fn on_binary_snapshot(&mut self, bits: &str) {
        self.events.push(GameEvent::BinarySnapshot(bits.to_string()));
    }

    fn on_target_snapshot(&mut self, target: u32, current: u32) {
        self.events.push(GameEvent::TargetSnapshot { target, current });
    }

    fn play_cue(&mut self, cue: Cue) {
        self.events.push(GameEvent::Cue(cue));
    }
}
