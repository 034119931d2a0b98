//! Bitfire entry point
//!
//! Wires the pure simulation to the browser: canvas lookup, keyboard and
//! resize listeners, the two schedules, and the event dispatch that forwards
//! simulation events to the HUD, toasts, audio, and the leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use bitfire::audio::AudioManager;
    use bitfire::platform::{FrameLoop, IntervalTimer};
    use bitfire::renderer::CanvasRenderer;
    use bitfire::sim::{
        self, Cue, EventQueue, GameEvent, GamePhase, InputTracker, MessageKind, RoundUpdate,
        WorldState,
    };
    use bitfire::{HighScores, Settings};

    /// Game instance holding all state
    struct Game {
        state: WorldState,
        input: InputTracker,
        events: EventQueue,
        renderer: CanvasRenderer,
        audio: AudioManager,
        settings: Settings,
        highscores: HighScores,
        frame_loop: Option<FrameLoop>,
        countdown: Option<IntervalTimer>,
    }

    impl Game {
        /// Forward one recorded simulation event to its collaborator.
        /// Collaborator failures are logged and swallowed; nothing here may
        /// stop the schedules.
        fn dispatch(&mut self, event: GameEvent) {
            match event {
                GameEvent::Cue(cue) => self.audio.play(cue),
                GameEvent::Message { kind, text } => show_toast(kind, &text),
                GameEvent::RoundUpdate(update) => update_hud(&update),
                GameEvent::BinarySnapshot(bits) => {
                    set_text("last-pattern", &bits);
                }
                GameEvent::TargetSnapshot { target, current } => {
                    set_text("hud-target", &format!("{current} - {target}"));
                }
                GameEvent::GameOver {
                    final_score,
                    final_level,
                } => self.handle_game_over(final_score, final_level),
            }
        }

        fn handle_game_over(&mut self, final_score: u32, final_level: u32) {
            log::info!("Game over: score {final_score}, level {final_level}");

            // Tear down both schedules before anything else
            if let Some(frame_loop) = &self.frame_loop {
                frame_loop.cancel();
            }
            if let Some(countdown) = &self.countdown {
                countdown.cancel();
            }

            if let Some(rank) = self
                .highscores
                .add_score(final_score, final_level, js_sys::Date::now())
            {
                log::info!("New high score, rank {rank}");
                self.highscores.save();
            }

            set_text("final-score", &final_score.to_string());
            set_text("final-level", &final_level.to_string());
            if let Some(top) = self.highscores.top_score() {
                set_text("final-best", &top.to_string());
            }
            set_class("game-over", "");
        }
    }

    /// Run the update/render pass for one animation frame, then dispatch
    /// everything the simulation reported.
    fn on_frame(game: &Rc<RefCell<Game>>, time: f64) {
        let drained = {
            let g = &mut *game.borrow_mut();
            sim::frame(&mut g.state, &g.input, &mut g.events, time);
            g.renderer.draw(&g.state, &g.settings);
            g.events.drain()
        };
        dispatch_all(game, drained);
    }

    /// One countdown tick per second.
    fn on_second(game: &Rc<RefCell<Game>>) {
        let drained = {
            let g = &mut *game.borrow_mut();
            sim::second(&mut g.state, &mut g.events);
            g.events.drain()
        };
        dispatch_all(game, drained);
    }

    fn dispatch_all(game: &Rc<RefCell<Game>>, events: Vec<GameEvent>) {
        let mut g = game.borrow_mut();
        for event in events {
            g.dispatch(event);
        }
    }

    fn start_schedules(game: &Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let frame_loop = {
            let game = game.clone();
            FrameLoop::start(move |time| on_frame(&game, time))?
        };
        let countdown = {
            let game = game.clone();
            IntervalTimer::start(1000, move || on_second(&game))?
        };

        let mut g = game.borrow_mut();
        g.frame_loop = Some(frame_loop);
        g.countdown = Some(countdown);
        Ok(())
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|_| JsValue::from_str("failed to init logger"))?;

        log::info!("Bitfire starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        // A missing canvas or 2D context aborts startup here, before any
        // scheduling begins.
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("missing #canvas element"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("#canvas is not a canvas"))?;

        let width = window.inner_width()?.as_f64().unwrap_or(800.0);
        let height = window.inner_height()?.as_f64().unwrap_or(600.0);
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let renderer = CanvasRenderer::new(&canvas)?;

        let seed = js_sys::Date::now() as u64;
        let state = WorldState::new(seed, width as f32, height as f32);
        log::info!("World initialized with seed {seed}");

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);

        let game = Rc::new(RefCell::new(Game {
            state,
            input: InputTracker::new(),
            events: EventQueue::new(),
            renderer,
            audio,
            settings,
            highscores: HighScores::load(),
            frame_loop: None,
            countdown: None,
        }));

        setup_keyboard(&window, game.clone());
        setup_resize(&window, &canvas, game.clone());
        setup_restart_button(&document, game.clone());

        // Initial HUD state and the start cue
        {
            let g = &mut *game.borrow_mut();
            g.audio.play(Cue::Start);
            update_hud(&RoundUpdate {
                score: g.state.score,
                level: g.state.level,
                lives: g.state.lives,
                seconds_remaining: g.state.seconds_left,
            });
            set_text(
                "hud-target",
                &format!("{} - {}", g.state.current_value(), g.state.target),
            );
        }

        start_schedules(&game)?;
        log::info!("Bitfire running!");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let g = &mut *game.borrow_mut();
                if g.input.set_key(&key, true) {
                    return;
                }
                if InputTracker::is_fire_key(&key) {
                    let now = web_sys::window()
                        .and_then(|w| w.performance())
                        .map(|p| p.now())
                        .unwrap_or(0.0);
                    sim::try_fire(&mut g.state, &mut g.input, &mut g.events, now);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.set_key(&event.key(), false);
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus drops held keys so the ship doesn't drift forever
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input.release_all();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(window: &web_sys::Window, canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let width = window
                .inner_width()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(800.0);
            let height = window
                .inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(600.0);
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
            game.borrow_mut()
                .state
                .resize(width as f32, height as f32);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_restart_button(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(btn) = document.get_element_by_id("restart-btn") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            {
                let g = &mut *game.borrow_mut();
                if g.state.phase != GamePhase::GameOver {
                    return;
                }
                g.state.resume();
                g.audio.play(Cue::Start);
            }
            set_class("game-over", "hidden");
            if let Err(err) = start_schedules(&game) {
                log::error!("Failed to restart schedules: {err:?}");
            } else {
                log::info!("Session restarted");
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // === DOM helpers: every failure is ignored so a missing element never
    // stops the game ===

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(id: &str, class: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("class", class);
        }
    }

    fn show_toast(kind: MessageKind, text: &str) {
        let class = match kind {
            MessageKind::Success => "toast success",
            MessageKind::Error => "toast error",
            MessageKind::Info => "toast info",
        };
        set_text("toast", text);
        set_class("toast", class);
    }

    fn update_hud(update: &RoundUpdate) {
        set_text("hud-score", &update.score.to_string());
        set_text("hud-level", &update.level.to_string());
        set_text("hud-lives", &update.lives.to_string());
        set_text("hud-time", &update.seconds_remaining.to_string());
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bitfire (native) starting...");
    log::info!("Run with `trunk serve` for the web version; native mode runs a headless smoke loop");

    smoke_loop();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: drive the simulation for a few seconds of virtual time and
/// print the counters, exercising fire, collisions, and the countdown.
#[cfg(not(target_arch = "wasm32"))]
fn smoke_loop() {
    use bitfire::sim::{self, EventQueue, InputTracker, WorldState};
    use std::time::{SystemTime, UNIX_EPOCH};

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut state = WorldState::new(seed, 1280.0, 720.0);
    let mut input = InputTracker::new();
    let mut events = EventQueue::new();

    // ~5 virtual seconds at 60 fps, firing every few frames
    let mut now_ms = 0.0;
    for frame_index in 0..300u32 {
        now_ms += 1000.0 / 60.0;
        if frame_index % 4 == 0 {
            sim::try_fire(&mut state, &mut input, &mut events, now_ms);
        }
        input.set_key("d", frame_index % 120 < 60);
        sim::frame(&mut state, &input, &mut events, now_ms);
        if frame_index % 60 == 59 {
            sim::second(&mut state, &mut events);
        }
    }

    println!(
        "seed {} -> score {}, level {}, lives {}, width {}, target {}, current {} ({} events)",
        seed,
        state.score,
        state.level,
        state.lives,
        state.bit_width,
        state.target,
        state.current_value(),
        events.events.len(),
    );
}
