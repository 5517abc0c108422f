//! Balloon Pop entry point
//!
//! Native: runs one headless autoplay session and prints the summary.
//! Set `BALLOON_POP_DATA` to a directory to keep progression between runs.
//!
//! Web: exports `WebGame` for the page script to drive.

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use glam::Vec2;
    use wasm_bindgen::prelude::*;

    use balloon_pop::persistence::{LocalStorage, MemoryStorage, Storage};
    use balloon_pop::sim::{GameMode, PointerEvent, PowerUpKind, TickInput};
    use balloon_pop::GameController;

    /// Game instance owned by the page
    #[wasm_bindgen]
    pub struct WebGame {
        game: GameController<Box<dyn Storage>>,
        input: TickInput,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new(width: f32, height: f32) -> WebGame {
            let storage: Box<dyn Storage> = match LocalStorage::open() {
                Ok(storage) => Box::new(storage),
                Err(err) => {
                    log::warn!("LocalStorage unavailable, progress won't persist: {err}");
                    Box::new(MemoryStorage::new())
                }
            };
            let seed = js_sys::Date::now() as u64;
            let mut game = GameController::new(storage, seed);
            game.set_bounds(Vec2::new(width, height));
            log::info!("Game initialized with seed: {}", seed);
            WebGame {
                game,
                input: TickInput::default(),
            }
        }

        /// Start a session. Unknown mode names fall back to classic.
        pub fn start(&mut self, mode: &str) {
            let mode = GameMode::from_str(mode).unwrap_or_default();
            self.game.start_session(mode);
        }

        pub fn pointer_down(&mut self, x: f32, y: f32) {
            self.input.pointer.push(PointerEvent::Down(Vec2::new(x, y)));
        }

        pub fn pointer_move(&mut self, x: f32, y: f32) {
            self.input.pointer.push(PointerEvent::Move(Vec2::new(x, y)));
        }

        pub fn pointer_up(&mut self) {
            self.input.pointer.push(PointerEvent::Up);
        }

        pub fn toggle_pause(&mut self) {
            self.input.pause = true;
        }

        /// Advance one frame. Returns false once the session is over.
        pub fn tick(&mut self, dt_ms: f32) -> bool {
            self.game.tick(&self.input, dt_ms);
            // One-shot inputs are consumed by the tick
            self.input.pointer.clear();
            self.input.pause = false;
            self.game.session().is_some()
        }

        pub fn use_powerup(&mut self, name: &str) -> bool {
            PowerUpKind::ALL
                .into_iter()
                .find(|k| k.as_str() == name)
                .is_some_and(|kind| self.game.use_powerup(kind))
        }

        pub fn score(&self) -> f64 {
            self.game
                .session()
                .map(|s| s.score)
                .or_else(|| self.game.last_summary().map(|s| s.score))
                .unwrap_or(0) as f64
        }

        pub fn coins(&self) -> f64 {
            self.game.store().record().coins as f64
        }

        pub fn high_score(&self) -> f64 {
            self.game.store().record().high_score as f64
        }

        /// Put the last game on the leaderboard. Returns the rank or 0.
        pub fn submit_score(&mut self, initials: &str) -> u32 {
            self.game.submit_score(initials).map_or(0, |r| r as u32)
        }
    }

    #[wasm_bindgen(start)]
    pub fn wasm_main() {
        balloon_pop::platform::init_logging();
        log::info!("Balloon Pop starting...");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use balloon_pop::consts::FRAME_MS;
    use balloon_pop::persistence::{FileStorage, MemoryStorage, Storage};
    use balloon_pop::sim::{GameMode, TickInput};
    use balloon_pop::{GameController, platform};

    /// Cap for modes without a clock (zen, endless)
    const MAX_SECONDS: u32 = 180;

    platform::init_logging();
    log::info!("Balloon Pop (native) starting...");

    let mut args = std::env::args().skip(1);
    let mode = args
        .next()
        .and_then(|m| GameMode::from_str(&m))
        .unwrap_or_default();
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| platform::now_ms() as u64);

    let storage: Box<dyn Storage> = match std::env::var("BALLOON_POP_DATA") {
        Ok(dir) => match FileStorage::open(&dir) {
            Ok(storage) => Box::new(storage),
            Err(err) => {
                log::warn!("Can't open {dir}, progress won't persist: {err}");
                Box::new(MemoryStorage::new())
            }
        },
        Err(_) => Box::new(MemoryStorage::new()),
    };

    let mut game = GameController::new(storage, seed);
    game.start_session(mode);
    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };
    for _ in 0..MAX_SECONDS * 60 {
        game.tick(&input, FRAME_MS);
        if game.session().is_none() {
            break;
        }
    }
    game.quit();

    let Some(summary) = game.last_summary() else {
        log::warn!("Session produced no summary");
        return;
    };
    println!("Mode:        {}", summary.mode.as_str());
    println!("Ended:       {:?}", summary.end_reason);
    println!("Score:       {} (best {})", summary.score, summary.high_score);
    println!("Pops:        {}", summary.pops);
    println!("Max combo:   {}", summary.max_combo);
    println!("Bosses:      {}", summary.bosses_defeated);
    println!("Stars:       +{}", summary.stars_earned);
    println!("Coins:       +{}", summary.coins_earned);
    if let Some(rank) = summary.rank_up {
        println!("Rank up:     {}", rank.name());
    }
    for id in &summary.achievements {
        println!("Achievement: {id}");
    }
    for id in &summary.challenges_completed {
        println!("Challenge:   {id}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is wasm_main
}
