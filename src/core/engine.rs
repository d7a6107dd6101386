//! Core Engine struct and the headless frame loop

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::{EventQueue, Time};
use crate::ecs::World;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name used in log output
    pub title: String,
    /// Simulation frames per second
    pub target_fps: u32,
    /// Stop after this many frames (0 for unlimited)
    pub max_frames: u64,
    /// Sleep between frames to match `target_fps` in wall-clock time
    pub realtime: bool,
    /// Seed for the shared random number generator
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Reefling"),
            target_fps: 60,
            max_frames: 0,
            realtime: false,
            seed: 0x5EED,
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Limit the run to a number of frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = frames;
        self
    }

    /// Enable or disable wall-clock pacing
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fixed frame step in seconds
    #[must_use]
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

/// Game trait that users implement
pub trait Game: 'static {
    /// Called once when the engine starts
    fn init(&mut self, engine: &mut EngineContext);

    /// Called every frame for game logic updates
    fn update(&mut self, engine: &mut EngineContext);

    /// Called when the game is shutting down
    fn shutdown(&mut self, _engine: &mut EngineContext) {}
}

/// Context passed to game callbacks
pub struct EngineContext {
    /// Time tracking
    pub time: Time,
    /// ECS world
    pub world: World,
    /// Events broadcast between systems
    pub events: EventQueue,
    /// Shared deterministic RNG
    pub rng: ChaCha8Rng,
    /// Should the engine quit
    should_quit: bool,
}

impl EngineContext {
    fn new(seed: u64) -> Self {
        Self {
            time: Time::new(),
            world: World::new(),
            events: EventQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            should_quit: false,
        }
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<G: Game> {
    config: EngineConfig,
    game: G,
    context: EngineContext,
    initialized: bool,
}

impl<G: Game> Engine<G> {
    /// Create a new engine with the given game
    pub fn new(config: EngineConfig, game: G) -> Self {
        let context = EngineContext::new(config.seed);
        Self {
            config,
            game,
            context,
            initialized: false,
        }
    }

    /// Run the engine until the game quits or `max_frames` is reached
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        let _ = env_logger::try_init();
        log::info!("Starting engine: {}", self.config.title);

        let frame_budget = Duration::from_secs_f32(self.config.frame_delta());
        loop {
            let started = Instant::now();
            self.step();

            if self.context.should_quit()
                || (self.config.max_frames > 0
                    && self.context.time.frame() >= self.config.max_frames)
            {
                break;
            }

            if self.config.realtime
                && let Some(rest) = frame_budget.checked_sub(started.elapsed())
            {
                std::thread::sleep(rest);
            }
        }

        log::info!(
            "Shutting down after {} frames ({:.2}s simulated)",
            self.context.time.frame(),
            self.context.time.elapsed_seconds()
        );
        self.game.shutdown(&mut self.context);
        Ok(())
    }

    /// Advance exactly one frame, initializing the game first if needed
    pub fn step(&mut self) {
        if !self.initialized {
            self.game.init(&mut self.context);
            self.initialized = true;
            log::info!("Engine initialized successfully");
        }

        self.context.time.advance(self.config.frame_delta());
        self.context.events.swap();
        self.game.update(&mut self.context);
    }

    /// The game being driven
    pub fn game(&self) -> &G {
        &self.game
    }

    /// The engine context
    pub fn context(&self) -> &EngineContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingGame {
        inits: u32,
        updates: u32,
    }

    impl Game for CountingGame {
        fn init(&mut self, _engine: &mut EngineContext) {
            self.inits += 1;
        }

        fn update(&mut self, engine: &mut EngineContext) {
            self.updates += 1;
            if self.updates == 5 {
                engine.quit();
            }
        }
    }

    #[test]
    fn test_step_initializes_once() {
        let mut engine = Engine::new(EngineConfig::default(), CountingGame::default());
        engine.step();
        engine.step();

        assert_eq!(engine.game().inits, 1);
        assert_eq!(engine.game().updates, 2);
        assert_eq!(engine.context().time.frame(), 2);
    }

    #[test]
    fn test_fixed_frame_delta() {
        let config = EngineConfig::default().with_target_fps(50);
        let mut engine = Engine::new(config, CountingGame::default());
        engine.step();

        assert!((engine.context().time.delta_seconds() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_seed_makes_runs_repeatable() {
        use rand::RngCore;

        let config = EngineConfig::default().with_seed(99).with_realtime(false);
        let mut first = Engine::new(config.clone(), CountingGame::default());
        let mut second = Engine::new(config, CountingGame::default());

        assert!(!first.context().should_quit());
        assert_eq!(
            first.context.rng.next_u64(),
            second.context.rng.next_u64()
        );
    }

    #[test]
    fn test_run_stops_on_quit() {
        let engine = Engine::new(
            EngineConfig::default().with_max_frames(100),
            CountingGame::default(),
        );
        assert!(engine.run().is_ok());
    }
}
