//! Session state and core simulation types
//!
//! A [`GameState`] owns everything one play session needs. Two sessions built
//! from the same config and seed and fed the same inputs stay identical.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Contact};
use super::kinematics::Bird;
use super::obstacles::{ObstacleRect, ObstacleStream};
use crate::config::GameConfig;
use crate::error::ConfigResult;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, waiting for the first flap
    Ready,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Bird crashed; a flap after the cooldown starts over
    GameOver,
}

/// Things that happened during the last tick, for audio and HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    Flapped,
    Spawned { id: u32 },
    Evicted { id: u32 },
    /// Score after the increment
    Scored { score: u32 },
    Crashed(Contact),
    Paused,
    Resumed,
    Restarted,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Validated tuning, fixed for the session
    pub config: GameConfig,
    /// Seed of the current run
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub bird: Bird,
    pub stream: ObstacleStream,
    /// Pairs passed this run
    pub score: u32,
    /// Frames simulated while playing
    pub frame: u64,
    pub phase: GamePhase,
    /// Frames left before a flap may restart after a crash
    pub cooldown: u32,
    /// What ended the last run
    pub last_contact: Option<Contact>,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
    /// A quit request was received; the frontend should shut down
    pub quit_requested: bool,
}

impl GameState {
    /// Create a session, rejecting configs that cannot place a gap
    pub fn new(config: GameConfig, seed: u64) -> ConfigResult<Self> {
        config.validate()?;
        let bird = Bird::new(&config);
        Ok(Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bird,
            stream: ObstacleStream::new(),
            score: 0,
            frame: 0,
            phase: GamePhase::Ready,
            cooldown: 0,
            last_contact: None,
            events: Vec::new(),
            quit_requested: false,
        })
    }

    /// Start over from the initial pose with the given seed.
    ///
    /// Nothing from the previous run survives except the config.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.bird = Bird::new(&self.config);
        self.stream.clear();
        self.score = 0;
        self.frame = 0;
        self.phase = GamePhase::Ready;
        self.cooldown = 0;
        self.last_contact = None;
    }

    /// Reset with a fresh seed drawn from the current run's RNG
    pub fn restart(&mut self) {
        let seed = self.rng.random::<u64>();
        self.reset(seed);
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn bird_aabb(&self) -> Aabb {
        self.bird.aabb()
    }

    /// Every pipe rectangle on screen, oldest pair first
    pub fn obstacle_rects(&self) -> impl Iterator<Item = ObstacleRect> + '_ {
        self.stream
            .rects(self.config.world_top(), self.config.world_floor())
    }
}
