//! Game tuning configuration
//!
//! Every physics and layout constant lives in [`GameConfig`] so a session can
//! be driven by data. Configurations are validated eagerly: a config that
//! cannot produce a placeable gap is rejected before any session starts.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, ConfigResult};

/// When the obstacle stream appends a new pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// Spawn once the newest pair has scrolled `spacing` units left of the spawn line
    Spacing { spacing: f32 },
    /// Spawn once more than `interval` frames have passed since the last spawn
    Frames { interval: u32 },
    /// Spawn once more than `period_ms` milliseconds have passed since the last spawn
    Elapsed { period_ms: u64 },
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy::Spacing {
            spacing: PIPE_SPACING,
        }
    }
}

/// Complete tuning for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === World ===
    /// Playfield width (world units)
    pub world_width: f32,
    /// Playfield height; the floor line sits at this y
    pub world_height: f32,
    /// Decorative ground drawn below the floor (render only)
    pub ground_height: f32,

    // === Bird ===
    /// Downward acceleration per frame
    pub gravity: f32,
    /// Velocity assigned by a flap (negative = up)
    pub flap_power: f32,
    /// Fixed horizontal position of the bird's left edge
    pub bird_x: f32,
    pub bird_width: f32,
    pub bird_height: f32,

    // === Pipes ===
    pub pipe_width: f32,
    /// Leftward scroll per frame
    pub pipe_speed: f32,
    /// Height of the passable band
    pub gap_height: f32,
    /// Minimum distance between the gap and the top / floor
    pub gap_margin: f32,
    /// X at which new pairs appear
    pub spawn_x: f32,
    pub spawn_policy: SpawnPolicy,

    // === Timing ===
    /// Frames per second; one frame is one simulation tick
    pub fps: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            ground_height: GROUND_HEIGHT,

            gravity: GRAVITY,
            flap_power: FLAP_POWER,
            bird_x: BIRD_X,
            bird_width: BIRD_WIDTH,
            bird_height: BIRD_HEIGHT,

            pipe_width: PIPE_WIDTH,
            pipe_speed: PIPE_SPEED,
            gap_height: GAP_HEIGHT,
            gap_margin: GAP_MARGIN,
            spawn_x: SPAWN_X,
            spawn_policy: SpawnPolicy::default(),

            fps: FPS,
        }
    }
}

impl GameConfig {
    /// The slow, forgiving tuning of the original desktop game:
    /// 800x600 window, wide pipes, a new pair every 150 frames.
    pub fn classic() -> Self {
        Self {
            world_width: 800.0,
            world_height: 600.0,
            ground_height: 0.0,

            gravity: 0.2,
            flap_power: -7.0,
            bird_x: 50.0,
            bird_width: 40.0,
            bird_height: 20.0,

            pipe_width: 180.0,
            pipe_speed: 1.0,
            gap_height: 200.0,
            gap_margin: 100.0,
            spawn_x: 850.0,
            spawn_policy: SpawnPolicy::Frames { interval: 150 },

            fps: 60,
        }
    }

    /// Top of the playfield
    #[inline]
    pub fn world_top(&self) -> f32 {
        0.0
    }

    /// Floor line; crossing it ends the session
    #[inline]
    pub fn world_floor(&self) -> f32 {
        self.world_height
    }

    /// Inclusive range of valid gap starts: `[margin, height - gap - margin]`
    pub fn gap_start_range(&self) -> (f32, f32) {
        (
            self.gap_margin,
            self.world_height - self.gap_height - self.gap_margin,
        )
    }

    /// Bird's starting y (top edge), vertically centred
    pub fn bird_start_y(&self) -> f32 {
        (self.world_height - self.bird_height) / 2.0
    }

    /// Check that the configuration describes a playable game
    pub fn validate(&self) -> ConfigResult<()> {
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        non_negative("ground_height", self.ground_height)?;
        non_negative("gravity", self.gravity)?;
        if self.flap_power >= 0.0 || !self.flap_power.is_finite() {
            return Err(ConfigError::invalid(
                "flap_power",
                format!("must be negative (upward), got {}", self.flap_power),
            ));
        }

        positive("bird_width", self.bird_width)?;
        positive("bird_height", self.bird_height)?;
        non_negative("bird_x", self.bird_x)?;
        if self.bird_height >= self.world_height {
            return Err(ConfigError::invalid(
                "bird_height",
                format!(
                    "bird ({}) does not fit in world height {}",
                    self.bird_height, self.world_height
                ),
            ));
        }
        if self.bird_x + self.bird_width > self.world_width {
            return Err(ConfigError::invalid(
                "bird_x",
                format!(
                    "bird right edge {} is past world width {}",
                    self.bird_x + self.bird_width,
                    self.world_width
                ),
            ));
        }

        positive("pipe_width", self.pipe_width)?;
        positive("pipe_speed", self.pipe_speed)?;
        positive("gap_height", self.gap_height)?;
        non_negative("gap_margin", self.gap_margin)?;
        if self.gap_height + 2.0 * self.gap_margin >= self.world_height {
            return Err(ConfigError::invalid(
                "gap_height",
                format!(
                    "gap {} plus margins 2x{} leaves no room in world height {}",
                    self.gap_height, self.gap_margin, self.world_height
                ),
            ));
        }
        if !self.spawn_x.is_finite() || self.spawn_x < self.world_width {
            return Err(ConfigError::invalid(
                "spawn_x",
                format!(
                    "pairs must spawn at or past the right edge ({}), got {}",
                    self.world_width, self.spawn_x
                ),
            ));
        }

        match self.spawn_policy {
            SpawnPolicy::Spacing { spacing } => {
                positive("spawn_policy.spacing", spacing)?;
                // Closer than one pipe width and neighbouring pairs merge into a wall
                if spacing < self.pipe_width {
                    return Err(ConfigError::invalid(
                        "spawn_policy.spacing",
                        format!(
                            "must be at least the pipe width ({}), got {}",
                            self.pipe_width, spacing
                        ),
                    ));
                }
            }
            SpawnPolicy::Frames { interval } if interval == 0 => {
                return Err(ConfigError::invalid(
                    "spawn_policy.interval",
                    "must be at least one frame",
                ));
            }
            SpawnPolicy::Elapsed { period_ms } if period_ms == 0 => {
                return Err(ConfigError::invalid(
                    "spawn_policy.period_ms",
                    "must be at least one millisecond",
                ));
            }
            _ => {}
        }

        if self.fps == 0 {
            return Err(ConfigError::invalid("fps", "must be at least 1"));
        }

        Ok(())
    }

    /// Parse a JSON config (missing fields take defaults) and validate it
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }
}

fn positive(field: &'static str, value: f32) -> ConfigResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be positive, got {value}"),
        ))
    }
}

fn non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be zero or positive, got {value}"),
        ))
    }
}
