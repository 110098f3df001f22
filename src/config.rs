// Run configuration for trs-inspect

use std::str::FromStr;
use std::time::Duration;

use crate::error::{DecomposeError, DecomposeResult};

pub const FRAMES_VAR: &str = "TRS_FRAMES";
pub const TICK_MS_VAR: &str = "TRS_TICK_MS";
pub const ANGULAR_SPEED_VAR: &str = "TRS_ANGULAR_SPEED";

/// How long the demo runs and how fast the demo object spins.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of ticks to run
    pub frames: u32,
    /// Time between ticks
    pub tick: Duration,
    /// Spin of the demo object around Y, in radians per second
    pub angular_speed: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames: 120,
            tick: Duration::from_millis(16), // ~60 FPS
            angular_speed: 2.0,
        }
    }
}

impl Config {
    /// Reads overrides from the process environment.
    pub fn from_env() -> DecomposeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DecomposeResult<Self> {
        let mut config = Self::default();

        if let Some(frames) = parse_var::<u32>(&lookup, FRAMES_VAR)? {
            config.frames = frames;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, TICK_MS_VAR)? {
            if ms == 0 {
                return Err(invalid(TICK_MS_VAR, "0"));
            }
            config.tick = Duration::from_millis(ms);
        }
        if let Some(speed) = parse_var::<f32>(&lookup, ANGULAR_SPEED_VAR)? {
            if !speed.is_finite() {
                return Err(invalid(ANGULAR_SPEED_VAR, &speed.to_string()));
            }
            config.angular_speed = speed;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> DecomposeResult<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &value)),
    }
}

fn invalid(key: &str, value: &str) -> DecomposeError {
    DecomposeError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}
