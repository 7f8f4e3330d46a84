// Speeds, timing, topics
use std::time::Duration;

use clap::Parser;

use crate::error::{Result, TeleopError};
use crate::resolver::Speeds;

// Emission tick period (10 Hz)
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

// Upper bound on a single transport send before it is logged as failed
pub const SEND_TIMEOUT: Duration = Duration::from_millis(50);

// How long the key source blocks waiting for input before rechecking shutdown
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

// Terminals without release reporting: a key counts as released after this long
// without a press/repeat. Must exceed the OS auto-repeat delay (~500ms).
pub const RELEASE_TIMEOUT: Duration = Duration::from_millis(600);

// How long shutdown waits for the listener thread before giving up on it
pub const LISTENER_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

// Speed magnitudes (m/s, rad/s)
pub const DEFAULT_LINEAR_SPEED: f64 = 0.5;
pub const DEFAULT_ANGULAR_SPEED: f64 = 1.0;

// Zenoh topic
pub const TOPIC_CMD_VEL: &str = "cmd_vel";

/// Startup configuration. Read once, immutable afterwards.
#[derive(Debug, Clone, Parser)]
#[command(name = "lekiwi-teleop", about = "Keyboard teleop for the LeKiwi base")]
pub struct Config {
    /// Linear speed magnitude (m/s) commanded while W or S is held
    #[arg(long, default_value_t = DEFAULT_LINEAR_SPEED)]
    pub linear_speed: f64,

    /// Angular speed magnitude (rad/s) commanded while A or D is held
    #[arg(long, default_value_t = DEFAULT_ANGULAR_SPEED)]
    pub angular_speed: f64,

    /// Key expression velocity commands are published on
    #[arg(long, default_value = TOPIC_CMD_VEL)]
    pub topic: String,

    /// Emission tick period in milliseconds
    #[arg(long, default_value_t = TICK_PERIOD.as_millis() as u64)]
    pub tick_ms: u64,

    /// Per-send transport timeout in milliseconds
    #[arg(long, default_value_t = SEND_TIMEOUT.as_millis() as u64)]
    pub send_timeout_ms: u64,

    /// Synthetic release delay used when the terminal cannot report key releases
    #[arg(long, default_value_t = RELEASE_TIMEOUT.as_millis() as u64)]
    pub release_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            linear_speed: DEFAULT_LINEAR_SPEED,
            angular_speed: DEFAULT_ANGULAR_SPEED,
            topic: TOPIC_CMD_VEL.to_string(),
            tick_ms: TICK_PERIOD.as_millis() as u64,
            send_timeout_ms: SEND_TIMEOUT.as_millis() as u64,
            release_timeout_ms: RELEASE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Config {
    /// Validated speed magnitudes
    pub fn speeds(&self) -> Result<Speeds> {
        for (name, value) in [
            ("linear_speed", self.linear_speed),
            ("angular_speed", self.angular_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TeleopError::Config(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        Ok(Speeds::new(self.linear_speed, self.angular_speed))
    }

    pub fn tick_period(&self) -> Result<Duration> {
        non_zero_millis("tick_ms", self.tick_ms)
    }

    pub fn send_timeout(&self) -> Result<Duration> {
        non_zero_millis("send_timeout_ms", self.send_timeout_ms)
    }

    pub fn release_timeout(&self) -> Result<Duration> {
        non_zero_millis("release_timeout_ms", self.release_timeout_ms)
    }

    /// Check everything up front so a bad flag fails before the terminal is touched
    pub fn validate(&self) -> Result<()> {
        self.speeds()?;
        self.tick_period()?;
        self.send_timeout()?;
        self.release_timeout()?;
        if self.topic.trim().is_empty() {
            return Err(TeleopError::Config("topic must not be empty".into()));
        }
        Ok(())
    }
}

fn non_zero_millis(name: &str, ms: u64) -> Result<Duration> {
    if ms == 0 {
        return Err(TeleopError::Config(format!("{name} must be greater than 0")));
    }
    Ok(Duration::from_millis(ms))
}
