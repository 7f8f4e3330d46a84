// Message types published by the teleop node

use serde::{Deserialize, Serialize};

// Velocity command teleop -> base
// linear is forward speed (m/s), angular is yaw rate (rad/s, positive = counter-clockwise)
// Default is the all-zero stop command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Twist {
    pub linear: f64,
    pub angular: f64,
}

impl Twist {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// The zero-velocity command
    pub fn stop() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&Twist::new(0.5, -1.0)).unwrap();
        assert_eq!(json, r#"{"linear":0.5,"angular":-1.0}"#);
    }

    #[test]
    fn test_stop_is_zero() {
        assert_eq!(Twist::stop(), Twist::new(0.0, 0.0));
        assert_ne!(Twist::new(0.0, 1.0), Twist::stop());
    }
}
