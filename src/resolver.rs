// Held keys -> target velocity
//
// Per axis, the first key checked wins when both directions are held:
// forward over backward, turn-left over turn-right.

use crate::keys::{DriveKey, KeySet};
use crate::messages::Twist;

/// Speed magnitudes, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speeds {
    pub linear: f64,
    pub angular: f64,
}

impl Speeds {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VelocityResolver {
    speeds: Speeds,
}

impl VelocityResolver {
    pub fn new(speeds: Speeds) -> Self {
        Self { speeds }
    }

    pub fn resolve(&self, keys: KeySet) -> Twist {
        let linear = if keys.contains(DriveKey::Forward) {
            self.speeds.linear
        } else if keys.contains(DriveKey::Backward) {
            -self.speeds.linear
        } else {
            0.0
        };

        let angular = if keys.contains(DriveKey::TurnLeft) {
            self.speeds.angular
        } else if keys.contains(DriveKey::TurnRight) {
            -self.speeds.angular
        } else {
            0.0
        };

        Twist::new(linear, angular)
    }
}
