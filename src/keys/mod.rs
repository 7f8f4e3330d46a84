// Keyboard input model for teleop
//
// Provides:
// - The closed set of drive keys and the W/S/A/D key map
// - Classification of raw, open-alphabet key events
// - A concurrency-safe set of currently held drive keys

mod classify;
mod state;

pub use classify::{classify, Classified, DriveKey, KeyAction, KeyId, RawKeyEvent};
pub use state::{KeySet, KeyStateSet};
