// Keyboard teleop for the LeKiwi base
//
// Key events -> held keys -> target velocity -> change-gated 10 Hz publish,
// with an unconditional stop command on exit.

pub mod config;
pub mod emitter;
pub mod error;
pub mod keys;
pub mod listener;
pub mod messages;
pub mod register;
pub mod resolver;
pub mod runtime;
pub mod shutdown;
pub mod terminal;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{Result, TeleopError};
