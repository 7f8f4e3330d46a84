// Keyboard listener: key events -> held keys -> target velocity
//
// Runs on its own blocking thread. Every press/release that changes the held
// set re-resolves the target velocity inline and stores it in the register;
// the emitter picks it up on its next tick.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::POLL_INTERVAL;
use crate::error::Result;
use crate::keys::{KeyAction, KeyStateSet, RawKeyEvent};
use crate::messages::Twist;
use crate::register::TargetWriter;
use crate::resolver::VelocityResolver;
use crate::shutdown::ShutdownSignal;

/// What a key source produced within one poll window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    Event(RawKeyEvent),
    /// Nothing arrived before the timeout
    Idle,
    /// The user asked to quit (Ctrl+C while the terminal is in raw mode)
    Interrupt,
    /// The source is gone and will produce nothing more
    Closed,
}

/// Blocking source of raw key events (the keyboard hook)
pub trait KeySource: Send + 'static {
    /// Wait at most `timeout` for the next event
    fn poll(&mut self, timeout: Duration) -> Result<Polled>;
}

/// Why the listener stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// Shutdown was signalled elsewhere
    Cancelled,
    /// The source reported a user interrupt
    Interrupted,
    Closed,
    Failed,
    Panicked,
}

pub struct InputListener {
    keys: KeyStateSet,
    resolver: VelocityResolver,
    target: TargetWriter,
}

impl InputListener {
    pub fn new(resolver: VelocityResolver, target: TargetWriter) -> Self {
        Self {
            keys: KeyStateSet::new(),
            resolver,
            target,
        }
    }

    /// Apply one raw event. Returns the new target if the held set changed.
    pub fn handle(&self, event: &RawKeyEvent) -> Option<Twist> {
        let changed = match event.action {
            KeyAction::Down => self.keys.press(&event.id),
            KeyAction::Up => self.keys.release(&event.id),
        };
        if !changed {
            return None;
        }

        let held = self.keys.snapshot();
        let twist = self.resolver.resolve(held);
        self.target.store(twist);
        debug!("Keys {:?} -> target {:?}", held, twist);
        Some(twist)
    }

    /// Pump events from `source` until shutdown or the source ends
    pub fn run<K: KeySource>(self, mut source: K, shutdown: ShutdownSignal) -> ListenerExit {
        loop {
            if shutdown.is_triggered() {
                return ListenerExit::Cancelled;
            }

            match source.poll(POLL_INTERVAL) {
                Ok(Polled::Event(event)) => {
                    // A key arriving after shutdown must not re-arm motion
                    if shutdown.is_triggered() {
                        return ListenerExit::Cancelled;
                    }
                    self.handle(&event);
                }
                Ok(Polled::Idle) => {}
                Ok(Polled::Interrupt) => {
                    info!("Interrupt from keyboard");
                    shutdown.trigger();
                    return ListenerExit::Interrupted;
                }
                Ok(Polled::Closed) => {
                    info!("Keyboard input closed");
                    self.target.store(Twist::stop());
                    return ListenerExit::Closed;
                }
                Err(e) => {
                    warn!("Keyboard listener failed: {}", e);
                    // No more releases can arrive, so held keys are meaningless
                    self.target.store(Twist::stop());
                    return ListenerExit::Failed;
                }
            }
        }
    }
}
