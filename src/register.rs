// Single-slot register holding the current target velocity
//
// Written by the key listener after every state change, sampled by the emitter
// on each tick. Backed by a tokio watch channel: a store replaces the whole
// Twist at once, so readers never observe a half-written (linear, angular) pair.

use tokio::sync::watch;

use crate::messages::Twist;

/// Write half, owned by the listener
#[derive(Debug)]
pub struct TargetWriter {
    tx: watch::Sender<Twist>,
}

/// Read half, cloned into the emitter and the shutdown path
#[derive(Debug, Clone)]
pub struct TargetReader {
    rx: watch::Receiver<Twist>,
}

/// Create a register starting at the stop command
pub fn target_register() -> (TargetWriter, TargetReader) {
    let (tx, rx) = watch::channel(Twist::stop());
    (TargetWriter { tx }, TargetReader { rx })
}

impl TargetWriter {
    /// Replace the target. Never blocks and works with or without readers.
    pub fn store(&self, twist: Twist) {
        self.tx.send_replace(twist);
    }
}

impl TargetReader {
    /// Snapshot of the current target
    pub fn load(&self) -> Twist {
        *self.rx.borrow()
    }
}
