// Test doubles for the key source and the transport

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Result, TeleopError};
use crate::keys::{KeyId, RawKeyEvent};
use crate::listener::{KeySource, Polled};
use crate::messages::Twist;
use crate::transport::CommandSink;

/// Records every command it is handed
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Twist>>,
    failures: AtomicUsize,
    hang: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Twist> {
        self.sent.lock().unwrap().clone()
    }

    /// Fail the next `n` sends with a transport error
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Make every send block forever
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }
}

impl CommandSink for RecordingSink {
    async fn send(&self, twist: Twist) -> Result<()> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TeleopError::Transport("injected failure".into()));
        }
        self.sent.lock().unwrap().push(twist);
        Ok(())
    }
}

/// Key source fed from a channel, standing in for the keyboard hook
pub struct ChannelKeySource {
    rx: Receiver<Polled>,
}

impl ChannelKeySource {
    pub fn new() -> (Sender<Polled>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl KeySource for ChannelKeySource {
    fn poll(&mut self, timeout: Duration) -> Result<Polled> {
        match self.rx.recv_timeout(timeout) {
            Ok(polled) => Ok(polled),
            Err(RecvTimeoutError::Timeout) => Ok(Polled::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(Polled::Closed),
        }
    }
}

pub fn down(c: char) -> Polled {
    Polled::Event(RawKeyEvent::down(KeyId::Char(c)))
}

pub fn up(c: char) -> Polled {
    Polled::Event(RawKeyEvent::up(KeyId::Char(c)))
}
