// Shutdown signalling and the final stop command

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::messages::Twist;
use crate::transport::{send_with_timeout, CommandSink};

/// One-way shutdown flag shared by the listener thread, the emitter task and
/// the lifecycle controller. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Non-blocking check, usable from the blocking listener thread
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so this only returns on trigger
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Sent,
    Failed,
    /// A stop was already attempted; nothing sent
    AlreadyAttempted,
}

/// Sends the final zero-velocity command straight to the transport,
/// regardless of what was last emitted.
pub struct ShutdownHandler<S> {
    sink: Arc<S>,
    send_timeout: Duration,
    attempted: AtomicBool,
}

impl<S: CommandSink> ShutdownHandler<S> {
    pub fn new(sink: Arc<S>, send_timeout: Duration) -> Self {
        Self {
            sink,
            send_timeout,
            attempted: AtomicBool::new(false),
        }
    }

    /// Attempt the stop command. Only the first call sends.
    pub async fn send_stop(&self) -> StopOutcome {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return StopOutcome::AlreadyAttempted;
        }

        info!("Sending stop command...");
        match send_with_timeout(&*self.sink, Twist::stop(), self.send_timeout).await {
            Ok(()) => StopOutcome::Sent,
            Err(e) => {
                warn!("Failed to send stop command: {}", e);
                StopOutcome::Failed
            }
        }
    }
}
