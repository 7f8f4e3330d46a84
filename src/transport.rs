// Outbound transport for velocity commands
//
// The emitter and the shutdown path only see the CommandSink trait. The
// production sink publishes JSON over Zenoh; tests swap in a recording sink.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::error::{Result, TeleopError};
use crate::messages::Twist;

/// Fire-and-forget delivery of one velocity command
pub trait CommandSink: Send + Sync + 'static {
    fn send(&self, twist: Twist) -> impl Future<Output = Result<()>> + Send;
}

/// Send through `sink`, giving up after `limit`
pub async fn send_with_timeout<S: CommandSink>(sink: &S, twist: Twist, limit: Duration) -> Result<()> {
    match timeout(limit, sink.send(twist)).await {
        Ok(result) => result,
        Err(_) => Err(TeleopError::SendTimeout(limit)),
    }
}

/// Publishes commands on a Zenoh key expression
pub struct ZenohSink {
    publisher: zenoh::pubsub::Publisher<'static>,
}

impl ZenohSink {
    pub async fn declare(session: &zenoh::Session, topic: String) -> Result<Self> {
        let publisher = session.declare_publisher(topic).await?;
        Ok(Self { publisher })
    }
}

impl CommandSink for ZenohSink {
    async fn send(&self, twist: Twist) -> Result<()> {
        let json = serde_json::to_string(&twist)?;
        debug!("put {} <- {}", self.publisher.key_expr(), json);
        self.publisher.put(json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    #[tokio::test]
    async fn test_send_with_timeout_delivers() {
        let sink = RecordingSink::new();
        send_with_timeout(&sink, Twist::new(0.5, 0.0), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(sink.sent(), vec![Twist::new(0.5, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_with_timeout_gives_up_on_hung_sink() {
        let sink = RecordingSink::new();
        sink.set_hang(true);
        let err = send_with_timeout(&sink, Twist::stop(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TeleopError::SendTimeout(d) if d == Duration::from_millis(50)));
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_with_timeout_passes_errors_through() {
        let sink = RecordingSink::new();
        sink.fail_next(1);
        let err = send_with_timeout(&sink, Twist::stop(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TeleopError::Transport(_)));
    }
}
