// Teleop lifecycle: keyboard listener + 10 Hz emitter + stop on exit
//
// Shutdown order matters: the listener stops taking keys, the emitter finishes
// any tick in flight, and only then is the unconditional stop command sent.
// Nothing can publish after the stop.

use std::sync::Arc;

use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{info, warn};

// local imports
use crate::config::{Config, LISTENER_JOIN_TIMEOUT};
use crate::emitter::{Emitter, EmitterReport};
use crate::error::Result;
use crate::listener::{InputListener, KeySource, ListenerExit};
use crate::register::target_register;
use crate::resolver::{Speeds, VelocityResolver};
use crate::shutdown::{ShutdownHandler, ShutdownSignal, StopOutcome};
use crate::terminal::{TerminalGuard, TerminalKeySource};
use crate::transport::{CommandSink, ZenohSink};

/// Summary of one teleop session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveReport {
    pub emitter: EmitterReport,
    /// None if the listener was still blocked when shutdown gave up waiting
    pub listener: Option<ListenerExit>,
    pub stop: StopOutcome,
}

/// Run the teleop core until `shutdown` fires or the key source ends.
pub async fn drive<K: KeySource, S: CommandSink>(
    source: K,
    sink: Arc<S>,
    config: &Config,
    shutdown: ShutdownSignal,
) -> Result<DriveReport> {
    let speeds = config.speeds()?;
    let period = config.tick_period()?;
    let send_timeout = config.send_timeout()?;

    let (writer, reader) = target_register();
    let listener = InputListener::new(VelocityResolver::new(speeds), writer);
    let stopper = ShutdownHandler::new(Arc::clone(&sink), send_timeout);

    let mut listener_task = {
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || listener.run(source, shutdown))
    };
    let emitter_task = tokio::spawn(
        Emitter::new(reader, Arc::clone(&sink), period, send_timeout).run(shutdown.clone()),
    );

    let mut listener_exit = None;
    tokio::select! {
        _ = shutdown.triggered() => {}
        joined = &mut listener_task => {
            listener_exit = Some(listener_outcome(joined));
        }
    }

    // 1. Stop accepting keys
    shutdown.trigger();
    if listener_exit.is_none() {
        listener_exit = match timeout(LISTENER_JOIN_TIMEOUT, &mut listener_task).await {
            Ok(joined) => Some(listener_outcome(joined)),
            Err(_) => {
                warn!("Key listener did not stop within {:?}", LISTENER_JOIN_TIMEOUT);
                None
            }
        };
    }

    // 2. Drain the in-flight tick
    let emitter = match emitter_task.await {
        Ok(report) => report,
        Err(e) => {
            warn!("Emitter task failed: {}", e);
            EmitterReport::default()
        }
    };

    // 3. Stop the robot
    let stop = stopper.send_stop().await;

    Ok(DriveReport {
        emitter,
        listener: listener_exit,
        stop,
    })
}

fn listener_outcome(joined: std::result::Result<ListenerExit, JoinError>) -> ListenerExit {
    match joined {
        Ok(exit) => exit,
        Err(e) => {
            warn!("Key listener panicked: {}", e);
            ListenerExit::Panicked
        }
    }
}

fn print_instructions(speeds: Speeds) {
    info!("---------------------------");
    info!("Drive the robot with WASD:");
    info!("   W: forward");
    info!("   S: backward");
    info!("   A: turn left");
    info!("   D: turn right");
    info!("---------------------------");
    info!("Linear speed: {} m/s", speeds.linear);
    info!("Angular speed: {} rad/s", speeds.angular);
    info!("---------------------------");
    info!("Press Ctrl+C to exit.");
}

pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let speeds = config.speeds()?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let sink = Arc::new(ZenohSink::declare(&session, config.topic.clone()).await?);
    info!("Publishing to: {}", config.topic);

    print_instructions(speeds);

    let shutdown = ShutdownSignal::new();
    {
        // Covers SIGINT from outside the terminal; in raw mode Ctrl+C arrives as a key
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received");
                shutdown.trigger();
            }
        });
    }

    let report = {
        let guard = TerminalGuard::enter()?;
        if !guard.reports_releases() {
            warn!(
                "Terminal does not report key releases; keys release after {}ms without repeat",
                config.release_timeout_ms
            );
        }
        let source = TerminalKeySource::new(guard.reports_releases(), config.release_timeout()?);
        drive(source, Arc::clone(&sink), &config, shutdown).await
    }?;

    info!(
        "Teleop stopped: {} commands published, stop {:?}",
        report.emitter.emissions, report.stop
    );

    drop(sink);
    session.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Twist;
    use crate::testing::{down, up, ChannelKeySource, RecordingSink};
    use std::time::Duration;

    fn fast_config() -> Config {
        Config {
            tick_ms: 10,
            ..Config::default()
        }
    }

    /// Wait until the sink has seen `n` commands
    async fn wait_for_sent(sink: &RecordingSink, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while sink.sent().len() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} commands, got {:?}",
                n,
                sink.sent()
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_end_to_end_scenario() {
        let sink = Arc::new(RecordingSink::new());
        let (keys, source) = ChannelKeySource::new();
        let shutdown = ShutdownSignal::new();

        let session = {
            let sink = Arc::clone(&sink);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { drive(source, sink, &fast_config(), shutdown).await })
        };

        keys.send(down('w')).unwrap();
        wait_for_sent(&sink, 1).await;
        keys.send(down('a')).unwrap();
        wait_for_sent(&sink, 2).await;
        keys.send(up('w')).unwrap();
        wait_for_sent(&sink, 3).await;
        keys.send(up('a')).unwrap();
        wait_for_sent(&sink, 4).await;

        // Holding still for several ticks sends nothing new
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.sent().len(), 4);

        shutdown.trigger();
        let report = session.await.unwrap().unwrap();

        assert_eq!(
            sink.sent(),
            vec![
                Twist::new(0.5, 0.0),
                Twist::new(0.5, 1.0),
                Twist::new(0.0, 1.0),
                Twist::stop(),
                // unconditional stop from shutdown
                Twist::stop(),
            ]
        );
        assert_eq!(report.emitter.emissions, 4);
        assert_eq!(report.listener, Some(ListenerExit::Cancelled));
        assert_eq!(report.stop, StopOutcome::Sent);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_is_last_while_keys_held() {
        let sink = Arc::new(RecordingSink::new());
        let (keys, source) = ChannelKeySource::new();
        let shutdown = ShutdownSignal::new();

        let session = {
            let sink = Arc::clone(&sink);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { drive(source, sink, &fast_config(), shutdown).await })
        };

        keys.send(down('s')).unwrap();
        keys.send(down('d')).unwrap();
        wait_for_sent(&sink, 1).await;
        shutdown.trigger();
        // Late key after shutdown
        let _ = keys.send(down('w'));
        let report = session.await.unwrap().unwrap();

        let sent = sink.sent();
        assert_eq!(sent.last(), Some(&Twist::stop()));
        assert_eq!(sent.iter().filter(|t| **t == Twist::stop()).count(), 1);
        assert!(!sent.contains(&Twist::new(0.5, -1.0)));
        assert_eq!(report.stop, StopOutcome::Sent);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_keyboard_interrupt_shuts_down() {
        let sink = Arc::new(RecordingSink::new());
        let (keys, source) = ChannelKeySource::new();
        keys.send(crate::listener::Polled::Interrupt).unwrap();

        let report = drive(source, Arc::clone(&sink), &fast_config(), ShutdownSignal::new())
            .await
            .unwrap();

        assert_eq!(report.listener, Some(ListenerExit::Interrupted));
        assert_eq!(report.stop, StopOutcome::Sent);
        assert_eq!(sink.sent(), vec![Twist::stop()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_input_still_stops() {
        let sink = Arc::new(RecordingSink::new());
        let (keys, source) = ChannelKeySource::new();
        keys.send(down('w')).unwrap();
        drop(keys);

        let report = drive(source, Arc::clone(&sink), &fast_config(), ShutdownSignal::new())
            .await
            .unwrap();

        assert_eq!(report.listener, Some(ListenerExit::Closed));
        assert_eq!(report.stop, StopOutcome::Sent);
        assert_eq!(sink.sent().last(), Some(&Twist::stop()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_listener_panic_still_stops() {
        // Holds W, gives the emitter time to publish it, then crashes
        struct Exploding {
            polls: u32,
        }
        impl KeySource for Exploding {
            fn poll(&mut self, _timeout: Duration) -> Result<crate::listener::Polled> {
                self.polls += 1;
                if self.polls == 1 {
                    return Ok(down('w'));
                }
                std::thread::sleep(Duration::from_millis(100));
                panic!("keyboard hook crashed");
            }
        }

        let sink = Arc::new(RecordingSink::new());
        let report = drive(
            Exploding { polls: 0 },
            Arc::clone(&sink),
            &fast_config(),
            ShutdownSignal::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.listener, Some(ListenerExit::Panicked));
        // The emitter kept running through the crash and wound down cleanly
        assert_eq!(report.emitter.emissions, 1);
        assert_eq!(report.emitter.last_emitted, Some(Twist::new(0.5, 0.0)));
        assert_eq!(report.stop, StopOutcome::Sent);
        assert_eq!(sink.sent(), vec![Twist::new(0.5, 0.0), Twist::stop()]);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_start() {
        let sink = Arc::new(RecordingSink::new());
        let (_keys, source) = ChannelKeySource::new();
        let config = Config {
            linear_speed: -1.0,
            ..Config::default()
        };
        let result = drive(source, Arc::clone(&sink), &config, ShutdownSignal::new()).await;
        assert!(result.is_err());
        assert!(sink.sent().is_empty());
    }
}
