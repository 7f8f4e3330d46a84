// Periodic emitter with change gate
//
// Each tick samples the target register, and the gate decides whether the
// sample differs from what was last delivered. Only differing samples are
// sent, so a held key produces one command, not one per tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::messages::Twist;
use crate::register::TargetReader;
use crate::shutdown::ShutdownSignal;
use crate::transport::{send_with_timeout, CommandSink};

/// Gate state for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateState {
    /// Sample equals the last emitted command
    Idle,
    /// Sample differs and is ready to send
    Armed(Twist),
}

/// Remembers the last command that was actually delivered
#[derive(Debug, Default)]
pub struct ChangeGate {
    last_emitted: Option<Twist>,
}

impl ChangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact comparison against the last emission. Before anything has been
    /// emitted the robot is assumed stationary, so a stop sample stays Idle.
    pub fn check(&self, sample: Twist) -> GateState {
        if self.last_emitted.unwrap_or_default() == sample {
            GateState::Idle
        } else {
            GateState::Armed(sample)
        }
    }

    /// Armed -> Idle, called only after a successful send
    pub fn mark_emitted(&mut self, twist: Twist) {
        self.last_emitted = Some(twist);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmitterReport {
    pub emissions: u64,
    pub failed_sends: u64,
    pub last_emitted: Option<Twist>,
}

pub struct Emitter<S> {
    gate: ChangeGate,
    target: TargetReader,
    sink: Arc<S>,
    period: Duration,
    send_timeout: Duration,
    report: EmitterReport,
}

impl<S: CommandSink> Emitter<S> {
    pub fn new(target: TargetReader, sink: Arc<S>, period: Duration, send_timeout: Duration) -> Self {
        Self {
            gate: ChangeGate::new(),
            target,
            sink,
            period,
            send_timeout,
            report: EmitterReport::default(),
        }
    }

    /// One tick. Returns the command sent, if any.
    ///
    /// A failed send leaves the gate untouched, so the same target is still
    /// Armed on the next tick.
    pub async fn tick(&mut self) -> Option<Twist> {
        let GateState::Armed(twist) = self.gate.check(self.target.load()) else {
            return None;
        };

        match send_with_timeout(&*self.sink, twist, self.send_timeout).await {
            Ok(()) => {
                self.gate.mark_emitted(twist);
                self.report.emissions += 1;
                self.report.last_emitted = Some(twist);
                info!(
                    "Publishing: linear {:.2}, angular {:.2}",
                    twist.linear, twist.angular
                );
                Some(twist)
            }
            Err(e) => {
                self.report.failed_sends += 1;
                warn!("Failed to publish {:?}: {}", twist, e);
                None
            }
        }
    }

    /// Tick until shutdown. A tick already in progress runs to completion.
    pub async fn run(mut self, shutdown: ShutdownSignal) -> EmitterReport {
        let mut ticker = interval(self.period);
        // Late ticks are pushed back rather than bursted
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.report
    }
}
