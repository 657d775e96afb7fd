//! Supervised worker loops and recovery policies
//!
//! A worker is a unit of state plus a message handler. The supervisor runs
//! the worker's mailbox loop and, when `handle` returns an error (an internal
//! fault, distinct from a reported failure response, which is normal control
//! flow), applies the worker's recovery policy:
//!
//! - `Resume`: swallow the fault, keep the worker's state, keep going.
//! - `Restart`: rebuild the worker from its factory immediately. All
//!   accumulated state is lost.
//! - `RestartWithBackoff`: rebuild after a delay that doubles per consecutive
//!   fault, capped and jittered.
//!
//! The mailbox and any queued messages survive a restart; only the faulting
//! message is lost. The consecutive-fault counter resets on the first
//! successfully handled message. Restart counts are unbounded; the backoff
//! cap bounds the restart rate.

use crate::error::Result;
use crate::mailbox::{self, Handle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// A supervised pipeline component.
#[async_trait::async_trait]
pub trait Worker: Send + 'static {
    /// Message type this worker consumes.
    type Msg: Send + 'static;

    /// Process one message. Returning `Err` is an internal fault and
    /// escalates to the recovery policy.
    async fn handle(&mut self, msg: Self::Msg) -> Result<()>;
}

/// Exponential backoff settings for `RestartWithBackoff`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay before the first restart
    pub initial_delay_ms: u64,
    /// Cap on the restart delay
    pub max_delay_ms: u64,
    /// Jitter factor: the delay is multiplied by `1 + U(0,1) * jitter`
    pub jitter: f64,
}

impl BackoffPolicy {
    /// Create a backoff policy.
    #[must_use]
    pub fn new(initial_delay: Duration, max_delay: Duration, jitter: f64) -> Self {
        Self {
            initial_delay_ms: initial_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
            jitter,
        }
    }

    /// Delay before restart number `consecutive_faults` (1-based): doubles
    /// each fault, capped, then jittered.
    #[must_use]
    pub fn delay_for(&self, consecutive_faults: u32) -> Duration {
        let exp = consecutive_faults.saturating_sub(1).min(31);
        let base = self
            .initial_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        let jittered = base as f64 * (1.0 + rand::random::<f64>() * self.jitter);
        Duration::from_millis(jittered as u64)
    }
}

/// What the supervisor does with a worker after an internal fault.
#[derive(Debug, Clone, Copy)]
pub enum RecoveryPolicy {
    /// Keep the worker and its state; continue with the next message
    Resume,
    /// Rebuild the worker immediately; state is lost
    Restart,
    /// Rebuild the worker after an exponential, jittered delay; state is lost
    RestartWithBackoff(BackoffPolicy),
}

/// Spawn a worker under supervision and return its mailbox handle.
///
/// The factory is invoked once at startup and again on every restart. It
/// receives the worker's own handle so stateful workers (the orchestrator)
/// can address their own mailbox; stateless workers ignore it.
pub fn spawn_supervised<W, F>(
    name: &'static str,
    policy: RecoveryPolicy,
    mut factory: F,
) -> Handle<W::Msg>
where
    W: Worker,
    F: FnMut(Handle<W::Msg>) -> W + Send + 'static,
{
    let (handle, mut rx) = mailbox::channel(name);
    let self_handle = handle.clone();

    tokio::spawn(async move {
        let mut worker = factory(self_handle.clone());
        let mut consecutive_faults: u32 = 0;
        debug!(worker = name, policy = ?policy, "worker started");

        while let Some(msg) = rx.recv().await {
            match worker.handle(msg).await {
                Ok(()) => consecutive_faults = 0,
                Err(e) => {
                    consecutive_faults += 1;
                    error!(
                        worker = name,
                        error = %e,
                        faults = consecutive_faults,
                        "worker fault"
                    );
                    match policy {
                        RecoveryPolicy::Resume => {
                            debug!(worker = name, "resuming with state intact");
                        }
                        RecoveryPolicy::Restart => {
                            warn!(worker = name, "restarting, state discarded");
                            worker = factory(self_handle.clone());
                        }
                        RecoveryPolicy::RestartWithBackoff(backoff) => {
                            let delay = backoff.delay_for(consecutive_faults);
                            warn!(
                                worker = name,
                                delay_ms = delay.as_millis() as u64,
                                "restarting after backoff, state discarded"
                            );
                            tokio::time::sleep(delay).await;
                            worker = factory(self_handle.clone());
                        }
                    }
                }
            }
        }
        debug!(worker = name, "mailbox closed, worker stopping");
    });

    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tokio::sync::oneshot;

    /// Counts handled messages; faults when told to.
    struct Flaky {
        handled: u32,
    }

    enum FlakyMsg {
        Fault,
        Count(oneshot::Sender<u32>),
    }

    #[async_trait::async_trait]
    impl Worker for Flaky {
        type Msg = FlakyMsg;

        async fn handle(&mut self, msg: FlakyMsg) -> Result<()> {
            match msg {
                FlakyMsg::Fault => Err(Error::ReplyDropped { worker: "flaky" }),
                FlakyMsg::Count(reply) => {
                    self.handled += 1;
                    let _ = reply.send(self.handled);
                    Ok(())
                }
            }
        }
    }

    const ASK: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_resume_keeps_state() {
        let handle = spawn_supervised("flaky", RecoveryPolicy::Resume, |_| Flaky { handled: 0 });

        let n = handle.ask(ASK, FlakyMsg::Count).await.unwrap();
        assert_eq!(n, 1);

        handle.tell(FlakyMsg::Fault);

        // State survives the fault under Resume
        let n = handle.ask(ASK, FlakyMsg::Count).await.unwrap();
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn test_restart_discards_state() {
        let handle = spawn_supervised("flaky", RecoveryPolicy::Restart, |_| Flaky { handled: 0 });

        let n = handle.ask(ASK, FlakyMsg::Count).await.unwrap();
        assert_eq!(n, 1);

        handle.tell(FlakyMsg::Fault);

        // Rebuilt from the factory: counter starts over
        let n = handle.ask(ASK, FlakyMsg::Count).await.unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn test_queued_messages_survive_restart() {
        let handle = spawn_supervised("flaky", RecoveryPolicy::Restart, |_| Flaky { handled: 0 });

        // Fault first, then two counts already queued behind it
        handle.tell(FlakyMsg::Fault);
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        handle.tell(FlakyMsg::Count(tx1));
        handle.tell(FlakyMsg::Count(tx2));

        assert_eq!(rx1.await.unwrap(), 1);
        assert_eq!(rx2.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_backoff_restart_recovers() {
        let policy = RecoveryPolicy::RestartWithBackoff(BackoffPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 5,
            jitter: 0.0,
        });
        let handle = spawn_supervised("flaky", policy, |_| Flaky { handled: 0 });

        handle.tell(FlakyMsg::Fault);
        handle.tell(FlakyMsg::Fault);

        let n = handle.ask(ASK, FlakyMsg::Count).await.unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = BackoffPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 400,
            jitter: 0.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        // Capped
        assert_eq!(policy.delay_for(4), Duration::from_millis(400));
        assert_eq!(policy.delay_for(40), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let policy = BackoffPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            jitter: 0.2,
        };
        for _ in 0..50 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(120));
        }
    }
}
