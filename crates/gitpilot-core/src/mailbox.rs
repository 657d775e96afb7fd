//! Mailboxes and messaging disciplines
//!
//! Every component in the pipeline is a single logical worker with a private,
//! unbounded inbound queue, processed strictly in arrival order by one loop.
//! That serialization is the only synchronization mechanism for component
//! state; there are no locks around the session map, the audit collections,
//! or the pattern tables.
//!
//! Two disciplines live here:
//! - `tell`: fire-and-forget, no reply, never fails the sender.
//! - `ask`: the caller allocates a oneshot reply slot, hands its sender half
//!   to the callee inside the message, and awaits the receiver under a
//!   deadline. On timeout the caller gets an error; the callee is not
//!   notified and its late reply lands on a dropped receiver, where it is
//!   silently discarded.
//!
//! The third discipline (response redirection) is not a primitive: the
//! orchestrator implements it by always substituting its own mailbox as the
//! reply target for downstream stage asks.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Sender side of a worker's mailbox.
pub struct Handle<M> {
    name: &'static str,
    tx: mpsc::UnboundedSender<M>,
}

// Manual Clone: M itself need not be Clone.
impl<M> Clone for Handle<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<M: Send + 'static> Handle<M> {
    /// The worker name this handle addresses.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fire-and-forget send. A closed mailbox drops the message with a log
    /// line; the sender is never failed.
    pub fn tell(&self, msg: M) {
        if self.tx.send(msg).is_err() {
            warn!(worker = self.name, "mailbox closed, message dropped");
        }
    }

    /// Request/response with a deadline.
    ///
    /// `make` receives the oneshot reply sender and must embed it in the
    /// outgoing message.
    ///
    /// # Errors
    ///
    /// - [`Error::MailboxClosed`] if the worker is gone
    /// - [`Error::AskTimeout`] if no reply arrived within `timeout`
    /// - [`Error::ReplyDropped`] if the worker discarded the reply slot
    pub async fn ask<R, F>(&self, timeout: Duration, make: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(oneshot::Sender<R>) -> M,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| Error::MailboxClosed { worker: self.name })?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(Error::ReplyDropped { worker: self.name }),
            Err(_) => Err(Error::AskTimeout {
                worker: self.name,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

/// Create a mailbox: a handle plus the receiver its worker loop will drain.
#[must_use]
pub fn channel<M>(name: &'static str) -> (Handle<M>, mpsc::UnboundedReceiver<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Handle { name, tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Msg {
        Echo(String, oneshot::Sender<String>),
        Nop,
    }

    fn echo_worker() -> Handle<Msg> {
        let (handle, mut rx) = channel::<Msg>("echo");
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Msg::Echo(text, reply) = msg {
                    let _ = reply.send(text);
                }
            }
        });
        handle
    }

    #[tokio::test]
    async fn test_ask_round_trip() {
        let handle = echo_worker();
        let reply = handle
            .ask(Duration::from_secs(1), |tx| {
                Msg::Echo("hello".to_string(), tx)
            })
            .await
            .unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_ask_timeout() {
        // Worker that never replies
        let (handle, _rx) = channel::<Msg>("mute");
        let result = handle
            .ask::<String, _>(Duration::from_millis(20), |tx| {
                Msg::Echo("anyone there".to_string(), tx)
            })
            .await;
        assert!(matches!(result, Err(Error::AskTimeout { .. })));
    }

    #[tokio::test]
    async fn test_ask_reply_dropped() {
        let (handle, mut rx) = channel::<Msg>("dropper");
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                // Drop the reply sender without answering
                drop(msg);
            }
        });
        let result = handle
            .ask::<String, _>(Duration::from_secs(1), |tx| {
                Msg::Echo("dropped".to_string(), tx)
            })
            .await;
        assert!(matches!(result, Err(Error::ReplyDropped { .. })));
    }

    #[tokio::test]
    async fn test_ask_closed_mailbox() {
        let handle = {
            let (handle, _rx) = channel::<Msg>("closed");
            handle
            // _rx dropped here
        };
        let result = handle
            .ask::<String, _>(Duration::from_secs(1), |tx| {
                Msg::Echo("noop".to_string(), tx)
            })
            .await;
        assert!(matches!(result, Err(Error::MailboxClosed { .. })));
    }

    #[tokio::test]
    async fn test_tell_never_fails() {
        let handle = {
            let (handle, _rx) = channel::<Msg>("gone");
            handle
        };
        // Must not panic or error even though the mailbox is closed
        handle.tell(Msg::Nop);
    }

    #[tokio::test]
    async fn test_late_reply_is_discarded() {
        let (handle, mut rx) = channel::<Msg>("slow");
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Msg::Echo(text, reply) = msg {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    // The caller has timed out by now; send must fail quietly
                    assert!(reply.send(text).is_err());
                }
            }
        });

        let result = handle
            .ask::<String, _>(Duration::from_millis(5), |tx| {
                Msg::Echo("late".to_string(), tx)
            })
            .await;
        assert!(matches!(result, Err(Error::AskTimeout { .. })));

        // Give the worker time to attempt (and fail) the late send
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
