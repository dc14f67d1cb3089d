// Request/response correlation over the encrypted DM channel
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{Result, ServiceError};
use crate::message::{Action, Message};

type Completion = oneshot::Sender<Result<Message>>;

/// One-shot handle for a reply awaited by a caller.
///
/// Resolves with the matching message, or fails with `Timeout` when the
/// record is evicted, or `Disconnected` on teardown.
pub struct PendingReply {
    rx: oneshot::Receiver<Result<Message>>,
}

impl PendingReply {
    pub async fn recv(self) -> Result<Message> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ServiceError::Disconnected),
        }
    }
}

struct ActionWaiter {
    token: u64,
    action: Action,
    order_id: String,
    tx: Completion,
}

#[derive(Default)]
struct Inner {
    next_request_id: u64,
    next_waiter_token: u64,
    pending: HashMap<u64, Completion>,
    waiters: Vec<ActionWaiter>,
}

/// Two-mode correlation table.
///
/// Mode 1 matches replies to our own numeric `request_id`s; Mode 2
/// matches server-initiated lifecycle messages on `(action, order_id)`.
/// All table access is serialized behind one mutex so delivery is atomic
/// with respect to allocation and timeout eviction.
#[derive(Clone, Default)]
pub struct RequestCorrelator {
    inner: Arc<Mutex<Inner>>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next request id and its completion handle.
    ///
    /// Ids start at 0 and increase strictly; they are never reused for
    /// the process lifetime. Allocation never blocks. The record is
    /// evicted after `timeout` and the handle fails with `Timeout`.
    pub fn begin_request(&self, timeout: Duration) -> (u64, PendingReply) {
        let (tx, rx) = oneshot::channel();
        let id = {
            let mut inner = self.inner.lock().expect("correlator mutex poisoned");
            let id = inner.next_request_id;
            inner.next_request_id += 1;
            inner.pending.insert(id, tx);
            id
        };

        let table = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let evicted = {
                let mut inner = table.lock().expect("correlator mutex poisoned");
                inner.pending.remove(&id)
            };
            if let Some(tx) = evicted {
                let _ = tx.send(Err(ServiceError::Timeout));
            }
        });

        (id, PendingReply { rx })
    }

    /// Fulfil the Mode-1 record for `id`, if it is still outstanding.
    /// The first matching reply wins; duplicates are ignored.
    pub fn deliver(&self, id: u64, message: Message) -> bool {
        let completion = {
            let mut inner = self.inner.lock().expect("correlator mutex poisoned");
            inner.pending.remove(&id)
        };
        match completion {
            Some(tx) => tx.send(Ok(message)).is_ok(),
            None => false,
        }
    }

    /// Register a Mode-2 waiter for `(action, order_id)`.
    ///
    /// Duplicate keys are allowed; every waiter whose key matches an
    /// inbound message completes on that message.
    pub fn await_action(
        &self,
        action: Action,
        order_id: &str,
        timeout: Duration,
    ) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        let token = {
            let mut inner = self.inner.lock().expect("correlator mutex poisoned");
            let token = inner.next_waiter_token;
            inner.next_waiter_token += 1;
            inner.waiters.push(ActionWaiter {
                token,
                action,
                order_id: order_id.to_string(),
                tx,
            });
            token
        };

        let table = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let evicted = {
                let mut inner = table.lock().expect("correlator mutex poisoned");
                let position = inner.waiters.iter().position(|w| w.token == token);
                position.map(|i| inner.waiters.swap_remove(i))
            };
            if let Some(waiter) = evicted {
                let _ = waiter.tx.send(Err(ServiceError::Timeout));
            }
        });

        PendingReply { rx }
    }

    /// Complete every waiter matching the message's `(action, order_id)`.
    /// Returns how many completed; unmatched messages do not accumulate.
    pub fn deliver_action(&self, message: &Message) -> usize {
        let Some(order_id) = message.order_id() else {
            return 0;
        };
        let action = message.action();

        let matched: Vec<ActionWaiter> = {
            let mut inner = self.inner.lock().expect("correlator mutex poisoned");
            let mut matched = Vec::new();
            let mut i = 0;
            while i < inner.waiters.len() {
                if &inner.waiters[i].action == action && inner.waiters[i].order_id == order_id {
                    matched.push(inner.waiters.swap_remove(i));
                } else {
                    i += 1;
                }
            }
            matched
        };

        let count = matched.len();
        for waiter in matched {
            let _ = waiter.tx.send(Ok(message.clone()));
        }
        count
    }

    /// Fail every outstanding handle, both modes, with `Disconnected`.
    pub fn disconnect_all(&self) {
        let (pending, waiters) = {
            let mut inner = self.inner.lock().expect("correlator mutex poisoned");
            (
                std::mem::take(&mut inner.pending),
                std::mem::take(&mut inner.waiters),
            )
        };
        for (_, tx) in pending {
            let _ = tx.send(Err(ServiceError::Disconnected));
        }
        for waiter in waiters {
            let _ = waiter.tx.send(Err(ServiceError::Disconnected));
        }
    }

    /// Outstanding Mode-1 record count.
    pub fn pending_requests(&self) -> usize {
        self.inner
            .lock()
            .expect("correlator mutex poisoned")
            .pending
            .len()
    }

    /// Outstanding Mode-2 waiter count.
    pub fn pending_waiters(&self) -> usize {
        self.inner
            .lock()
            .expect("correlator mutex poisoned")
            .waiters
            .len()
    }
}
