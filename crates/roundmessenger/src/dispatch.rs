// Round-robin dispatch of resolved messages across a pool of bot identities.
//
// Each identity is driven by its own courier task that drains a bounded queue
// and sends one message at a time, so a sender never sees concurrent calls.
// Couriers run independently of each other; `finish` waits for all of them.

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::ChatSender;
use crate::draw::OutgoingMessage;

/// Messages a courier may have queued before `dispatch` waits for it.
const QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no sending identities configured")]
    NoSenders,

    #[error("courier {name} stopped before its queue was drained")]
    CourierClosed { name: String },

    #[error("courier {name} panicked: {source}")]
    CourierPanicked {
        name: String,
        source: tokio::task::JoinError,
    },
}

/// What one courier did over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourierReport {
    pub name: String,
    pub sent: usize,
    pub failed: usize,
}

/// Per-courier reports, in pool order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub couriers: Vec<CourierReport>,
}

impl DispatchSummary {
    pub fn sent(&self) -> usize {
        self.couriers.iter().map(|c| c.sent).sum()
    }

    pub fn failed(&self) -> usize {
        self.couriers.iter().map(|c| c.failed).sum()
    }
}

// ---------------------------------------------------------------------------
// Courier
// ---------------------------------------------------------------------------

struct Courier {
    name: String,
    tx: mpsc::Sender<OutgoingMessage>,
    handle: JoinHandle<CourierReport>,
}

impl Courier {
    fn spawn(sender: Arc<dyn ChatSender>) -> Self {
        let name = sender.name().to_string();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(run_courier(sender, rx));
        Self { name, tx, handle }
    }
}

async fn run_courier(
    sender: Arc<dyn ChatSender>,
    mut rx: mpsc::Receiver<OutgoingMessage>,
) -> CourierReport {
    let mut report = CourierReport {
        name: sender.name().to_string(),
        ..CourierReport::default()
    };

    while let Some(message) = rx.recv().await {
        match sender
            .send_direct_message(message.recipient, &message.body)
            .await
        {
            Ok(()) => {
                report.sent += 1;
                debug!(bot = %report.name, recipient = %message.recipient, "message sent");
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    "{} failed to message {}: {e:#}",
                    report.name, message.recipient
                );
            }
        }
    }

    report
}

// ---------------------------------------------------------------------------
// RoundRobinDispatcher
// ---------------------------------------------------------------------------

/// Hands messages to couriers in strict rotation: message `k` of the run goes
/// to courier `k % N`, whatever the size of each message.
pub struct RoundRobinDispatcher {
    couriers: Vec<Courier>,
    counter: usize,
}

impl RoundRobinDispatcher {
    /// Spawn one courier per sender. Must be called inside a tokio runtime.
    pub fn new(senders: Vec<Arc<dyn ChatSender>>) -> Result<Self, DispatchError> {
        if senders.is_empty() {
            return Err(DispatchError::NoSenders);
        }
        let couriers = senders.into_iter().map(Courier::spawn).collect();
        Ok(Self {
            couriers,
            counter: 0,
        })
    }

    pub fn identity_count(&self) -> usize {
        self.couriers.len()
    }

    /// Number of messages submitted so far.
    pub fn submitted(&self) -> usize {
        self.counter
    }

    /// Queue every message on the next courier in rotation. Returns once all
    /// messages are queued, not once they are sent.
    pub async fn dispatch(&mut self, messages: Vec<OutgoingMessage>) -> Result<(), DispatchError> {
        for message in messages {
            let courier = &self.couriers[self.counter % self.couriers.len()];
            courier
                .tx
                .send(message)
                .await
                .map_err(|_| DispatchError::CourierClosed {
                    name: courier.name.clone(),
                })?;
            self.counter += 1;
        }
        Ok(())
    }

    /// Dispatch every message, then drain all couriers. The couriers are drained
    /// even when dispatch stops early, so messages already queued on healthy
    /// couriers are still sent before the dispatch error is returned.
    pub async fn deliver(
        mut self,
        messages: Vec<OutgoingMessage>,
    ) -> Result<DispatchSummary, DispatchError> {
        let dispatched = self.dispatch(messages).await;
        let submitted = self.submitted();
        let finished = self.finish().await;

        match dispatched {
            Ok(()) => finished,
            Err(e) => {
                warn!(submitted, "dispatch stopped early: {e}");
                if let Err(drain) = finished {
                    warn!("{drain}");
                }
                Err(e)
            }
        }
    }

    /// Close every queue and wait until each courier has drained it.
    pub async fn finish(self) -> Result<DispatchSummary, DispatchError> {
        let (names, handles): (Vec<String>, Vec<JoinHandle<CourierReport>>) = self
            .couriers
            .into_iter()
            .map(|Courier { name, tx, handle }| {
                drop(tx);
                (name, handle)
            })
            .unzip();

        let mut summary = DispatchSummary::default();
        for (name, result) in names.into_iter().zip(join_all(handles).await) {
            let report =
                result.map_err(|source| DispatchError::CourierPanicked { name, source })?;
            summary.couriers.push(report);
        }

        info!(
            sent = summary.sent(),
            failed = summary.failed(),
            "all couriers drained"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
