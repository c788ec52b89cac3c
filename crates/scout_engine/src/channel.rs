//! Cross-context result channel.
//!
//! An isolated rendering context classifies its own page and posts a single
//! JSON message `{"url": .., "flags": ..}` to the embedder's origin. The
//! embedder keeps one [`Listener`] per in-flight render attempt; a listener
//! only accepts a message from the context it created, that parses, and that
//! names the exact address the attempt was issued for. Everything else is
//! logged and dropped while the attempt keeps waiting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_warn};
use scout_core::{classify, IndicatorSet};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;

// Each context posts once and at most `max_concurrent` render at a time, so
// a listener cannot lag past its own result unless the cap exceeds this.
const CHANNEL_CAPACITY: usize = 64;

/// Wildcard target origin, accepted by any embedder.
pub const ANY_ORIGIN: &str = "*";

/// Identity of one isolated rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A message as delivered to the embedder, tagged with its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub sender: ContextId,
    pub data: String,
}

/// Wire payload posted by a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub url: String,
    pub flags: String,
}

impl ResultPayload {
    pub fn new(url: impl Into<String>, indicators: IndicatorSet) -> Self {
        Self {
            url: url.into(),
            flags: indicators.to_flags(),
        }
    }
}

/// Embedder side of the channel. Cheap to clone; clones share the same bus.
#[derive(Debug, Clone)]
pub struct ResultChannel {
    origin: String,
    tx: broadcast::Sender<ChannelMessage>,
    next_id: Arc<AtomicU64>,
}

impl ResultChannel {
    /// `origin` is the embedder's own origin; posts addressed elsewhere are not delivered.
    pub fn new(origin: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            origin: origin.into(),
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn allocate_context_id(&self) -> ContextId {
        ContextId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Port handed to rendering contexts.
    pub fn port(&self) -> ChannelPort {
        ChannelPort {
            origin: self.origin.clone(),
            tx: self.tx.clone(),
        }
    }

    /// Starts listening for the result of the context `expected` loading `address`.
    ///
    /// Must be called before the context is created so no message can be missed.
    pub fn listen(&self, address: &Url, expected: ContextId) -> Listener {
        Listener {
            rx: self.tx.subscribe(),
            expected,
            address: address.as_str().to_string(),
        }
    }
}

/// Posting side of the channel, as seen from inside a rendering context.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    origin: String,
    tx: broadcast::Sender<ChannelMessage>,
}

impl ChannelPort {
    /// Origin the embedding page lives on.
    pub fn embedder_origin(&self) -> &str {
        &self.origin
    }

    /// Posts `data` as `sender`. Returns whether any listener received it.
    pub fn post(&self, sender: ContextId, target_origin: &str, data: String) -> bool {
        if target_origin != ANY_ORIGIN && target_origin != self.origin {
            engine_debug!(
                "Dropping message from context {} addressed to {} (embedder is {})",
                sender.raw(),
                target_origin,
                self.origin
            );
            return false;
        }
        self.tx.send(ChannelMessage { sender, data }).is_ok()
    }
}

/// Context-side reporter: classify the loaded page's visible text and post the result.
pub fn report_page(
    port: &ChannelPort,
    sender: ContextId,
    loaded_url: &str,
    visible_text: &str,
) -> Result<bool, serde_json::Error> {
    let payload = ResultPayload::new(loaded_url, classify(visible_text));
    let data = serde_json::to_string(&payload)?;
    engine_debug!("Context {} posting {}", sender.raw(), data);
    Ok(port.post(sender, port.embedder_origin(), data))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(IndicatorSet),
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    ForeignSender(ContextId),
    Malformed(String),
    AddressMismatch(String),
}

/// Embedder-side listener for one render attempt.
#[derive(Debug)]
pub struct Listener {
    rx: broadcast::Receiver<ChannelMessage>,
    expected: ContextId,
    address: String,
}

impl Listener {
    pub fn inspect(&self, message: &ChannelMessage) -> Verdict {
        if message.sender != self.expected {
            return Verdict::Discarded(DiscardReason::ForeignSender(message.sender));
        }
        let payload: ResultPayload = match serde_json::from_str(&message.data) {
            Ok(payload) => payload,
            Err(err) => return Verdict::Discarded(DiscardReason::Malformed(err.to_string())),
        };
        if payload.url != self.address {
            return Verdict::Discarded(DiscardReason::AddressMismatch(payload.url));
        }
        match IndicatorSet::parse_flags(&payload.flags) {
            Ok(set) => Verdict::Accepted(set),
            Err(err) => Verdict::Discarded(DiscardReason::Malformed(err.to_string())),
        }
    }

    /// Waits for the first accepted message. Never returns if none arrives;
    /// callers bound it with a timer.
    pub async fn next_result(&mut self) -> IndicatorSet {
        loop {
            match self.rx.recv().await {
                Ok(message) => match self.inspect(&message) {
                    Verdict::Accepted(set) => return set,
                    Verdict::Discarded(DiscardReason::ForeignSender(sender)) => {
                        engine_debug!(
                            "Ignoring message from unknown context {} while waiting for {}",
                            sender.raw(),
                            self.expected.raw()
                        );
                    }
                    Verdict::Discarded(reason) => {
                        engine_warn!(
                            "Ignoring message for {} from context {}: {:?}",
                            self.address,
                            self.expected.raw(),
                            reason
                        );
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    engine_warn!("Result listener for {} skipped {} messages", self.address, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}
