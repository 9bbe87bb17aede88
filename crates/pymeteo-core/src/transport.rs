//! Chat transport abstraction and backlog handling

use alloc::string::String;

use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::state::BotState;

/// An inbound text message. Consumed once, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub update_id: i64,
    pub chat_id: i64,
    pub text: String,
}

/// One entry returned by the update cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Message(ChatMessage),
    /// An update without message text (stickers, callback queries, ...).
    /// The cursor moves past it but nothing is dispatched.
    Unsupported { update_id: i64 },
}

impl Incoming {
    pub const fn update_id(&self) -> i64 {
        match self {
            Incoming::Message(message) => message.update_id,
            Incoming::Unsupported { update_id } => *update_id,
        }
    }
}

/// How an outbound message travels to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// `sendMessage` with query parameters (the default).
    Query,
    /// `sendMessage` with a url-encoded POST body.
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub delivery: Delivery,
}

impl OutboundMessage {
    pub fn query(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            delivery: Delivery::Query,
        }
    }

    pub fn form(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            delivery: Delivery::Form,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Socket, DNS or TLS failure below HTTP.
    #[error("I/O failure: {0}")]
    Io(heapless::String<64>),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Decode(heapless::String<64>),
    #[error("API rejected the request: {0}")]
    Rejected(heapless::String<64>),
}

impl TransportError {
    pub fn io(details: &str) -> Self {
        Self::Io(crate::truncated(details))
    }

    pub fn decode(details: &str) -> Self {
        Self::Decode(crate::truncated(details))
    }

    pub fn rejected(details: &str) -> Self {
        Self::Rejected(crate::truncated(details))
    }

    /// Low-level I/O faults are not recovered in place; the device restarts.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Io(_))
    }
}

/// Remote chat API as seen by the bot.
pub trait MessageTransport {
    /// Liveness check against the API. `Ok(false)` means the API answered
    /// but refused the bot (bad token).
    fn check_bot(&mut self) -> impl Future<Output = Result<bool, TransportError>>;

    /// Fetch at most one pending update at or after `offset`.
    fn fetch_latest_update(
        &mut self,
        offset: Option<i64>,
    ) -> impl Future<Output = Result<Option<Incoming>, TransportError>>;

    /// Send `text` with query parameters.
    fn send(&mut self, chat_id: i64, text: &str) -> impl Future<Output = Result<(), TransportError>>;

    /// Send `text` as a url-encoded POST body.
    fn send_private(
        &mut self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>>;
}

/// Send `message` the way it asks to be sent. Failures are logged and dropped.
pub async fn deliver<T: MessageTransport>(transport: &mut T, message: &OutboundMessage) {
    let result = match message.delivery {
        Delivery::Query => transport.send(message.chat_id, &message.text).await,
        Delivery::Form => transport.send_private(message.chat_id, &message.text).await,
    };

    if let Err(e) = result {
        error!(
            "Failed to send {:?} message to chat {}: {}",
            message.delivery, message.chat_id, e
        );
        warn!("Dropped message: {:?}", message.text);
    }
}

/// Fetch one update and move the cursor past it.
///
/// An update that cannot be decoded still moves the cursor past the
/// requested offset, so it is never fetched again once reading has begun.
pub async fn next_update<T: MessageTransport>(
    transport: &mut T,
    state: &mut BotState,
) -> Result<Option<Incoming>, TransportError> {
    let offset = state.next_offset();
    let incoming = match transport.fetch_latest_update(offset).await {
        Ok(incoming) => incoming,
        Err(e @ TransportError::Decode(_)) => {
            if let Some(offset) = offset {
                warn!("Skipping unreadable update at offset {}: {}", offset, e);
                state.consume(offset);
            }
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    if let Some(incoming) = &incoming {
        state.consume(incoming.update_id());
    }
    Ok(incoming)
}

/// Consume every update queued before bring-up without dispatching it.
///
/// Returns how many updates were discarded. Transient errors end the drain
/// early; fatal ones are returned.
pub async fn drain_backlog<T: MessageTransport>(
    transport: &mut T,
    state: &mut BotState,
) -> Result<usize, TransportError> {
    let mut discarded = 0;

    loop {
        match next_update(transport, state).await {
            Ok(Some(incoming)) => {
                info!("Discarding old update {}", incoming.update_id());
                discarded += 1;
            }
            Ok(None) => break,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Error discarding old messages: {}", e);
                break;
            }
        }
    }

    info!("Old messages discarded: {}", discarded);
    Ok(discarded)
}
