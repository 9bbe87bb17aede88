//! Telegram Bot API client
//!
//! Builds request URLs, encodes message text and decodes the JSON
//! envelopes. The actual HTTPS exchange is delegated to an [`HttpClient`]
//! supplied by the board.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use log::{debug, info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::transport::{ChatMessage, Incoming, MessageTransport, TransportError};

pub const API_HOST: &str = "https://api.telegram.org";

/// `allowed_updates=["message","callback_query"]`, percent-encoded.
const ALLOWED_UPDATES: &str = "%5B%22message%22%2C%22callback_query%22%5D";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTPS client the board must provide.
pub trait HttpClient {
    fn get(&mut self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>>;

    /// POST `body` as `application/x-www-form-urlencoded`.
    fn post_form(
        &mut self,
        url: &str,
        body: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>>;
}

/// Percent-encode a query component. Only RFC 3986 unreserved bytes pass through.
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct UpdateEnvelope {
    update_id: i64,
    message: Option<MessageEnvelope>,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    chat: ChatEnvelope,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    id: i64,
}

#[derive(Deserialize)]
struct BotUser {
    username: Option<String>,
}

impl From<UpdateEnvelope> for Incoming {
    fn from(update: UpdateEnvelope) -> Self {
        match update.message {
            Some(MessageEnvelope {
                chat,
                text: Some(text),
            }) => Incoming::Message(ChatMessage {
                update_id: update.update_id,
                chat_id: chat.id,
                text,
            }),
            _ => Incoming::Unsupported {
                update_id: update.update_id,
            },
        }
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<ApiResponse<T>, TransportError> {
    serde_json::from_slice(&response.body).map_err(|_| TransportError::decode("invalid JSON envelope"))
}

/// Find the first `"update_id":N` in a body that did not decode, e.g. one
/// cut short by the client's buffer.
fn salvage_update_id(body: &[u8]) -> Option<i64> {
    const KEY: &[u8] = b"\"update_id\":";
    let start = body.windows(KEY.len()).position(|w| w == KEY)? + KEY.len();
    let rest = &body[start..];
    let rest = &rest[rest.iter().take_while(|b| b.is_ascii_whitespace()).count()..];
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    core::str::from_utf8(&rest[..digits]).ok()?.parse().ok()
}

/// Check the HTTP status and the `ok` flag, then hand back `result`.
fn unwrap_result<T: DeserializeOwned>(response: &HttpResponse) -> Result<Option<T>, TransportError> {
    if !(200..300).contains(&response.status) {
        return Err(TransportError::Status(response.status));
    }
    let envelope = decode::<T>(response)?;
    if !envelope.ok {
        return Err(TransportError::rejected(
            envelope.description.as_deref().unwrap_or("ok=false"),
        ));
    }
    Ok(envelope.result)
}

/// [`MessageTransport`] backed by the Telegram Bot API.
pub struct TelegramApi<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> TelegramApi<C> {
    pub fn new(client: C, token: &str) -> Self {
        Self::with_host(client, API_HOST, token)
    }

    pub fn with_host(client: C, host: &str, token: &str) -> Self {
        Self {
            client,
            base_url: format!("{host}/bot{token}"),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn get_me_url(&self) -> String {
        format!("{}/getMe", self.base_url)
    }

    pub fn get_updates_url(&self, offset: Option<i64>) -> String {
        let mut url = format!(
            "{}/getUpdates?limit=1&allowed_updates={}",
            self.base_url, ALLOWED_UPDATES
        );
        if let Some(offset) = offset {
            let _ = write!(url, "&offset={offset}");
        }
        url
    }

    pub fn send_message_url(&self, chat_id: i64, text: &str) -> String {
        format!(
            "{}/sendMessage?chat_id={}&text={}",
            self.base_url,
            chat_id,
            percent_encode(text)
        )
    }

    pub fn send_message_form(chat_id: i64, text: &str) -> String {
        format!("chat_id={}&text={}", chat_id, percent_encode(text))
    }
}

impl<C: HttpClient> MessageTransport for TelegramApi<C> {
    async fn check_bot(&mut self) -> Result<bool, TransportError> {
        let url = self.get_me_url();
        let response = self.client.get(&url).await?;
        if !(200..300).contains(&response.status) {
            // Telegram answers 401/404 for a refused token.
            return match response.status {
                401 | 404 => Ok(false),
                status => Err(TransportError::Status(status)),
            };
        }

        let envelope = decode::<BotUser>(&response)?;
        if let Some(user) = envelope.result.as_ref().and_then(|u| u.username.as_deref()) {
            info!("Telegram bot @{} is live", user);
        }
        Ok(envelope.ok)
    }

    async fn fetch_latest_update(
        &mut self,
        offset: Option<i64>,
    ) -> Result<Option<Incoming>, TransportError> {
        let url = self.get_updates_url(offset);
        let response = self.client.get(&url).await?;
        let updates: Vec<UpdateEnvelope> = match unwrap_result(&response) {
            Ok(updates) => updates.unwrap_or_default(),
            Err(e @ TransportError::Decode(_)) => {
                return match salvage_update_id(&response.body) {
                    Some(update_id) => {
                        warn!("Update {} could not be decoded, skipping it", update_id);
                        Ok(Some(Incoming::Unsupported { update_id }))
                    }
                    None => Err(e),
                };
            }
            Err(e) => return Err(e),
        };

        let incoming = updates.into_iter().next().map(Incoming::from);
        if incoming.is_none() {
            debug!("No new message");
        }
        Ok(incoming)
    }

    async fn send(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let url = self.send_message_url(chat_id, text);
        let response = self.client.get(&url).await?;
        unwrap_result::<serde::de::IgnoredAny>(&response).map(|_| ())
    }

    async fn send_private(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = Self::send_message_form(chat_id, text);
        let response = self.client.post_form(&url, &body).await?;
        unwrap_result::<serde::de::IgnoredAny>(&response).map(|_| ())
    }
}
