use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Delay between two `getUpdates` polls.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1000;

/// Delay between two Wi-Fi association attempts.
pub const RECONNECT_INTERVAL_MS: u32 = 2000;

fn default_poll_interval_ms() -> u32 {
    DEFAULT_POLL_INTERVAL_MS
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub telegram: TelegramConfig<'a>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
pub struct TelegramConfig<'a> {
    pub token: &'a str,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Wi-Fi SSID is not set")]
    MissingSsid,
    #[error("Telegram bot token is not set")]
    MissingToken,
    #[error("Telegram bot token is malformed")]
    MalformedToken,
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,
}

impl<'a> Config<'a> {
    pub fn new(ssid: &'a str, password: &'a str, token: &'a str) -> Self {
        Self {
            internet: InternetConfig { ssid, password },
            telegram: TelegramConfig { token },
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Check that the secrets needed for bring-up are present.
    ///
    /// Open networks are allowed, so an empty password is accepted.
    /// Bot tokens always have the `<bot id>:<secret>` shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internet.ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }
        if self.telegram.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        match self.telegram.token.split_once(':') {
            Some((id, secret))
                if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty() => {}
            _ => return Err(ConfigError::MalformedToken),
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}
