//! Secrets baked in at build time from `.env` (see `build.rs`).

use pymeteo_core::config::Config;

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
pub const TELEGRAM_BOT_TOKEN: &str = env!("TELEGRAM_BOT_TOKEN");

pub fn config() -> Config<'static> {
    Config::new(WIFI_SSID, WIFI_PASSWORD, TELEGRAM_BOT_TOKEN)
}
