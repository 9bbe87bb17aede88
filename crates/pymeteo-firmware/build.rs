//! Bakes the Wi-Fi and Telegram secrets from `.env` into the firmware.

const SECRETS: [&str; 3] = ["WIFI_SSID", "WIFI_PASSWORD", "TELEGRAM_BOT_TOKEN"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    dotenvy::dotenv().ok();

    for key in SECRETS {
        println!("cargo:rerun-if-env-changed={key}");
        match std::env::var(key) {
            Ok(value) => println!("cargo:rustc-env={key}={value}"),
            Err(_) => panic!("{key} must be set in .env or the environment (see .env.example)"),
        }
    }
}
