//! Station-mode Wi-Fi over `esp-radio`, with DHCP through `embassy-net`.

use alloc::string::String;

use embassy_net::Stack;
use embassy_time::{Duration, with_timeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use log::{info, warn};
use pymeteo_core::network::{Network, NetworkError};

/// How long to wait for a DHCP lease once associated.
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);

pub struct WifiLink<'d> {
    controller: WifiController<'d>,
    stack: Stack<'d>,
    ssid: &'d str,
    password: &'d str,
}

impl<'d> WifiLink<'d> {
    pub fn new(
        controller: WifiController<'d>,
        stack: Stack<'d>,
        ssid: &'d str,
        password: &'d str,
    ) -> Self {
        Self {
            controller,
            stack,
            ssid,
            password,
        }
    }

    pub fn stack(&self) -> Stack<'d> {
        self.stack
    }

    async fn start_station(&mut self) -> Result<(), NetworkError> {
        if matches!(self.controller.is_started(), Ok(true)) {
            return Ok(());
        }

        let config = ModeConfig::Client(
            ClientConfig::default()
                .with_ssid(String::from(self.ssid))
                .with_password(String::from(self.password)),
        );
        self.controller.set_config(&config).map_err(|e| {
            warn!("Wi-Fi configuration rejected: {:?}", e);
            NetworkError::association("configuration rejected")
        })?;

        info!("Starting Wi-Fi station");
        self.controller.start_async().await.map_err(|e| {
            warn!("Wi-Fi start failed: {:?}", e);
            NetworkError::association("radio failed to start")
        })
    }
}

impl Network for WifiLink<'_> {
    fn is_connected(&self) -> bool {
        self.stack.is_link_up()
            && self
                .stack
                .config_v4()
                .is_some_and(|config| !config.address.address().is_unspecified())
    }

    async fn connect(&mut self) -> Result<(), NetworkError> {
        self.start_station().await?;

        if !matches!(self.controller.is_connected(), Ok(true)) {
            self.controller.connect_async().await.map_err(|e| {
                warn!("Wi-Fi association with '{}' failed: {:?}", self.ssid, e);
                NetworkError::association("access point refused or not found")
            })?;
        }

        with_timeout(DHCP_TIMEOUT, self.stack.wait_config_up())
            .await
            .map_err(|_| NetworkError::NoAddress)?;

        if let Some(config) = self.stack.config_v4() {
            info!("Connected to WiFi: {}", config.address);
        }
        Ok(())
    }
}
