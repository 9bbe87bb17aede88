//! Desktop simulator for the pymeteo weather bot.
//!
//! Runs the real main loop with synthetic sensors and a console chat:
//! every line typed on stdin arrives as a chat message and every reply is
//! printed. Command-line arguments are queued as messages sent before the
//! bot came up, so they are discarded by the backlog drain.
//!
//! ```text
//! cargo run -p pymeteo-simulator -- /clima led_on
//! ```
//!
//! Closing stdin (Ctrl-D) is treated as a transport I/O fault, which ends
//! the simulated device the way a restart would.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use log::{error, info};

use pymeteo_core::bot::WeatherBot;
use pymeteo_core::chime::{Chime, Note};
use pymeteo_core::climate;
use pymeteo_core::config::{Config, DEFAULT_POLL_INTERVAL_MS};
use pymeteo_core::dispatcher::CommandDispatcher;
use pymeteo_core::indicator::Indicator;
use pymeteo_core::network::{Network, NetworkError};
use pymeteo_core::sensors::{
    HumidityReadings, PressureReadings, Sensor, SensorError, SensorReadings,
};
use pymeteo_core::transport::{ChatMessage, Incoming, MessageTransport, TransportError};

/// Chat id used for every console message.
const CONSOLE_CHAT_ID: i64 = 1;

// ---------------------------------------------------------------------------
// Mock data generation
// ---------------------------------------------------------------------------

/// Generates synthetic weather that varies over time.
struct MockWeather {
    started: Instant,
}

impl MockWeather {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Temperature: 20–26 °C sinusoidal with slow drift
    fn temperature_c(&self) -> f32 {
        let t = self.elapsed();
        (23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos()) as f32
    }

    /// Humidity: 40–60 % with a different period
    fn relative_humidity_pct(&self) -> f32 {
        let t = self.elapsed();
        (50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos()) as f32
    }

    /// Absolute pressure around the station's ~968 hPa
    fn pressure_hpa(&self) -> f32 {
        let t = self.elapsed();
        (968.0 + 4.0 * (t / 600.0).sin()) as f32
    }
}

struct MockHumiditySensor(Rc<MockWeather>);

impl Sensor for MockHumiditySensor {
    type Readings = HumidityReadings;

    async fn read(&mut self) -> Result<HumidityReadings, SensorError> {
        Ok(HumidityReadings {
            temperature_c: self.0.temperature_c(),
            relative_humidity_pct: self.0.relative_humidity_pct(),
        })
    }
}

struct MockPressureSensor(Rc<MockWeather>);

impl Sensor for MockPressureSensor {
    type Readings = PressureReadings;

    async fn read(&mut self) -> Result<PressureReadings, SensorError> {
        let pressure_hpa = self.0.pressure_hpa();
        Ok(PressureReadings {
            pressure_hpa,
            altitude_m: climate::altitude_m(pressure_hpa),
        })
    }
}

// ---------------------------------------------------------------------------
// Console peripherals
// ---------------------------------------------------------------------------

struct ConsoleLed;

impl ErrorType for ConsoleLed {
    type Error = Infallible;
}

impl OutputPin for ConsoleLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        println!("[LED off]");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        println!("[LED on]");
        Ok(())
    }
}

/// Host networking is always up.
struct HostNetwork;

impl Network for HostNetwork {
    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&mut self) -> Result<(), NetworkError> {
        Ok(())
    }
}

/// Prints notes instead of beeping.
struct ConsoleChime;

impl Chime for ConsoleChime {
    async fn tone(&mut self, note: Note, duration_ms: u32) {
        println!("[beep {:?} {} Hz, {} ms]", note, note.frequency_hz(), duration_ms);
    }
}

struct StdDelay;

impl DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// stdin-backed chat following the `getUpdates` offset rules.
struct ConsoleChat {
    lines: Receiver<String>,
    backlog: VecDeque<String>,
    pending: Option<Incoming>,
    next_update_id: i64,
}

impl ConsoleChat {
    fn new(backlog: impl IntoIterator<Item = String>) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.send(line.trim().to_string()).is_err() {
                    break;
                }
            }
        });

        Self {
            lines: rx,
            backlog: backlog.into_iter().collect(),
            pending: None,
            next_update_id: 1,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(line) = self.backlog.pop_front() {
            return Ok(Some(line));
        }
        match self.lines.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::io("stdin closed")),
        }
    }
}

impl MessageTransport for ConsoleChat {
    async fn check_bot(&mut self) -> Result<bool, TransportError> {
        Ok(true)
    }

    async fn fetch_latest_update(
        &mut self,
        offset: Option<i64>,
    ) -> Result<Option<Incoming>, TransportError> {
        let confirmed = offset.is_some_and(|offset| {
            self.pending
                .as_ref()
                .is_some_and(|pending| pending.update_id() < offset)
        });
        if confirmed {
            self.pending = None;
        }
        if self.pending.is_none() {
            self.pending = self.next_line()?.map(|text| {
                let update_id = self.next_update_id;
                self.next_update_id += 1;
                Incoming::Message(ChatMessage {
                    update_id,
                    chat_id: CONSOLE_CHAT_ID,
                    text,
                })
            });
        }
        Ok(self.pending.clone())
    }

    async fn send(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        println!("bot -> {chat_id}: {text}");
        Ok(())
    }

    async fn send_private(&mut self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        println!("bot -> {chat_id} (POST): {text}");
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ssid = env_or("WIFI_SSID", "simulator");
    let password = env_or("WIFI_PASSWORD", "");
    let token = env_or("TELEGRAM_BOT_TOKEN", "0:simulator");
    let mut config = Config::new(&ssid, &password, &token);
    config.poll_interval_ms = std::env::var("POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    info!(
        "Simulating station on '{}', polling every {} ms",
        config.internet.ssid, config.poll_interval_ms
    );

    let weather = Rc::new(MockWeather::new());
    let dispatcher = CommandDispatcher::new(
        SensorReadings::new(
            MockHumiditySensor(weather.clone()),
            MockPressureSensor(weather),
        ),
        Indicator::new(ConsoleLed),
    );
    let chat = ConsoleChat::new(std::env::args().skip(1));

    let mut bot = WeatherBot::new(
        chat,
        HostNetwork,
        dispatcher,
        StdDelay,
        ConsoleChime,
        config.poll_interval_ms,
    );

    let fault = embassy_futures::block_on(bot.run());
    error!("Device would restart now: {}", fault);
    std::process::exit(1);
}
