//! Polling main loop
//!
//! `Connecting -> Ready` once the network holds an address and the bot API
//! answers `getMe`. In `Ready`, every iteration re-checks the link, fetches
//! one update and dispatches it. Every chat message read plays a short
//! chime before it is handled. A low-level I/O fault moves the loop to
//! `Faulted` and [`WeatherBot::run`] returns; the caller restarts the device.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::chime::{self, Chime, MESSAGE_CHIME, READY_CHIME};
use crate::config::RECONNECT_INTERVAL_MS;
use crate::dispatcher::CommandDispatcher;
use crate::network::Network;
use crate::sensors::{HumidityReadings, PressureReadings, Sensor};
use crate::state::BotState;
use crate::transport::{
    Incoming, MessageTransport, TransportError, deliver, drain_backlog, next_update,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Connecting,
    Ready,
    Faulted,
}

/// Why the main loop stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("Telegram bot failed: token refused")]
    BotRejected,
    #[error("Telegram bot failed: {0}")]
    BotUnreachable(TransportError),
    #[error("Unrecovered I/O fault: {0}")]
    Io(TransportError),
}

pub struct WeatherBot<T, N, H, P, L, D, C> {
    transport: T,
    network: N,
    dispatcher: CommandDispatcher<H, P, L>,
    delay: D,
    chime: C,
    state: BotState,
    run_state: RunState,
    poll_interval_ms: u32,
}

impl<T, N, H, P, L, D, C> WeatherBot<T, N, H, P, L, D, C>
where
    T: MessageTransport,
    N: Network,
    H: Sensor<Readings = HumidityReadings>,
    P: Sensor<Readings = PressureReadings>,
    L: OutputPin,
    D: DelayNs,
    C: Chime,
{
    pub fn new(
        transport: T,
        network: N,
        dispatcher: CommandDispatcher<H, P, L>,
        delay: D,
        chime: C,
        poll_interval_ms: u32,
    ) -> Self {
        Self {
            transport,
            network,
            dispatcher,
            delay,
            chime,
            state: BotState::new(),
            run_state: RunState::Connecting,
            poll_interval_ms,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn fault(&mut self, fault: Fault) -> Fault {
        error!("Failed! {}", fault);
        self.run_state = RunState::Faulted;
        fault
    }

    /// Block until the network holds an address, retrying forever.
    ///
    /// Every attempt that ends without an address waits
    /// `RECONNECT_INTERVAL_MS`, including a connect that reported success.
    pub async fn ensure_network(&mut self) {
        let mut attempt: u32 = 0;
        while !self.network.is_connected() {
            attempt += 1;
            info!("Connecting to WiFi... (attempt {})", attempt);
            match self.network.connect().await {
                Ok(()) if self.network.is_connected() => break,
                Ok(()) => warn!("WiFi connection attempt {} ended without an address", attempt),
                Err(e) => warn!("WiFi connection attempt {} failed: {}", attempt, e),
            }
            self.delay.delay_ms(RECONNECT_INTERVAL_MS).await;
        }
    }

    /// Bring-up: connect, check the bot, then discard the backlog.
    ///
    /// Returns how many old updates were discarded.
    pub async fn start(&mut self) -> Result<usize, Fault> {
        self.run_state = RunState::Connecting;
        info!("Initializing...");
        self.ensure_network().await;

        match self.transport.check_bot().await {
            Ok(true) => {
                info!("Telegram bot ready!");
                chime::play(&mut self.chime, READY_CHIME).await;
            }
            Ok(false) => return Err(self.fault(Fault::BotRejected)),
            Err(e) => return Err(self.fault(Fault::BotUnreachable(e))),
        }

        let discarded = match drain_backlog(&mut self.transport, &mut self.state).await {
            Ok(discarded) => discarded,
            Err(e) => return Err(self.fault(Fault::Io(e))),
        };

        self.run_state = RunState::Ready;
        Ok(discarded)
    }

    /// One `Ready` iteration. Returns `true` when a message was dispatched.
    pub async fn poll_once(&mut self) -> Result<bool, Fault> {
        if !self.network.is_connected() {
            warn!("Reconnecting to WiFi...");
            self.ensure_network().await;
        }

        let message = match next_update(&mut self.transport, &mut self.state).await {
            Ok(Some(Incoming::Message(message))) => message,
            Ok(Some(Incoming::Unsupported { update_id })) => {
                info!("Skipping update {} without text", update_id);
                return Ok(false);
            }
            Ok(None) => return Ok(false),
            Err(e) if e.is_fatal() => return Err(self.fault(Fault::Io(e))),
            Err(e) => {
                warn!("Fetching updates failed: {}", e);
                return Ok(false);
            }
        };

        info!("Chat ID: {}\tMessage: {}", message.chat_id, message.text);
        chime::play(&mut self.chime, MESSAGE_CHIME).await;

        let replies = self
            .dispatcher
            .handle_text(message.chat_id, &message.text, &mut self.state)
            .await;
        for reply in &replies {
            deliver(&mut self.transport, reply).await;
        }

        Ok(true)
    }

    /// Run until a fault. Never returns otherwise.
    pub async fn run(&mut self) -> Fault {
        if let Err(fault) = self.start().await {
            return fault;
        }

        loop {
            if let Err(fault) = self.poll_once().await {
                return fault;
            }
            self.delay.delay_ms(self.poll_interval_ms).await;
        }
    }
}
