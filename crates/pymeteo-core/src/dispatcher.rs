//! Command dispatch
//!
//! Maps a parsed [`Command`] to replies and [`BotState`] mutations, reading
//! the sensors on demand. Replies are returned rather than sent so the
//! main loop decides how to deliver them.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::digital::OutputPin;
use log::{debug, error};

use crate::climate::{self, ClimateSnapshot};
use crate::command::Command;
use crate::indicator::Indicator;
use crate::sensors::{HumidityReadings, PressureReadings, Sensor, SensorReadings};
use crate::state::BotState;
use crate::transport::OutboundMessage;

pub const WELCOME_TEXT: &str =
    "Bienvendos a la version alfa del PyMeteo_Sorbas. Pida /ayuda para saber los comandos";

pub const FALLBACK_TEXT: &str = "Para todo lo demas, MasterCard";

pub const CLIMATE_UNAVAILABLE_TEXT: &str = "Datos de clima no disponibles";

/// `/ayuda` reply, one message per line.
pub const HELP_LINES: [&str; 12] = [
    "Comandos: ",
    "/led_on .Enciende led",
    "/led_off .Apaga led",
    "/temperatura .Muestra temperatura",
    "/humedad .Muestra humedad relativa",
    "/clima .Muestra los datos de la temperatura, humedad, presion relativa y punto de rocio",
    "/clima2 .Muestra temperatura, humedad y presion en un solo mensaje",
    "/presion . Muestra la presion absoluta y la presion relativa",
    "/ayuda .Muestra los comandos",
    "/min . Muestra la temperatura minima ",
    "/max . Muestra la temperatura maxima",
    "/minmax. Muestra las temperaturas minima y maxima",
];

#[derive(Debug)]
enum DispatchError {
    Sensor(crate::sensors::SensorError),
    Climate(climate::ClimateError),
}

impl From<crate::sensors::SensorError> for DispatchError {
    fn from(e: crate::sensors::SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<climate::ClimateError> for DispatchError {
    fn from(e: climate::ClimateError) -> Self {
        Self::Climate(e)
    }
}

pub struct CommandDispatcher<H, P, L> {
    sensors: SensorReadings<H, P>,
    indicator: Indicator<L>,
}

impl<H, P, L> CommandDispatcher<H, P, L>
where
    H: Sensor<Readings = HumidityReadings>,
    P: Sensor<Readings = PressureReadings>,
    L: OutputPin,
{
    pub const fn new(sensors: SensorReadings<H, P>, indicator: Indicator<L>) -> Self {
        Self { sensors, indicator }
    }

    /// Parse `text` and handle the resulting command.
    pub async fn handle_text(
        &mut self,
        chat_id: i64,
        text: &str,
        state: &mut BotState,
    ) -> Vec<OutboundMessage> {
        self.handle(chat_id, Command::parse(text), state).await
    }

    /// Handle one command for `chat_id`.
    ///
    /// A sensor fault is logged and yields no reply; state changes made
    /// before the fault are kept.
    pub async fn handle(
        &mut self,
        chat_id: i64,
        command: Command,
        state: &mut BotState,
    ) -> Vec<OutboundMessage> {
        match self.respond(chat_id, command, state).await {
            Ok(replies) => replies,
            Err(DispatchError::Sensor(e)) => {
                error!("Sensor read failed while handling {:?}: {}", command, e);
                Vec::new()
            }
            Err(DispatchError::Climate(e)) => {
                error!("Climate computation failed while handling {:?}: {}", command, e);
                vec![OutboundMessage::query(chat_id, CLIMATE_UNAVAILABLE_TEXT)]
            }
        }
    }

    fn set_indicator(&mut self, state: &mut BotState, on: bool) {
        state.indicator_on = on;
        self.indicator.set(on);
    }

    async fn snapshot(&mut self) -> Result<ClimateSnapshot, DispatchError> {
        let raw = self.sensors.read_all().await?;
        debug!("Altitude estimate: {} m", raw.altitude_m);
        Ok(ClimateSnapshot::compute(&raw)?)
    }

    async fn respond(
        &mut self,
        chat_id: i64,
        command: Command,
        state: &mut BotState,
    ) -> Result<Vec<OutboundMessage>, DispatchError> {
        let reply = |text: String| OutboundMessage::query(chat_id, text);

        let replies = match command {
            Command::Start => vec![reply(WELCOME_TEXT.into())],
            Command::Help => HELP_LINES.iter().map(|line| reply((*line).into())).collect(),
            Command::LedOn => {
                self.set_indicator(state, true);
                vec![reply("LED turn on.".into())]
            }
            Command::LedOff => {
                self.set_indicator(state, false);
                vec![reply("LED turn off.".into())]
            }
            Command::Temperature => {
                self.set_indicator(state, false);
                let temperature = self.sensors.temperature().await?;
                vec![reply(format!("Temperatura: {:.1} C", temperature))]
            }
            Command::Humidity => {
                self.set_indicator(state, false);
                let humidity = self.sensors.relative_humidity().await?;
                vec![reply(format!("Humedad: {:.1} %", humidity))]
            }
            Command::Climate => {
                let snapshot = self.snapshot().await?;
                vec![
                    reply(format!("1-Temperatura:  {:.1} grados ", snapshot.temperature_c)),
                    reply(format!(
                        "2-Humedad relativa :  {:.1} % ",
                        snapshot.relative_humidity_pct
                    )),
                    reply(format!(
                        "3-Presion relativa : {:.1} hPa ",
                        snapshot.relative_pressure_hpa
                    )),
                    reply(format!("4-punto de rocio : {:.1} grados ", snapshot.dew_point_c)),
                ]
            }
            Command::ClimateReport => {
                let snapshot = self.snapshot().await?;
                vec![OutboundMessage::form(
                    chat_id,
                    format!(
                        "Datos actuales \nTemperatura:  {:.1} ºC \nHumedad:  {:.1}  \nPresion: {:.1} hPa",
                        snapshot.temperature_c,
                        snapshot.relative_humidity_pct,
                        snapshot.absolute_pressure_hpa
                    ),
                )]
            }
            Command::Pressure => {
                self.set_indicator(state, false);
                let pressure = self.sensors.pressure().await?.pressure_hpa;
                vec![
                    reply(format!("Presion absoluta : {:.1} hPa", pressure)),
                    reply(format!(
                        "Presion relativa:  {:.1} hPa",
                        climate::relative_pressure(pressure)
                    )),
                ]
            }
            Command::Min => {
                let temperature = self.sensors.temperature().await?;
                if state.observe_min(temperature) {
                    vec![reply(format!("{:.1}", state.min_temperature))]
                } else {
                    Vec::new()
                }
            }
            Command::Max => {
                let temperature = self.sensors.temperature().await?;
                if state.observe_max(temperature) {
                    vec![reply(format!("{:.1}", state.max_temperature))]
                } else {
                    Vec::new()
                }
            }
            Command::MinMax => {
                let temperature = self.sensors.temperature().await?;
                state.observe_min(temperature);
                state.observe_max(temperature);
                vec![
                    reply(format!("temperatura minima: {:.1} grados ", state.min_temperature)),
                    reply(format!("temperatura maxima: {:.1} grados ", state.max_temperature)),
                ]
            }
            Command::Unknown => vec![reply(FALLBACK_TEXT.into())],
        };

        Ok(replies)
    }
}
