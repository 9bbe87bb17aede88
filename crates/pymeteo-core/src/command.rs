//! Chat commands understood by the bot

use alloc::string::String;

/// A parsed chat command.
///
/// Parsing lower-cases the text and then requires an exact match; there is
/// no prefix or fuzzy matching. `led_on`/`led_off` have no leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    LedOn,
    LedOff,
    Temperature,
    Humidity,
    /// `/clima`: four separate messages.
    Climate,
    /// `/clima2`: one consolidated message sent by POST.
    ClimateReport,
    Pressure,
    Min,
    Max,
    MinMax,
    Unknown,
}

impl Command {
    /// Every recognized command.
    pub const ALL: [Command; 12] = [
        Command::Start,
        Command::Help,
        Command::LedOn,
        Command::LedOff,
        Command::Temperature,
        Command::Humidity,
        Command::Climate,
        Command::ClimateReport,
        Command::Pressure,
        Command::Min,
        Command::Max,
        Command::MinMax,
    ];

    pub fn parse(text: &str) -> Self {
        let normalized: String = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|command| command.text() == Some(normalized.as_str()))
            .unwrap_or(Command::Unknown)
    }

    /// The exact text that selects this command.
    pub const fn text(self) -> Option<&'static str> {
        match self {
            Command::Start => Some("/start"),
            Command::Help => Some("/ayuda"),
            Command::LedOn => Some("led_on"),
            Command::LedOff => Some("led_off"),
            Command::Temperature => Some("/temperatura"),
            Command::Humidity => Some("/humedad"),
            Command::Climate => Some("/clima"),
            Command::ClimateReport => Some("/clima2"),
            Command::Pressure => Some("/presion"),
            Command::Min => Some("/min"),
            Command::Max => Some("/max"),
            Command::MinMax => Some("/minmax"),
            Command::Unknown => None,
        }
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}
