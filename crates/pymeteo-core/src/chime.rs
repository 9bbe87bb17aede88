//! Audible feedback on a piezo buzzer
//!
//! The bot beeps once when the API answers at bring-up and plays a short
//! two-note chime for every chat message it reads.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use log::warn;

/// Length of every note.
pub const NOTE_DURATION_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    G4,
    C5,
}

impl Note {
    pub const fn frequency_hz(self) -> u32 {
        match self {
            Note::G4 => 392,
            Note::C5 => 523,
        }
    }
}

/// Played once the bot API accepted the token.
pub const READY_CHIME: &[Note] = &[Note::C5];

/// Played for every chat message read.
pub const MESSAGE_CHIME: &[Note] = &[Note::G4, Note::C5];

/// Something that can play a single note.
pub trait Chime {
    fn tone(&mut self, note: Note, duration_ms: u32) -> impl Future<Output = ()>;
}

/// Play `notes` back to back.
pub async fn play<C: Chime>(chime: &mut C, notes: &[Note]) {
    for &note in notes {
        chime.tone(note, NOTE_DURATION_MS).await;
    }
}

/// Square wave toggled on a GPIO, for a passive piezo buzzer.
pub struct SquareWave<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> SquareWave<P, D> {
    pub const fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }
}

impl<P: OutputPin, D: DelayNs> Chime for SquareWave<P, D> {
    async fn tone(&mut self, note: Note, duration_ms: u32) {
        let frequency_hz = note.frequency_hz();
        let half_period_us = 500_000 / frequency_hz;
        let cycles = frequency_hz * duration_ms / 1000;

        for _ in 0..cycles {
            if let Err(e) = self.pin.set_high() {
                warn!("Buzzer pin failed, skipping {:?}: {:?}", note, e);
                return;
            }
            self.delay.delay_us(half_period_us).await;
            if let Err(e) = self.pin.set_low() {
                warn!("Buzzer pin failed, skipping {:?}: {:?}", note, e);
                return;
            }
            self.delay.delay_us(half_period_us).await;
        }
    }
}
