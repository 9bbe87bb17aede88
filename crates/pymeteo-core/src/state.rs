//! Bot state owned by the main loop

/// Mutable state of the bot for the lifetime of the process.
///
/// Never persisted. Extremes start at `+∞`/`-∞` so the first observed
/// temperature always replaces them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotState {
    pub indicator_on: bool,
    pub min_temperature: f32,
    pub max_temperature: f32,
    /// Next `getUpdates` offset, meaningful once `has_read_once` is set.
    pub last_update_id: i64,
    pub has_read_once: bool,
}

impl Default for BotState {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState {
    pub const fn new() -> Self {
        Self {
            indicator_on: false,
            min_temperature: f32::INFINITY,
            max_temperature: f32::NEG_INFINITY,
            last_update_id: 0,
            has_read_once: false,
        }
    }

    /// Lower the stored minimum if `temperature_c` is below it.
    ///
    /// Returns `true` when the minimum changed.
    pub fn observe_min(&mut self, temperature_c: f32) -> bool {
        if temperature_c < self.min_temperature {
            self.min_temperature = temperature_c;
            true
        } else {
            false
        }
    }

    /// Raise the stored maximum if `temperature_c` is above it.
    ///
    /// Returns `true` when the maximum changed.
    pub fn observe_max(&mut self, temperature_c: f32) -> bool {
        if temperature_c > self.max_temperature {
            self.max_temperature = temperature_c;
            true
        } else {
            false
        }
    }

    /// Offset for the next `getUpdates`; `None` before the first update was consumed.
    pub const fn next_offset(&self) -> Option<i64> {
        if self.has_read_once {
            Some(self.last_update_id)
        } else {
            None
        }
    }

    /// Record that `update_id` was consumed. The cursor never moves backwards.
    pub fn consume(&mut self, update_id: i64) {
        let next = update_id.saturating_add(1);
        if !self.has_read_once || next > self.last_update_id {
            self.last_update_id = next;
        }
        self.has_read_once = true;
    }
}
