//! Hardware-independent core library for pymeteo
//!
//! This crate contains all platform-agnostic logic of the weather bot:
//! command parsing and dispatch, derived climate quantities, bot state,
//! the Telegram Bot API client and the polling main loop. Boards plug in
//! through the [`sensors::Sensor`], [`network::Network`],
//! [`telegram::HttpClient`], [`chime::Chime`] and `embedded_hal::digital::OutputPin`
//! traits.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod bot;
pub mod chime;
pub mod climate;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod indicator;
pub mod network;
pub mod sensors;
pub mod state;
pub mod telegram;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

/// Copy `value` into a fixed-capacity string, dropping whatever does not fit.
pub(crate) fn truncated<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in value.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
