//! ESP32-S3 hardware bindings for the pymeteo weather bot.
//!
//! Everything platform independent lives in `pymeteo-core`; this crate only
//! provides the sensors, the Wi-Fi link and the HTTPS client it runs on.

#![no_std]

extern crate alloc;

pub mod https;
pub mod secrets;
pub mod sensors;
pub mod wifi;
