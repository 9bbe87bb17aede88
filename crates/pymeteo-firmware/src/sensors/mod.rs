pub mod bme680;
pub mod sht4x;

pub use bme680::Bme680Sensor;
pub use sht4x::Sht4xSensor;
