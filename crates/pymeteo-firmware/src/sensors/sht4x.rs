use embedded_hal_async::i2c::I2c;
use pymeteo_core::sensors::{HumidityReadings, Sensor, SensorError};
use sht4x::Sht4xAsync;

/// Temperature and relative humidity from an SHT4x on its own I2C bus.
pub struct Sht4xSensor<I> {
    sensor: Sht4xAsync<I, embassy_time::Delay>,
}

impl<I: I2c> Sht4xSensor<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            sensor: Sht4xAsync::<I, embassy_time::Delay>::new(i2c),
        }
    }
}

impl<I: I2c> Sensor for Sht4xSensor<I> {
    type Readings = HumidityReadings;

    async fn read(&mut self) -> Result<HumidityReadings, SensorError> {
        let measurement = self
            .sensor
            .measure(sht4x::Precision::High, &mut embassy_time::Delay)
            .await
            .map_err(|e| {
                log::error!("SHT4x measurement failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "SHT4x",
                    operation: "measure temperature/humidity",
                    details: "I2C communication error or sensor not responding",
                }
            })?;

        Ok(HumidityReadings {
            temperature_c: measurement.temperature_celsius().to_num::<f32>(),
            relative_humidity_pct: measurement.humidity_percent().to_num::<f32>(),
        })
    }
}
