use bme680::{
    Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, PowerMode, SettingsBuilder,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use pymeteo_core::climate;
use pymeteo_core::sensors::{PressureReadings, Sensor, SensorError};

const SENSOR: &str = "BME680";

/// Barometric pressure from a BME680 in forced mode.
///
/// The driver is blocking; one forced measurement takes a few tens of
/// milliseconds with the gas heater disabled.
pub struct Bme680Sensor<I, D> {
    sensor: Bme680<I, D>,
    delay: D,
}

impl<I, D> Bme680Sensor<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I, mut delay: D) -> Result<Self, SensorError> {
        let mut sensor = Bme680::init(i2c, &mut delay, I2CAddress::Secondary).map_err(|e| {
            log::error!("BME680 init failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: SENSOR,
                details: "sensor not found on the I2C bus",
            }
        })?;

        let settings = SettingsBuilder::new()
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_pressure_oversampling(OversamplingSetting::OS4x)
            .with_humidity_oversampling(OversamplingSetting::OS2x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_run_gas(false)
            .build();
        sensor
            .set_sensor_settings(&mut delay, settings)
            .map_err(|e| {
                log::error!("BME680 settings rejected: {:?}", e);
                SensorError::InitializationFailed {
                    sensor: SENSOR,
                    details: "could not apply oversampling settings",
                }
            })?;

        Ok(Self { sensor, delay })
    }
}

impl<I, D> Sensor for Bme680Sensor<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Readings = PressureReadings;

    async fn read(&mut self) -> Result<PressureReadings, SensorError> {
        self.sensor
            .set_sensor_mode(&mut self.delay, PowerMode::ForcedMode)
            .map_err(|e| {
                log::error!("BME680 trigger failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: SENSOR,
                    operation: "start forced measurement",
                    details: "I2C communication error",
                }
            })?;

        let (data, _state) = self.sensor.get_sensor_data(&mut self.delay).map_err(|e| {
            log::error!("BME680 measurement failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "measure pressure",
                details: "I2C communication error or measurement timeout",
            }
        })?;

        let pressure_hpa = data.pressure_hpa();
        Ok(PressureReadings {
            pressure_hpa,
            altitude_m: climate::altitude_m(pressure_hpa),
        })
    }
}
