use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} returned a non-finite {quantity}")]
    InvalidReading {
        sensor: &'static str,
        quantity: &'static str,
    },
}

/// Trait for sensors that produce typed readings.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;

    /// Read the sensor and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}

/// Readings of the temperature/humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidityReadings {
    pub temperature_c: f32,
    pub relative_humidity_pct: f32,
}

/// Readings of the barometric sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureReadings {
    pub pressure_hpa: f32,
    pub altitude_m: f32,
}

/// One combined read of both sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawClimate {
    pub temperature_c: f32,
    pub relative_humidity_pct: f32,
    pub absolute_pressure_hpa: f32,
    pub altitude_m: f32,
}

fn finite(sensor: &'static str, quantity: &'static str, value: f32) -> Result<f32, SensorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SensorError::InvalidReading { sensor, quantity })
    }
}

/// Uniform read interface over the humidity and the pressure sensor.
///
/// Every accessor performs a fresh read; nothing is cached between commands.
pub struct SensorReadings<H, P> {
    humidity: H,
    pressure: P,
}

impl<H, P> SensorReadings<H, P>
where
    H: Sensor<Readings = HumidityReadings>,
    P: Sensor<Readings = PressureReadings>,
{
    pub const fn new(humidity: H, pressure: P) -> Self {
        Self { humidity, pressure }
    }

    async fn read_humidity_sensor(&mut self) -> Result<HumidityReadings, SensorError> {
        let readings = self.humidity.read().await?;
        Ok(HumidityReadings {
            temperature_c: finite("humidity sensor", "temperature", readings.temperature_c)?,
            relative_humidity_pct: finite(
                "humidity sensor",
                "relative humidity",
                readings.relative_humidity_pct,
            )?,
        })
    }

    /// Current temperature in °C.
    pub async fn temperature(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_humidity_sensor().await?.temperature_c)
    }

    /// Current relative humidity in percent.
    pub async fn relative_humidity(&mut self) -> Result<f32, SensorError> {
        Ok(self.read_humidity_sensor().await?.relative_humidity_pct)
    }

    /// Current absolute pressure (hPa) and altitude (m).
    pub async fn pressure(&mut self) -> Result<PressureReadings, SensorError> {
        let readings = self.pressure.read().await?;
        Ok(PressureReadings {
            pressure_hpa: finite("pressure sensor", "pressure", readings.pressure_hpa)?,
            altitude_m: readings.altitude_m,
        })
    }

    /// Read both sensors, humidity sensor first.
    pub async fn read_all(&mut self) -> Result<RawClimate, SensorError> {
        let humidity = self.read_humidity_sensor().await?;
        let pressure = self.pressure().await?;
        Ok(RawClimate {
            temperature_c: humidity.temperature_c,
            relative_humidity_pct: humidity.relative_humidity_pct,
            absolute_pressure_hpa: pressure.pressure_hpa,
            altitude_m: pressure.altitude_m,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Environment, FakeHumiditySensor, FakePressureSensor};
    use embassy_futures::block_on;

    fn readings(env: &Environment) -> SensorReadings<FakeHumiditySensor, FakePressureSensor> {
        SensorReadings::new(
            FakeHumiditySensor::new(env.clone()),
            FakePressureSensor::new(env.clone()),
        )
    }

    #[test]
    fn test_read_all_combines_both_sensors() {
        let env = Environment::new(21.5, 40.0, 995.0);
        let mut sensors = readings(&env);

        let raw = block_on(sensors.read_all()).unwrap();
        assert_eq!(raw.temperature_c, 21.5);
        assert_eq!(raw.relative_humidity_pct, 40.0);
        assert_eq!(raw.absolute_pressure_hpa, 995.0);
    }

    #[test]
    fn test_each_accessor_reads_fresh_values() {
        let env = Environment::new(18.0, 40.0, 995.0);
        let mut sensors = readings(&env);

        assert_eq!(block_on(sensors.temperature()).unwrap(), 18.0);
        env.set_temperature(25.0);
        assert_eq!(block_on(sensors.temperature()).unwrap(), 25.0);
        assert_eq!(env.humidity_reads(), 2);
    }

    #[test]
    fn test_non_finite_reading_is_an_error() {
        let env = Environment::new(f32::NAN, 40.0, 995.0);
        let mut sensors = readings(&env);

        assert_eq!(
            block_on(sensors.temperature()),
            Err(SensorError::InvalidReading {
                sensor: "humidity sensor",
                quantity: "temperature",
            })
        );
    }

    #[test]
    fn test_driver_failure_propagates() {
        let env = Environment::new(18.0, 40.0, 995.0);
        env.fail_reads(true);
        let mut sensors = readings(&env);

        assert!(matches!(
            block_on(sensors.read_all()),
            Err(SensorError::ReadFailed { .. })
        ));
    }
}
