#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::WifiDevice;
use log::{error, info};
use rtt_target::rprintln;
use static_cell::{ConstStaticCell, StaticCell};

use pymeteo_core::bot::WeatherBot;
use pymeteo_core::chime::SquareWave;
use pymeteo_core::dispatcher::CommandDispatcher;
use pymeteo_core::indicator::Indicator;
use pymeteo_core::sensors::SensorReadings;
use pymeteo_core::telegram::TelegramApi;
use pymeteo_firmware::https::{HttpsBuffers, HttpsClient, TcpState};
use pymeteo_firmware::secrets;
use pymeteo_firmware::sensors::{Bme680Sensor, Sht4xSensor};
use pymeteo_firmware::wifi::WifiLink;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    esp_hal::system::software_reset()
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static TCP_STATE: StaticCell<TcpState> = StaticCell::new();
static HTTPS_BUFFERS: ConstStaticCell<HttpsBuffers> = ConstStaticCell::new(HttpsBuffers::new());

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Give RTT a moment to flush, then reboot.
async fn restart() -> ! {
    Timer::after(Duration::from_secs(1)).await;
    esp_hal::system::software_reset()
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = secrets::config();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        loop {
            Timer::after(Duration::from_secs(60)).await;
        }
    }

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    rprintln!("Embassy initialized!");

    let radio = RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let rng = Rng::new();
    let net_seed = u64::from(rng.random()) << 32 | u64::from(rng.random());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        net_seed,
    );
    spawner.spawn(net_task(runner).expect("Failed to spawn network task"));

    // Temperature/humidity on I2C0, pressure on I2C1.
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(100));
    let humidity_bus = I2c::new(peripherals.I2C0, i2c_config)
        .expect("Failed to configure I2C0")
        .with_sda(peripherals.GPIO4)
        .with_scl(peripherals.GPIO5)
        .into_async();
    let pressure_bus = I2c::new(peripherals.I2C1, i2c_config)
        .expect("Failed to configure I2C1")
        .with_sda(peripherals.GPIO6)
        .with_scl(peripherals.GPIO7);

    let humidity = Sht4xSensor::new(humidity_bus);
    let pressure = match Bme680Sensor::new(pressure_bus, esp_hal::delay::Delay::new()) {
        Ok(sensor) => sensor,
        Err(e) => {
            error!("Sensor bring-up failed: {}", e);
            restart().await
        }
    };
    info!("Sensors initialized!");

    let led = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let buzzer = SquareWave::new(
        Output::new(peripherals.GPIO18, Level::Low, OutputConfig::default()),
        Delay,
    );

    let https = HttpsClient::new(
        stack,
        TCP_STATE.init(TcpState::new()),
        HTTPS_BUFFERS.take(),
        rng,
    );
    let transport = TelegramApi::new(https, config.telegram.token);
    let network = WifiLink::new(
        wifi_controller,
        stack,
        config.internet.ssid,
        config.internet.password,
    );
    let dispatcher = CommandDispatcher::new(
        SensorReadings::new(humidity, pressure),
        Indicator::new(led),
    );

    let mut bot = WeatherBot::new(
        transport,
        network,
        dispatcher,
        Delay,
        buzzer,
        config.poll_interval_ms,
    );
    let fault = bot.run().await;

    error!("Restarting after fault: {}", fault);
    restart().await
}
