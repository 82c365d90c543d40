//! ESP32-C3 ambient-light station.
//!
//! This is the main entry point for the physical hardware. It runs the
//! cooperative device loop that:
//! - Supervises Wi-Fi (falling back to a configuration access point)
//! - Keeps the MQTT session up and applies LED commands from it
//! - Polls the SI1145 sensor array and publishes telemetry
//! - Renders the LED animation to the WS2812 strip
//! - Serves the control page and JSON API
//!
//! Configuration lives in NVS; saving the web form restarts the device.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --bin esp32_main --features esp32-net --target riscv32imc-esp-espidf
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use sunstrip::config::{short_string, store};
use sunstrip::hal::esp32::{
    pixels_on_pin, Esp32Clock, Esp32HttpServer, Esp32Mqtt, Esp32SensorBus, Esp32Store, Esp32Wifi,
};
use sunstrip::services::SharedDeviceState;
use sunstrip::DeviceCoordinator;

/// HTTP port on the device.
const HTTP_PORT: u16 = 80;

/// Time for the "Saved" page to reach the browser before restarting.
const RESTART_GRACE: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  sunstrip light station");
    println!("================================");
    println!();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // =========================================================================
    // Configuration (NVS)
    // =========================================================================
    let settings = Esp32Store::new(nvs.clone())?;
    let mut config = store::load(&settings);
    println!(
        "[OK] Config loaded ({} sensor slot(s), {} pixel(s))",
        config.sensors.count, config.led.count
    );

    // =========================================================================
    // Hardware
    // =========================================================================
    let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mac = wifi.mac()?;
    let client_id = format!("sunstrip-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    config.mqtt.client_id = short_string(&client_id);

    let pixels = pixels_on_pin(peripherals.rmt.channel0, config.led.pin)
        .map_err(|e| anyhow::anyhow!("LED strip: {:?}", e))?;
    println!("[OK] LED strip on GPIO{}", config.led.pin);

    let bus = Esp32SensorBus::new(peripherals.i2c0);

    // =========================================================================
    // Device loop + HTTP
    // =========================================================================
    let shared = Arc::new(SharedDeviceState::new());
    let mut device = DeviceCoordinator::new(
        config,
        bus,
        wifi,
        Esp32Mqtt::new(),
        pixels,
        settings,
        Esp32Clock::new(),
    )
    .with_shared_state(Arc::clone(&shared));

    device.start();

    let _http = Esp32HttpServer::new(HTTP_PORT, Arc::clone(&shared))?;
    println!("[OK] HTTP server on port {}", HTTP_PORT);

    if let Some(ip) = device.connectivity().wifi().ip_addr() {
        println!("[OK] Station address {}", ip);
    }
    println!("[OK] MQTT client id {}", client_id);

    loop {
        if let Err(e) = device.tick() {
            log::warn!("LED write failed: {:?}", e);
        }

        if device.restart_requested() {
            log::info!("Configuration saved, restarting");
            thread::sleep(RESTART_GRACE);
            // Safety: plain SDK call, does not return.
            unsafe { esp_idf_svc::sys::esp_restart() };
        }

        device.idle();
    }
}
