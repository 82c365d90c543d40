//! Desktop simulation of the light station.
//!
//! Runs the device loop against mock hardware on a background thread and
//! serves the real web surface, so the control page and API can be used
//! without a board:
//! - Control page at http://localhost:8080
//! - Sensor readings drift slowly so the page has something to show
//! - The first pixel is printed whenever it changes
//! - Device logs go to stderr (`RUST_LOG` overrides the `info` default)
//!
//! # Usage
//!
//! Web only (mock broker):
//! ```sh
//! cargo run --example desktop_sim --features web
//! ```
//!
//! Web + real MQTT broker (`MQTT_HOST` defaults to `localhost`):
//! ```sh
//! MQTT_HOST=192.168.1.10 cargo run --example desktop_sim --features web,mqtt
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use smart_leds::RGB8;
use sunstrip::config::{MqttConfig, SensorSlotConfig, SensorsConfig, WifiConfig};
use sunstrip::hal::{MemoryStore, MockPixels, MockSensorBus, MockWifi};
use sunstrip::services::{run_server_with_state, SharedDeviceState, WebServerConfig};
use sunstrip::traits::{Clock, Delay};
use sunstrip::{DeviceConfig, DeviceCoordinator, WebConfig};

/// Wall-clock time source for the simulation.
struct SystemClock {
    start: Instant,
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Delay for SystemClock {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Two simulated sensors on separate pin pairs.
fn sim_config() -> DeviceConfig {
    let sensors = SensorsConfig::default()
        .with_count(2)
        .with_slot(1, SensorSlotConfig::default().with_enabled(true).with_pins(5, 4));

    #[cfg(feature = "mqtt")]
    let mqtt = MqttConfig::default()
        .with_host(&std::env::var("MQTT_HOST").unwrap_or_else(|_| "localhost".into()))
        .with_client_id("sunstrip-sim");
    #[cfg(not(feature = "mqtt"))]
    let mqtt = MqttConfig::default().with_host("mock-broker");

    DeviceConfig::default()
        .with_wifi(WifiConfig::default().with_ssid("simulated").with_password("simulated"))
        .with_mqtt(mqtt)
        .with_sensors(sensors)
}

fn simulated_bus(config: &DeviceConfig) -> MockSensorBus {
    let mut bus = MockSensorBus::new();
    for slot in config.sensors.active_slots() {
        bus.add_device(slot.sda, slot.scl, slot.address, 260, 410, 12);
    }
    bus
}

/// Slow drift so readings change between polls.
fn drift(base: u16, t_ms: u64, period_ms: u64) -> u16 {
    let phase = (t_ms % period_ms) as f32 / period_ms as f32;
    let swing = (phase * core::f32::consts::TAU).sin() * f32::from(base) * 0.25;
    (f32::from(base) + swing).max(0.0) as u16
}

fn run_device(config: DeviceConfig, shared: Arc<SharedDeviceState>) {
    #[cfg(feature = "mqtt")]
    let mqtt = sunstrip::services::RumqttClient::new();
    #[cfg(not(feature = "mqtt"))]
    let mqtt = sunstrip::hal::MockMqtt::new();

    let slots: Vec<SensorSlotConfig> = config.sensors.active_slots().to_vec();
    let mut device = DeviceCoordinator::new(
        config.clone(),
        simulated_bus(&config),
        MockWifi::new(),
        mqtt,
        MockPixels::new(),
        MemoryStore::new(),
        SystemClock {
            start: Instant::now(),
        },
    )
    .with_shared_state(shared);

    device.start();

    let start = Instant::now();
    let mut last_pixel: Option<RGB8> = None;
    loop {
        let t = start.elapsed().as_millis() as u64;
        for (i, slot) in slots.iter().enumerate() {
            let period = 30_000 + i as u64 * 7_000;
            device.sensors_mut().bus_mut().set_readings(
                slot.sda,
                slot.scl,
                slot.address,
                drift(260, t, period),
                drift(410, t, period),
                drift(12, t, period),
            );
        }

        if let Err(e) = device.tick() {
            eprintln!("pixel write failed: {:?}", e);
        }

        let first = device
            .pixels()
            .last_frame()
            .and_then(|frame| frame.first().copied());
        if first != last_pixel {
            if let Some(p) = first {
                println!("pixel 0 -> ({}, {}, {})", p.r, p.g, p.b);
            }
            last_pixel = first;
        }

        if device.restart_requested() {
            println!("Configuration saved; a device would restart now. Exiting.");
            std::process::exit(0);
        }

        device.idle();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================");
    println!("  sunstrip Desktop Simulation");
    println!("=================================");
    println!();

    let config = sim_config();
    let web_config = WebServerConfig::from_config(&WebConfig::default());

    println!("  Control page: http://{}", web_config.addr);
    println!("  Sensors:      http://{}/api/sensors", web_config.addr);
    println!("  Command topic: {}", config.command_topic());
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    let shared = Arc::new(SharedDeviceState::new());
    let device_state = Arc::clone(&shared);
    thread::Builder::new()
        .name("device".into())
        .spawn(move || run_device(config, device_state))?;

    run_server_with_state(shared, web_config).await?;
    Ok(())
}
