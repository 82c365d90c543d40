//! Wi-Fi link for ESP32-C3.
//!
//! Station association is started without blocking; the connectivity
//! supervisor polls [`WifiLink::is_associated`] for the bounded wait. The
//! fallback access point runs in mixed mode so station association keeps
//! going in the background, and a later station restart keeps the access
//! point running.
//!
//! # Example
//!
//! ```ignore
//! use sunstrip::hal::esp32::Esp32Wifi;
//!
//! let wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs))?;
//! let supervisor = ConnectivitySupervisor::new(wifi, mqtt, &config);
//! ```

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
};

use crate::traits::WifiLink;

/// Channel used by the configuration access point.
const AP_CHANNEL: u8 = 1;

/// Wi-Fi driver wrapper implementing [`WifiLink`].
pub struct Esp32Wifi {
    wifi: EspWifi<'static>,
    station: Option<ClientConfiguration>,
    access_point: Option<AccessPointConfiguration>,
}

impl Esp32Wifi {
    /// Initialize the Wi-Fi driver. Nothing is started until
    /// [`WifiLink::begin_station`] or [`WifiLink::start_access_point`].
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> anyhow::Result<Self> {
        let wifi = EspWifi::new(modem, sysloop, nvs)?;
        Ok(Self {
            wifi,
            station: None,
            access_point: None,
        })
    }

    /// Station IP address, if associated.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Station MAC address.
    pub fn mac(&self) -> Result<[u8; 6], EspError> {
        self.wifi.sta_netif().get_mac()
    }

    fn ensure_started(&mut self) -> Result<(), EspError> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        Ok(())
    }
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl WifiLink for Esp32Wifi {
    type Error = EspError;

    fn begin_station(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        let station = ClientConfiguration {
            ssid: fixed(ssid),
            password: fixed(password),
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };

        if self.wifi.is_started()? {
            let _ = self.wifi.disconnect();
        }
        let config = match &self.access_point {
            Some(ap) => Configuration::Mixed(station.clone(), ap.clone()),
            None => Configuration::Client(station.clone()),
        };
        self.wifi.set_configuration(&config)?;
        self.station = Some(station);
        self.ensure_started()?;
        self.wifi.connect()?;
        log::info!("[WiFi] Connecting to '{}'...", ssid);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.is_up().unwrap_or(false)
    }

    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        let ap = AccessPointConfiguration {
            ssid: fixed(ssid),
            password: fixed(password),
            auth_method: AuthMethod::WPA2Personal,
            channel: AP_CHANNEL,
            ..Default::default()
        };
        let config = match &self.station {
            Some(station) => Configuration::Mixed(station.clone(), ap.clone()),
            None => Configuration::AccessPoint(ap.clone()),
        };

        self.wifi.set_configuration(&config)?;
        self.access_point = Some(ap);
        self.ensure_started()?;
        if self.station.is_some() {
            // Keep trying the station in the background
            if let Err(e) = self.wifi.connect() {
                log::debug!("[WiFi] Background connect failed: {:?}", e);
            }
        }
        log::info!("[WiFi] Access point '{}' up", ssid);
        Ok(())
    }
}
