//! Settings store on the default NVS partition.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

use crate::config::{store::NAMESPACE, MAX_LONG_STRING};
use crate::traits::KeyValueStore;

/// [`KeyValueStore`] over an NVS namespace.
pub struct Esp32Store {
    nvs: EspNvs<NvsDefault>,
}

impl Esp32Store {
    /// Open the settings namespace read-write.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        Ok(Self {
            nvs: EspNvs::new(partition, NAMESPACE, true)?,
        })
    }
}

impl KeyValueStore for Esp32Store {
    type Error = EspError;

    fn get_str(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let mut buf = [0u8; MAX_LONG_STRING + 1];
        Ok(self.nvs.get_str(key, &mut buf)?.map(str::to_string))
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.nvs.set_str(key, value)
    }

    fn get_u8(&self, key: &str) -> Result<Option<u8>, Self::Error> {
        self.nvs.get_u8(key)
    }

    fn set_u8(&mut self, key: &str, value: u8) -> Result<(), Self::Error> {
        self.nvs.set_u8(key, value)
    }

    fn get_u16(&self, key: &str) -> Result<Option<u16>, Self::Error> {
        self.nvs.get_u16(key)
    }

    fn set_u16(&mut self, key: &str, value: u16) -> Result<(), Self::Error> {
        self.nvs.set_u16(key, value)
    }
}
