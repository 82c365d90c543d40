//! Persisted key-value settings store.
//!
//! Settings are stored as one primitive value per short string key, the way
//! the ESP-IDF NVS API exposes them. The layout of individual keys is owned by
//! [`crate::config::store`].

extern crate alloc;
use alloc::string::String;

/// Typed key-value store for persisted settings.
///
/// `get_*` returns `Ok(None)` for keys that were never written; callers
/// substitute defaults only in that case.
pub trait KeyValueStore {
    /// Error type for store operations.
    type Error: core::fmt::Debug;

    /// Read a string value.
    fn get_str(&self, key: &str) -> Result<Option<String>, Self::Error>;
    /// Write a string value.
    fn set_str(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Read a byte value.
    fn get_u8(&self, key: &str) -> Result<Option<u8>, Self::Error>;
    /// Write a byte value.
    fn set_u8(&mut self, key: &str, value: u8) -> Result<(), Self::Error>;

    /// Read a 16-bit value.
    fn get_u16(&self, key: &str) -> Result<Option<u16>, Self::Error>;
    /// Write a 16-bit value.
    fn set_u16(&mut self, key: &str, value: u16) -> Result<(), Self::Error>;

    /// Read a boolean (stored as a byte).
    fn get_bool(&self, key: &str) -> Result<Option<bool>, Self::Error> {
        Ok(self.get_u8(key)?.map(|v| v != 0))
    }

    /// Write a boolean (stored as a byte).
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), Self::Error> {
        self.set_u8(key, u8::from(value))
    }
}
