//! SI1145 sensors on a re-bindable I2C controller.
//!
//! The ESP32-C3 has one I2C controller. Each sensor slot may sit on its own
//! pin pair, so the driver is torn down and rebuilt whenever the requested
//! pins change.

use esp_idf_hal::delay::{FreeRtos, BLOCK};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver, I2C0};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

use crate::traits::SensorBus;

/// SI1145 register map and commands.
mod reg {
    pub const PART_ID: u8 = 0x00;
    pub const INT_CFG: u8 = 0x03;
    pub const IRQ_ENABLE: u8 = 0x04;
    pub const IRQ_MODE1: u8 = 0x05;
    pub const IRQ_MODE2: u8 = 0x06;
    pub const HW_KEY: u8 = 0x07;
    pub const MEAS_RATE0: u8 = 0x08;
    pub const MEAS_RATE1: u8 = 0x09;
    pub const UCOEF0: u8 = 0x13;
    pub const PARAM_WR: u8 = 0x17;
    pub const COMMAND: u8 = 0x18;
    pub const IRQ_STATUS: u8 = 0x21;
    pub const ALS_VIS_DATA0: u8 = 0x22;
    pub const ALS_IR_DATA0: u8 = 0x24;
    pub const UV_INDEX0: u8 = 0x2C;

    pub const PARAM_CHLIST: u8 = 0x01;
    pub const PARAM_ALS_VIS_ADC_COUNTER: u8 = 0x10;
    pub const PARAM_ALS_VIS_ADC_GAIN: u8 = 0x11;
    pub const PARAM_ALS_VIS_ADC_MISC: u8 = 0x12;
    pub const PARAM_ALS_IR_ADC_MUX: u8 = 0x0E;
    pub const PARAM_ALS_IR_ADC_COUNTER: u8 = 0x1D;
    pub const PARAM_ALS_IR_ADC_GAIN: u8 = 0x1E;
    pub const PARAM_ALS_IR_ADC_MISC: u8 = 0x1F;

    pub const CMD_RESET: u8 = 0x01;
    pub const CMD_PARAM_SET: u8 = 0xA0;
    pub const CMD_ALS_AUTO: u8 = 0x0E;

    pub const EXPECTED_PART_ID: u8 = 0x45;
    pub const HW_KEY_VALUE: u8 = 0x17;
    pub const UCOEF: [u8; 4] = [0x29, 0x89, 0x02, 0x00];
    /// UV, ALS IR, ALS visible.
    pub const CHLIST_UV_ALS: u8 = 0x80 | 0x20 | 0x10;
    /// 511 ADC clocks.
    pub const ADC_COUNTER_511: u8 = 0x70;
    /// High signal range.
    pub const ADC_MISC_HIGH_RANGE: u8 = 0x20;
    pub const IR_MUX_SMALL: u8 = 0x00;
}

/// Bus clock for every binding.
const BUS_HZ: u32 = 100_000;

/// Errors from the sensor bus.
#[derive(Debug)]
pub enum Esp32BusError {
    /// A transaction was attempted before `bind`.
    NotBound,
    /// Driver or transaction failure.
    Esp(EspError),
}

impl From<EspError> for Esp32BusError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

/// SI1145 array over the I2C0 controller.
pub struct Esp32SensorBus {
    i2c: I2C0,
    driver: Option<I2cDriver<'static>>,
    pins: Option<(u8, u8)>,
}

impl Esp32SensorBus {
    /// Take ownership of the controller. No pins are claimed until `bind`.
    pub fn new(i2c: I2C0) -> Self {
        Self {
            i2c,
            driver: None,
            pins: None,
        }
    }

    fn driver(&mut self) -> Result<&mut I2cDriver<'static>, Esp32BusError> {
        self.driver.as_mut().ok_or(Esp32BusError::NotBound)
    }

    fn write_reg(&mut self, address: u8, reg: u8, value: u8) -> Result<(), Esp32BusError> {
        self.driver()?.write(address, &[reg, value], BLOCK)?;
        Ok(())
    }

    fn read_u8(&mut self, address: u8, reg: u8) -> Result<u8, Esp32BusError> {
        let mut buf = [0u8; 1];
        self.driver()?.write_read(address, &[reg], &mut buf, BLOCK)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self, address: u8, reg: u8) -> Result<u16, Esp32BusError> {
        let mut buf = [0u8; 2];
        self.driver()?.write_read(address, &[reg], &mut buf, BLOCK)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_param(&mut self, address: u8, param: u8, value: u8) -> Result<(), Esp32BusError> {
        self.write_reg(address, reg::PARAM_WR, value)?;
        self.write_reg(address, reg::COMMAND, param | reg::CMD_PARAM_SET)
    }

    fn reset(&mut self, address: u8) -> Result<(), Esp32BusError> {
        for r in [
            reg::MEAS_RATE0,
            reg::MEAS_RATE1,
            reg::IRQ_ENABLE,
            reg::IRQ_MODE1,
            reg::IRQ_MODE2,
            reg::INT_CFG,
        ] {
            self.write_reg(address, r, 0)?;
        }
        self.write_reg(address, reg::IRQ_STATUS, 0xFF)?;
        self.write_reg(address, reg::COMMAND, reg::CMD_RESET)?;
        FreeRtos::delay_ms(10);
        self.write_reg(address, reg::HW_KEY, reg::HW_KEY_VALUE)?;
        FreeRtos::delay_ms(10);
        Ok(())
    }

    fn configure(&mut self, address: u8) -> Result<(), Esp32BusError> {
        for (i, c) in reg::UCOEF.into_iter().enumerate() {
            self.write_reg(address, reg::UCOEF0 + i as u8, c)?;
        }
        self.write_param(address, reg::PARAM_CHLIST, reg::CHLIST_UV_ALS)?;
        self.write_reg(address, reg::INT_CFG, 0x01)?;
        self.write_reg(address, reg::IRQ_ENABLE, 0x01)?;

        self.write_param(address, reg::PARAM_ALS_IR_ADC_MUX, reg::IR_MUX_SMALL)?;
        self.write_param(address, reg::PARAM_ALS_IR_ADC_GAIN, 0)?;
        self.write_param(address, reg::PARAM_ALS_IR_ADC_COUNTER, reg::ADC_COUNTER_511)?;
        self.write_param(address, reg::PARAM_ALS_IR_ADC_MISC, reg::ADC_MISC_HIGH_RANGE)?;

        self.write_param(address, reg::PARAM_ALS_VIS_ADC_GAIN, 0)?;
        self.write_param(address, reg::PARAM_ALS_VIS_ADC_COUNTER, reg::ADC_COUNTER_511)?;
        self.write_param(address, reg::PARAM_ALS_VIS_ADC_MISC, reg::ADC_MISC_HIGH_RANGE)?;

        self.write_reg(address, reg::MEAS_RATE0, 0xFF)?;
        self.write_reg(address, reg::COMMAND, reg::CMD_ALS_AUTO)
    }
}

impl SensorBus for Esp32SensorBus {
    type Error = Esp32BusError;

    fn bind(&mut self, sda: u8, scl: u8) -> Result<(), Self::Error> {
        if self.pins == Some((sda, scl)) && self.driver.is_some() {
            return Ok(());
        }

        // Release the controller before building a driver on new pins
        self.driver = None;
        self.pins = None;

        // Safety: the previous driver was dropped above, so this is the only
        // handle to the controller; the pin numbers come from configuration
        // and are claimed only while this driver lives.
        let (i2c, sda_pin, scl_pin) = unsafe {
            (
                self.i2c.clone_unchecked(),
                AnyIOPin::new(i32::from(sda)),
                AnyIOPin::new(i32::from(scl)),
            )
        };
        let config = I2cConfig::new().baudrate(BUS_HZ.Hz());
        self.driver = Some(I2cDriver::new(i2c, sda_pin, scl_pin, &config)?);
        self.pins = Some((sda, scl));
        log::debug!("[I2C] Bound to SDA={} SCL={}", sda, scl);
        Ok(())
    }

    fn detect(&mut self, address: u8) -> Result<bool, Self::Error> {
        if self.read_u8(address, reg::PART_ID)? != reg::EXPECTED_PART_ID {
            return Ok(false);
        }
        self.reset(address)?;
        self.configure(address)?;
        Ok(true)
    }

    fn read_visible(&mut self, address: u8) -> Result<u16, Self::Error> {
        self.read_u16(address, reg::ALS_VIS_DATA0)
    }

    fn read_infrared(&mut self, address: u8) -> Result<u16, Self::Error> {
        self.read_u16(address, reg::ALS_IR_DATA0)
    }

    fn read_uv_raw(&mut self, address: u8) -> Result<u16, Self::Error> {
        self.read_u16(address, reg::UV_INDEX0)
    }
}
