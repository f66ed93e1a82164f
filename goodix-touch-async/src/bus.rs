//! Register access over the controller's 16-bit addressed I2C interface.

use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use heapless::Vec;

use crate::error::BusError;
use crate::reg::CONFIG_MAX_LENGTH;

const ADDR_LEN: usize = 2;

/// Big-endian register addressing on top of an [`I2c`] peripheral.
pub struct RegisterBus<I2C> {
    i2c: I2C,
    address: SevenBitAddress,
}

impl<I2C, E> RegisterBus<I2C>
where
    I2C: I2c<SevenBitAddress, Error = E>,
{
    /// Wraps `i2c`, addressing the controller at `address`.
    pub fn new(i2c: I2C, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit bus address of the controller.
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Reads `buf.len()` bytes starting at register `reg`.
    pub async fn read(&mut self, reg: u16, buf: &mut [u8]) -> Result<(), BusError<E>> {
        self.i2c
            .write_read(self.address, &reg.to_be_bytes(), buf)
            .await
            .map_err(BusError::Read)
    }

    /// Writes `data` starting at register `reg`.
    pub async fn write(&mut self, reg: u16, data: &[u8]) -> Result<(), BusError<E>> {
        let mut frame: Vec<u8, { CONFIG_MAX_LENGTH + ADDR_LEN }> = Vec::new();
        frame
            .extend_from_slice(&reg.to_be_bytes())
            .map_err(|_| BusError::Overflow)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| BusError::Overflow)?;
        self.i2c
            .write(self.address, &frame)
            .await
            .map_err(BusError::Write)
    }

    /// Writes a single byte to register `reg`.
    pub async fn write_u8(&mut self, reg: u16, value: u8) -> Result<(), BusError<E>> {
        self.write(reg, &[value]).await
    }

    /// Releases the underlying peripheral.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
