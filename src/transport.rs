//! Bus capability the driver needs: an addressed write and a combined
//! write-then-read that keeps ownership of the bus across both phases.

use embedded_hal::i2c::{ErrorKind, I2c};

/// Byte-level bus access for one or more devices.
///
/// Errors are handed back to the caller unchanged, wrapped in
/// [`crate::Ads1115Error::Transport`].
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write `bytes` to the device at 7-bit `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Write `bytes`, then fill `buffer`, as one transaction (repeated start).
    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8])
        -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, bytes)
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).write_read(address, bytes, buffer)
    }
}

/// Error from an `embedded-hal` I2C bus.
///
/// `embedded-hal` only requires bus errors to be `Debug`, so the original
/// error is kept as its debug rendering next to its classified kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("I2C {kind}: {detail}")]
pub struct BusError {
    pub kind: ErrorKind,
    pub detail: String,
}

/// [`Transport`] over any `embedded-hal` 1.0 I2C bus.
pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give back the underlying bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> From<I> for I2cBus<I> {
    fn from(i2c: I) -> Self {
        Self::new(i2c)
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(e: E) -> BusError {
    BusError {
        kind: e.kind(),
        detail: format!("{e:?}"),
    }
}

impl<I: I2c> Transport for I2cBus<I> {
    type Error = BusError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.i2c.write(address, bytes).map_err(bus_error)
    }

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), BusError> {
        self.i2c.write_read(address, bytes, buffer).map_err(bus_error)
    }
}
