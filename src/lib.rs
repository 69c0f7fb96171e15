//! # ads1115
//!
//! Register-level driver for the TI ADS1115 16-bit delta-sigma ADC on an
//! I2C bus.
//!
//! The bus itself is abstracted behind [`Transport`]; any `embedded-hal`
//! 1.0 I2C implementation can be used through [`I2cBus`]. With the `linux`
//! feature, `/dev/i2c-*` buses can be opened and scanned directly.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "linux")]
//! # fn main() -> Result<(), ads1115::Ads1115Error> {
//! use ads1115::{Ads1115, DataRate, Pga, ReadOptions};
//!
//! let adc = Ads1115::open(None, None)?;
//!
//! let volts = adc.read_channel("AIN2", &ReadOptions::new(Pga::Fs4_096, DataRate::Sps128))?;
//! println!("AIN2: {volts:.4} V");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "linux"))]
//! # fn main() {}
//! ```

pub mod cancel;
pub mod device;
#[cfg(feature = "linux")]
pub mod discovery;
#[cfg(feature = "linux")]
pub mod linux;
pub mod protocol;
pub mod transport;
pub mod types;

pub use cancel::CancelToken;
pub use device::{Ads1115, ConversionState, ADDRESSES, DEFAULT_ADDRESS};
#[cfg(feature = "linux")]
pub use discovery::{discover_devices, open_first, probe_device, DiscoveredDevice};
#[cfg(feature = "linux")]
pub use linux::{find_buses, open_bus};
pub use protocol::Configuration;
pub use transport::{BusError, I2cBus, Transport};
pub use types::*;

/// Errors returned by the ads1115 driver.
#[derive(Debug, thiserror::Error)]
pub enum Ads1115Error {
    /// A configuration field code does not fit its bit width.
    #[error("Invalid value {value} for {width}-bit field {field}")]
    InvalidFieldValue {
        field: &'static str,
        value: u8,
        width: u8,
    },

    /// The requested input label is not one of the eight mux selections.
    #[error("Unknown channel: {0:?}")]
    UnknownChannel(String),

    /// Device address outside the 7-bit range.
    #[error("Invalid I2C address: {0:#04x}")]
    InvalidAddress(u8),

    /// The bus collaborator failed; `op` names the protocol step.
    #[error("Transport error during {op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The conversion was cancelled before its result was read.
    #[error("Conversion cancelled")]
    Cancelled,

    /// The chip still reported a conversion in progress when the wait for
    /// it ran out.
    #[error("Conversion not ready after {0:?}")]
    NotReady(std::time::Duration),

    /// Opening a bus device failed.
    #[error("Bus error: {0}")]
    Bus(String),

    /// No bus or device found during auto-discovery.
    #[error("No ADS1115 device found")]
    NoDevice,
}

impl Ads1115Error {
    pub(crate) fn transport<E>(op: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            op,
            source: Box::new(source),
        }
    }
}
