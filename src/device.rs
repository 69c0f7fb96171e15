//! ADS1115 device session: one chip on one bus address.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::protocol::*;
use crate::transport::Transport;
use crate::types::*;
use crate::Ads1115Error;

/// Address with ADDR tied to GND.
pub const DEFAULT_ADDRESS: u8 = 0x48;

/// The four strap-selectable addresses (ADDR to GND, VDD, SDA, SCL).
pub const ADDRESSES: [u8; 4] = [0x48, 0x49, 0x4A, 0x4B];

/// Interval between configuration register reads while waiting for OS=1.
const READY_POLL: Duration = Duration::from_millis(1);

/// Step of the conversion sequence a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    /// Configuration register written, conversion triggered.
    ConfigWritten,
    /// Waiting out the conversion period.
    Waiting,
    /// Conversion register read back.
    SampleRead,
}

/// Session with one ADS1115.
///
/// Every conversion holds the session lock for the whole
/// write → settle → read sequence, so concurrent callers sharing a
/// session are serialized and never interleave on the chip. Sessions on
/// different addresses share nothing.
///
/// Each conversion starts by reading the configuration register. A
/// conversion still running on the chip (continuous mode, or a single-shot
/// left over from a cancelled call) finishes with its old settings before a
/// new configuration applies, and the sequence waits that out so the sample
/// returned always comes from the requested input and gain.
///
/// ```no_run
/// # #[cfg(feature = "linux")]
/// # fn main() -> Result<(), ads1115::Ads1115Error> {
/// use ads1115::{Ads1115, ReadOptions};
///
/// let adc = Ads1115::open(Some("/dev/i2c-1"), None)?;
/// let volts = adc.read_channel("AIN0", &ReadOptions::default())?;
/// println!("{volts:.4} V");
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "linux"))]
/// # fn main() {}
/// ```
pub struct Ads1115<T: Transport> {
    transport: Mutex<T>,
    address: u8,
    state: Mutex<ConversionState>,
}

impl<T: Transport> Ads1115<T> {
    /// Create a session at [`DEFAULT_ADDRESS`].
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            address: DEFAULT_ADDRESS,
            state: Mutex::new(ConversionState::Idle),
        }
    }

    /// Create a session at a custom 7-bit address.
    pub fn new_with_address(transport: T, address: u8) -> Result<Self, Ads1115Error> {
        if address > 0x7F {
            return Err(Ads1115Error::InvalidAddress(address));
        }
        let mut session = Self::new(transport);
        session.address = address;
        Ok(session)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current step of the in-flight conversion, `Idle` when none is running.
    pub fn state(&self) -> ConversionState {
        *self.state.lock()
    }

    /// Sample the input named by `label` and return volts.
    ///
    /// `label` is one of `AIN0`..`AIN3` (single-ended against GND) or a
    /// differential pair `AIN0-AIN1`, `AIN0-AIN3`, `AIN1-AIN3`,
    /// `AIN2-AIN3`. Blocks for the conversion period of `options.rate`,
    /// plus up to one slowest-rate period if the chip was still converting.
    pub fn read_channel(&self, label: &str, options: &ReadOptions) -> Result<f64, Ads1115Error> {
        let mux = label.parse::<Mux>()?;
        self.read_mux(mux, options)
    }

    /// Like [`read_channel`](Self::read_channel), giving up with
    /// [`Ads1115Error::Cancelled`] if `cancel` fires before the result is read.
    pub fn read_channel_with_cancel(
        &self,
        label: &str,
        options: &ReadOptions,
        cancel: &CancelToken,
    ) -> Result<f64, Ads1115Error> {
        let mux = label.parse::<Mux>()?;
        let raw = self.convert(mux, options, Some(cancel))?;
        Ok(to_volts(raw, options.gain))
    }

    /// Sample a typed mux selection and return volts.
    pub fn read_mux(&self, mux: Mux, options: &ReadOptions) -> Result<f64, Ads1115Error> {
        let raw = self.convert(mux, options, None)?;
        Ok(to_volts(raw, options.gain))
    }

    /// Sample the input named by `label` and return the unscaled count.
    pub fn read_raw(&self, label: &str, options: &ReadOptions) -> Result<RawSample, Ads1115Error> {
        let mux = label.parse::<Mux>()?;
        self.convert(mux, options, None)
    }

    /// Sample all four single-ended inputs in turn, in volts.
    pub fn read_single_ended(&self, options: &ReadOptions) -> Result<[f64; 4], Ads1115Error> {
        let mut volts = [0.0; 4];
        for (slot, mux) in volts.iter_mut().zip(Mux::single_ended()) {
            *slot = self.read_mux(mux, options)?;
        }
        Ok(volts)
    }

    /// Read back and decode the configuration register.
    pub fn read_config(&self) -> Result<Configuration, Ads1115Error> {
        let mut transport = self.transport.lock();
        self.fetch_config(&mut *transport)
    }

    /// Read the conversion register as-is, without triggering a conversion.
    ///
    /// Useful in continuous mode once a first conversion has completed.
    pub fn read_conversion(&self) -> Result<RawSample, Ads1115Error> {
        let mut transport = self.transport.lock();
        self.fetch_conversion(&mut *transport)
    }

    /// Close the session and give back the transport.
    pub fn release(self) -> T {
        self.transport.into_inner()
    }

    // --- Conversion sequence ---

    /// Run one full conversion: write configuration, wait, read.
    ///
    /// The configuration is encoded before the bus is touched, and always
    /// written in full; nothing is assumed about the chip's registers from
    /// a previous call.
    fn convert(
        &self,
        mux: Mux,
        options: &ReadOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<RawSample, Ads1115Error> {
        let config = Configuration::for_conversion(mux, options);
        let frame = build_config_write(&config)?;
        let park = build_config_write(&config.with_os(OperationalStatus::NoEffect))?;

        let mut transport = self.transport.lock();
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Ads1115Error::Cancelled);
        }

        let result = self.run_conversion(&mut *transport, mux, &frame, &park, options, cancel);
        self.set_state(ConversionState::Idle);
        result
    }

    fn run_conversion(
        &self,
        transport: &mut T,
        mux: Mux,
        frame: &[u8; 3],
        park: &[u8; 3],
        options: &ReadOptions,
        cancel: Option<&CancelToken>,
    ) -> Result<RawSample, Ads1115Error> {
        let single_shot = options.mode == Mode::SingleShot;
        let busy = !self.fetch_config(transport)?.is_powered_down();

        if busy && single_shot {
            // OS=1 is ignored while a conversion runs. Park the chip in
            // single-shot mode and let the running conversion finish first.
            debug!(
                "ADS1115@{:#04x} {}: conversion in progress, parking",
                self.address,
                mux.label()
            );
            self.write_config(transport, park)?;
            self.set_state(ConversionState::Waiting);
            self.wait_ready(transport, in_flight_bound() + options.settle_margin, mux, cancel)?;
        }

        debug!(
            "ADS1115@{:#04x} {}: config {:02X} {:02X}",
            self.address,
            mux.label(),
            frame[1],
            frame[2]
        );
        self.write_config(transport, frame)?;
        self.set_state(ConversionState::ConfigWritten);

        let settle = settle_time(options.rate, options.settle_margin);
        let wait = if busy && !single_shot {
            // The running conversion completes with the old settings, then
            // the first conversion with the new ones begins.
            in_flight_bound() + settle
        } else {
            settle
        };
        self.set_state(ConversionState::Waiting);
        self.pause(wait, mux, cancel)?;
        if single_shot {
            self.wait_ready(transport, settle, mux, cancel)?;
        }

        let raw = self.fetch_conversion(transport)?;
        self.set_state(ConversionState::SampleRead);
        trace!(
            "ADS1115@{:#04x} {}: raw {} after {:?}",
            self.address,
            mux.label(),
            raw,
            wait
        );
        Ok(raw)
    }

    /// Poll the OS bit until the chip reports no conversion in progress.
    fn wait_ready(
        &self,
        transport: &mut T,
        limit: Duration,
        mux: Mux,
        cancel: Option<&CancelToken>,
    ) -> Result<(), Ads1115Error> {
        let give_up = Instant::now() + limit;
        loop {
            if self.fetch_config(transport)?.conversion_ready() {
                return Ok(());
            }
            if Instant::now() >= give_up {
                warn!(
                    "ADS1115@{:#04x} {}: still converting after {:?}",
                    self.address,
                    mux.label(),
                    limit
                );
                return Err(Ads1115Error::NotReady(limit));
            }
            self.pause(READY_POLL, mux, cancel)?;
        }
    }

    fn pause(&self, wait: Duration, mux: Mux, cancel: Option<&CancelToken>) -> Result<(), Ads1115Error> {
        match cancel {
            Some(token) if !token.sleep(wait) => {
                // Whatever was written stays written; the conversion runs
                // out on the chip and is simply not read.
                warn!(
                    "ADS1115@{:#04x} {}: conversion cancelled while waiting",
                    self.address,
                    mux.label()
                );
                Err(Ads1115Error::Cancelled)
            }
            Some(_) => Ok(()),
            None => {
                std::thread::sleep(wait);
                Ok(())
            }
        }
    }

    // --- Register access, lock already held ---

    fn write_config(&self, transport: &mut T, frame: &[u8; 3]) -> Result<(), Ads1115Error> {
        transport
            .write(self.address, frame)
            .map_err(|e| Ads1115Error::transport("config write", e))
    }

    fn fetch_config(&self, transport: &mut T) -> Result<Configuration, Ads1115Error> {
        let mut buf = [0u8; 2];
        transport
            .write_read(self.address, &[REG_CONFIG], &mut buf)
            .map_err(|e| Ads1115Error::transport("config read", e))?;
        Ok(decode_config(buf))
    }

    fn fetch_conversion(&self, transport: &mut T) -> Result<RawSample, Ads1115Error> {
        let mut buf = [0u8; 2];
        transport
            .write_read(self.address, &[REG_CONVERSION], &mut buf)
            .map_err(|e| Ads1115Error::transport("conversion read", e))?;
        Ok(decode_raw(buf))
    }

    fn set_state(&self, state: ConversionState) {
        trace!("ADS1115@{:#04x}: -> {:?}", self.address, state);
        *self.state.lock() = state;
    }
}

#[cfg(feature = "linux")]
impl Ads1115<crate::transport::I2cBus<linux_embedded_hal::I2cdev>> {
    /// Open an ADS1115 on a Linux I2C bus.
    ///
    /// - `bus`: Bus device path. If `None`, uses the first `/dev/i2c-*` found.
    /// - `address`: 7-bit device address. If `None`, uses [`DEFAULT_ADDRESS`].
    pub fn open(bus: Option<&str>, address: Option<u8>) -> Result<Self, Ads1115Error> {
        let path = match bus {
            Some(p) => p.to_string(),
            None => crate::linux::find_buses()
                .into_iter()
                .next()
                .ok_or(Ads1115Error::NoDevice)?,
        };
        let transport = crate::linux::open_bus(&path)?;
        Self::new_with_address(transport, address.unwrap_or(DEFAULT_ADDRESS))
    }
}
