//! Field encodings of the ADS1115 configuration register.
//!
//! Every enum carries its datasheet code as the discriminant. `TryFrom<u8>`
//! returns the rejected code on failure, the same way a register read-back
//! reports an unknown value.

use std::str::FromStr;
use std::time::Duration;

use crate::Ads1115Error;

/// Operational status bit (MSB[7]).
///
/// On write, `Start` triggers a single conversion. On read, the same bit
/// reads 1 when the device is idle and 0 while a conversion is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationalStatus {
    NoEffect = 0,
    Start = 1,
}

impl TryFrom<u8> for OperationalStatus {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::NoEffect),
            1 => Ok(Self::Start),
            _ => Err(v),
        }
    }
}

/// Input multiplexer selection (MSB[6:4]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mux {
    /// AIN0 positive, AIN1 negative (reset value).
    Ain0Ain1 = 0b000,
    Ain0Ain3 = 0b001,
    Ain1Ain3 = 0b010,
    Ain2Ain3 = 0b011,
    /// AIN0 against GND.
    Ain0 = 0b100,
    Ain1 = 0b101,
    Ain2 = 0b110,
    Ain3 = 0b111,
}

impl Mux {
    /// All eight selections, in code order.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Ain0Ain1,
            Self::Ain0Ain3,
            Self::Ain1Ain3,
            Self::Ain2Ain3,
            Self::Ain0,
            Self::Ain1,
            Self::Ain2,
            Self::Ain3,
        ]
        .into_iter()
    }

    /// The four single-ended inputs.
    pub fn single_ended() -> impl Iterator<Item = Self> {
        [Self::Ain0, Self::Ain1, Self::Ain2, Self::Ain3].into_iter()
    }

    /// Canonical request label, e.g. `AIN2` or `AIN0-AIN1`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ain0Ain1 => "AIN0-AIN1",
            Self::Ain0Ain3 => "AIN0-AIN3",
            Self::Ain1Ain3 => "AIN1-AIN3",
            Self::Ain2Ain3 => "AIN2-AIN3",
            Self::Ain0 => "AIN0",
            Self::Ain1 => "AIN1",
            Self::Ain2 => "AIN2",
            Self::Ain3 => "AIN3",
        }
    }

    /// True for the inputs measured against ground.
    pub fn is_single_ended(self) -> bool {
        (self as u8) & 0b100 != 0
    }
}

impl FromStr for Mux {
    type Err = Ads1115Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        Self::all()
            .find(|mux| mux.label() == label)
            .ok_or_else(|| Ads1115Error::UnknownChannel(s.to_string()))
    }
}

impl TryFrom<u8> for Mux {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0b000 => Ok(Self::Ain0Ain1),
            0b001 => Ok(Self::Ain0Ain3),
            0b010 => Ok(Self::Ain1Ain3),
            0b011 => Ok(Self::Ain2Ain3),
            0b100 => Ok(Self::Ain0),
            0b101 => Ok(Self::Ain1),
            0b110 => Ok(Self::Ain2),
            0b111 => Ok(Self::Ain3),
            _ => Err(v),
        }
    }
}

/// Programmable gain amplifier setting (MSB[3:1]), named by full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pga {
    /// ±6.144 V
    Fs6_144 = 0b000,
    /// ±4.096 V
    Fs4_096 = 0b001,
    /// ±2.048 V (reset value)
    Fs2_048 = 0b010,
    /// ±1.024 V
    Fs1_024 = 0b011,
    /// ±0.512 V
    Fs0_512 = 0b100,
    /// ±0.256 V
    Fs0_256 = 0b101,
}

impl Pga {
    /// All six settings, widest range first.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Fs6_144,
            Self::Fs4_096,
            Self::Fs2_048,
            Self::Fs1_024,
            Self::Fs0_512,
            Self::Fs0_256,
        ]
        .into_iter()
    }

    /// Full-scale range in volts.
    pub fn full_scale_volts(self) -> f64 {
        crate::protocol::full_scale_range(self)
    }

    /// Volts per count.
    pub fn scale_factor(self) -> f64 {
        crate::protocol::scale_factor(self)
    }
}

impl TryFrom<u8> for Pga {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0b000 => Ok(Self::Fs6_144),
            0b001 => Ok(Self::Fs4_096),
            0b010 => Ok(Self::Fs2_048),
            0b011 => Ok(Self::Fs1_024),
            0b100 => Ok(Self::Fs0_512),
            // 110 and 111 mirror 101 on the chip
            0b101 | 0b110 | 0b111 => Ok(Self::Fs0_256),
            _ => Err(v),
        }
    }
}

/// Operating mode (MSB[0]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Continuous = 0,
    /// Single-shot, power-down between conversions (reset value).
    SingleShot = 1,
}

impl TryFrom<u8> for Mode {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::Continuous),
            1 => Ok(Self::SingleShot),
            _ => Err(v),
        }
    }
}

/// Data rate in samples per second (LSB[7:5]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataRate {
    Sps8 = 0b000,
    Sps16 = 0b001,
    Sps32 = 0b010,
    Sps64 = 0b011,
    /// Reset value.
    Sps128 = 0b100,
    Sps250 = 0b101,
    Sps475 = 0b110,
    Sps860 = 0b111,
}

impl DataRate {
    /// All eight rates, slowest first.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Sps8,
            Self::Sps16,
            Self::Sps32,
            Self::Sps64,
            Self::Sps128,
            Self::Sps250,
            Self::Sps475,
            Self::Sps860,
        ]
        .into_iter()
    }

    pub fn samples_per_second(self) -> u32 {
        match self {
            Self::Sps8 => 8,
            Self::Sps16 => 16,
            Self::Sps32 => 32,
            Self::Sps64 => 64,
            Self::Sps128 => 128,
            Self::Sps250 => 250,
            Self::Sps475 => 475,
            Self::Sps860 => 860,
        }
    }

    /// Nominal conversion period, rounded up to the microsecond.
    pub fn conversion_time(self) -> Duration {
        let sps = self.samples_per_second() as u64;
        Duration::from_micros(1_000_000u64.div_ceil(sps))
    }
}

impl TryFrom<u8> for DataRate {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0b000 => Ok(Self::Sps8),
            0b001 => Ok(Self::Sps16),
            0b010 => Ok(Self::Sps32),
            0b011 => Ok(Self::Sps64),
            0b100 => Ok(Self::Sps128),
            0b101 => Ok(Self::Sps250),
            0b110 => Ok(Self::Sps475),
            0b111 => Ok(Self::Sps860),
            _ => Err(v),
        }
    }
}

/// Comparator mode (LSB[4]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComparatorMode {
    /// Hysteresis comparator (reset value).
    Traditional = 0,
    Window = 1,
}

impl TryFrom<u8> for ComparatorMode {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::Traditional),
            1 => Ok(Self::Window),
            _ => Err(v),
        }
    }
}

/// ALERT/RDY pin polarity (LSB[3]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComparatorPolarity {
    /// Reset value.
    ActiveLow = 0,
    ActiveHigh = 1,
}

impl TryFrom<u8> for ComparatorPolarity {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::ActiveLow),
            1 => Ok(Self::ActiveHigh),
            _ => Err(v),
        }
    }
}

/// Latching comparator (LSB[2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComparatorLatch {
    /// Reset value.
    NonLatching = 0,
    Latching = 1,
}

impl TryFrom<u8> for ComparatorLatch {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::NonLatching),
            1 => Ok(Self::Latching),
            _ => Err(v),
        }
    }
}

/// Comparator queue and disable (LSB[1:0]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ComparatorQueue {
    AssertAfterOne = 0b00,
    AssertAfterTwo = 0b01,
    AssertAfterFour = 0b10,
    /// Comparator off, ALERT/RDY high-impedance (reset value).
    Disabled = 0b11,
}

impl TryFrom<u8> for ComparatorQueue {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0b00 => Ok(Self::AssertAfterOne),
            0b01 => Ok(Self::AssertAfterTwo),
            0b10 => Ok(Self::AssertAfterFour),
            0b11 => Ok(Self::Disabled),
            _ => Err(v),
        }
    }
}

/// Signed 16-bit content of the conversion register.
pub type RawSample = i16;

/// Per-request conversion policy.
///
/// The defaults match the chip's reset configuration plus a 1 ms settle
/// margin on top of the conversion period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOptions {
    pub gain: Pga,
    pub rate: DataRate,
    pub mode: Mode,
    pub comparator_mode: ComparatorMode,
    pub comparator_polarity: ComparatorPolarity,
    pub comparator_latch: ComparatorLatch,
    pub comparator_queue: ComparatorQueue,
    /// Extra wait added after the oscillator-tolerant conversion period.
    pub settle_margin: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            gain: Pga::Fs2_048,
            rate: DataRate::Sps128,
            mode: Mode::SingleShot,
            comparator_mode: ComparatorMode::Traditional,
            comparator_polarity: ComparatorPolarity::ActiveLow,
            comparator_latch: ComparatorLatch::NonLatching,
            comparator_queue: ComparatorQueue::Disabled,
            settle_margin: Duration::from_millis(1),
        }
    }
}

impl ReadOptions {
    pub fn new(gain: Pga, rate: DataRate) -> Self {
        Self {
            gain,
            rate,
            ..Self::default()
        }
    }

    pub fn with_gain(mut self, gain: Pga) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_comparator(
        mut self,
        mode: ComparatorMode,
        polarity: ComparatorPolarity,
        latch: ComparatorLatch,
        queue: ComparatorQueue,
    ) -> Self {
        self.comparator_mode = mode;
        self.comparator_polarity = polarity;
        self.comparator_latch = latch;
        self.comparator_queue = queue;
        self
    }

    pub fn with_settle_margin(mut self, margin: Duration) -> Self {
        self.settle_margin = margin;
        self
    }
}
