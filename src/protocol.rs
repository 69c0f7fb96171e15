//! ADS1115 register protocol: register map, configuration word codec,
//! conversion decoding and gain scaling.
//!
//! Pure functions with no I/O — reusable with any transport.

use std::time::Duration;

use crate::types::*;
use crate::Ads1115Error;

// --- Register pointers ---
pub const REG_CONVERSION: u8 = 0x00;
pub const REG_CONFIG: u8 = 0x01;
pub const REG_LO_THRESH: u8 = 0x02;
pub const REG_HI_THRESH: u8 = 0x03;

/// Counts per half of the bipolar input range.
pub const FULL_SCALE_COUNTS: f64 = 32768.0;

/// Power-on value of the configuration register.
pub const CONFIG_RESET: u16 = 0x8583;

/// Position and width of one configuration field inside the 16-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// Bit offset of the field's LSB within the 16-bit word.
    pub shift: u8,
    pub width: u8,
}

impl Field {
    const fn new(name: &'static str, shift: u8, width: u8) -> Self {
        Self { name, shift, width }
    }

    /// Unshifted mask of `width` ones.
    pub const fn mask(self) -> u16 {
        (1 << self.width) - 1
    }

    /// Place `value` at the field's position, rejecting anything wider
    /// than the field.
    pub fn place(self, value: u8) -> Result<u16, Ads1115Error> {
        let value = value as u16;
        if value > self.mask() {
            return Err(Ads1115Error::InvalidFieldValue {
                field: self.name,
                value: value as u8,
                width: self.width,
            });
        }
        Ok(value << self.shift)
    }

    /// Pull the field's value back out of a configuration word.
    pub fn extract(self, word: u16) -> u8 {
        ((word >> self.shift) & self.mask()) as u8
    }
}

// --- Configuration fields, MSB byte ---
pub const FIELD_OS: Field = Field::new("os", 15, 1);
pub const FIELD_MUX: Field = Field::new("mux", 12, 3);
pub const FIELD_PGA: Field = Field::new("pga", 9, 3);
pub const FIELD_MODE: Field = Field::new("mode", 8, 1);
// --- Configuration fields, LSB byte ---
pub const FIELD_DR: Field = Field::new("data_rate", 5, 3);
pub const FIELD_COMP_MODE: Field = Field::new("comparator_mode", 4, 1);
pub const FIELD_COMP_POL: Field = Field::new("comparator_polarity", 3, 1);
pub const FIELD_COMP_LAT: Field = Field::new("comparator_latch", 2, 1);
pub const FIELD_COMP_QUE: Field = Field::new("comparator_queue", 0, 2);

/// All nine fields, most significant first.
pub const FIELDS: [Field; 9] = [
    FIELD_OS,
    FIELD_MUX,
    FIELD_PGA,
    FIELD_MODE,
    FIELD_DR,
    FIELD_COMP_MODE,
    FIELD_COMP_POL,
    FIELD_COMP_LAT,
    FIELD_COMP_QUE,
];

/// Contents of the configuration register, one raw code per field.
///
/// Codes are kept as plain `u8` so a read-back can be represented exactly;
/// width checking happens in [`encode_config`]. The typed `with_*` setters
/// and getters convert through the enums in [`crate::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub os: u8,
    pub mux: u8,
    pub pga: u8,
    pub mode: u8,
    pub data_rate: u8,
    pub comparator_mode: u8,
    pub comparator_polarity: u8,
    pub comparator_latch: u8,
    pub comparator_queue: u8,
}

impl Default for Configuration {
    /// The chip's power-on reset configuration (`0x8583`).
    fn default() -> Self {
        Self {
            os: OperationalStatus::Start as u8,
            mux: Mux::Ain0Ain1 as u8,
            pga: Pga::Fs2_048 as u8,
            mode: Mode::SingleShot as u8,
            data_rate: DataRate::Sps128 as u8,
            comparator_mode: ComparatorMode::Traditional as u8,
            comparator_polarity: ComparatorPolarity::ActiveLow as u8,
            comparator_latch: ComparatorLatch::NonLatching as u8,
            comparator_queue: ComparatorQueue::Disabled as u8,
        }
    }
}

impl Configuration {
    /// Configuration that starts a conversion on `mux` with the given policy.
    pub fn for_conversion(mux: Mux, options: &ReadOptions) -> Self {
        Self::default()
            .with_os(OperationalStatus::Start)
            .with_mux(mux)
            .with_pga(options.gain)
            .with_mode(options.mode)
            .with_data_rate(options.rate)
            .with_comparator_mode(options.comparator_mode)
            .with_comparator_polarity(options.comparator_polarity)
            .with_comparator_latch(options.comparator_latch)
            .with_comparator_queue(options.comparator_queue)
    }

    pub fn with_os(mut self, os: OperationalStatus) -> Self {
        self.os = os as u8;
        self
    }

    pub fn with_mux(mut self, mux: Mux) -> Self {
        self.mux = mux as u8;
        self
    }

    pub fn with_pga(mut self, pga: Pga) -> Self {
        self.pga = pga as u8;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode as u8;
        self
    }

    pub fn with_data_rate(mut self, rate: DataRate) -> Self {
        self.data_rate = rate as u8;
        self
    }

    pub fn with_comparator_mode(mut self, mode: ComparatorMode) -> Self {
        self.comparator_mode = mode as u8;
        self
    }

    pub fn with_comparator_polarity(mut self, polarity: ComparatorPolarity) -> Self {
        self.comparator_polarity = polarity as u8;
        self
    }

    pub fn with_comparator_latch(mut self, latch: ComparatorLatch) -> Self {
        self.comparator_latch = latch as u8;
        self
    }

    pub fn with_comparator_queue(mut self, queue: ComparatorQueue) -> Self {
        self.comparator_queue = queue as u8;
        self
    }

    /// On a read-back, the OS bit is 1 once no conversion is in progress.
    pub fn conversion_ready(&self) -> bool {
        self.os == 1
    }

    /// Single-shot mode with no conversion running: the chip is powered
    /// down and the next OS=1 write starts a fresh conversion.
    pub fn is_powered_down(&self) -> bool {
        self.conversion_ready() && self.mode == Mode::SingleShot as u8
    }

    pub fn os_setting(&self) -> Result<OperationalStatus, Ads1115Error> {
        OperationalStatus::try_from(self.os).map_err(|v| invalid(FIELD_OS, v))
    }

    pub fn mux_setting(&self) -> Result<Mux, Ads1115Error> {
        Mux::try_from(self.mux).map_err(|v| invalid(FIELD_MUX, v))
    }

    pub fn pga_setting(&self) -> Result<Pga, Ads1115Error> {
        Pga::try_from(self.pga).map_err(|v| invalid(FIELD_PGA, v))
    }

    pub fn mode_setting(&self) -> Result<Mode, Ads1115Error> {
        Mode::try_from(self.mode).map_err(|v| invalid(FIELD_MODE, v))
    }

    pub fn data_rate_setting(&self) -> Result<DataRate, Ads1115Error> {
        DataRate::try_from(self.data_rate).map_err(|v| invalid(FIELD_DR, v))
    }

    pub fn comparator_mode_setting(&self) -> Result<ComparatorMode, Ads1115Error> {
        ComparatorMode::try_from(self.comparator_mode).map_err(|v| invalid(FIELD_COMP_MODE, v))
    }

    pub fn comparator_polarity_setting(&self) -> Result<ComparatorPolarity, Ads1115Error> {
        ComparatorPolarity::try_from(self.comparator_polarity).map_err(|v| invalid(FIELD_COMP_POL, v))
    }

    pub fn comparator_latch_setting(&self) -> Result<ComparatorLatch, Ads1115Error> {
        ComparatorLatch::try_from(self.comparator_latch).map_err(|v| invalid(FIELD_COMP_LAT, v))
    }

    pub fn comparator_queue_setting(&self) -> Result<ComparatorQueue, Ads1115Error> {
        ComparatorQueue::try_from(self.comparator_queue).map_err(|v| invalid(FIELD_COMP_QUE, v))
    }

    /// Raw field codes in [`FIELDS`] order.
    fn codes(&self) -> [u8; 9] {
        [
            self.os,
            self.mux,
            self.pga,
            self.mode,
            self.data_rate,
            self.comparator_mode,
            self.comparator_polarity,
            self.comparator_latch,
            self.comparator_queue,
        ]
    }
}

fn invalid(field: Field, value: u8) -> Ads1115Error {
    Ads1115Error::InvalidFieldValue {
        field: field.name,
        value,
        width: field.width,
    }
}

/// Pack a configuration into its register bytes, MSB first.
///
/// Fails with [`Ads1115Error::InvalidFieldValue`] naming the first field
/// whose code does not fit its width.
pub fn encode_config(config: &Configuration) -> Result<[u8; 2], Ads1115Error> {
    let mut word = 0u16;
    for (field, code) in FIELDS.iter().zip(config.codes()) {
        word |= field.place(code)?;
    }
    Ok(word.to_be_bytes())
}

/// Unpack configuration register bytes (MSB first). Every 16-bit pattern
/// decodes.
pub fn decode_config(bytes: [u8; 2]) -> Configuration {
    let word = u16::from_be_bytes(bytes);
    Configuration {
        os: FIELD_OS.extract(word),
        mux: FIELD_MUX.extract(word),
        pga: FIELD_PGA.extract(word),
        mode: FIELD_MODE.extract(word),
        data_rate: FIELD_DR.extract(word),
        comparator_mode: FIELD_COMP_MODE.extract(word),
        comparator_polarity: FIELD_COMP_POL.extract(word),
        comparator_latch: FIELD_COMP_LAT.extract(word),
        comparator_queue: FIELD_COMP_QUE.extract(word),
    }
}

/// Reinterpret the conversion register (high byte first) as two's complement.
pub fn decode_raw(bytes: [u8; 2]) -> RawSample {
    i16::from_be_bytes(bytes)
}

/// Build the write frame for the configuration register:
/// `[REG_CONFIG, msb, lsb]`.
pub fn build_config_write(config: &Configuration) -> Result<[u8; 3], Ads1115Error> {
    let [msb, lsb] = encode_config(config)?;
    Ok([REG_CONFIG, msb, lsb])
}

// --- Gain table ---

/// Full-scale input range in volts for a gain setting.
pub fn full_scale_range(pga: Pga) -> f64 {
    match pga {
        Pga::Fs6_144 => 6.144,
        Pga::Fs4_096 => 4.096,
        Pga::Fs2_048 => 2.048,
        Pga::Fs1_024 => 1.024,
        Pga::Fs0_512 => 0.512,
        Pga::Fs0_256 => 0.256,
    }
}

/// Volts per count: one LSB at the given gain.
pub fn scale_factor(pga: Pga) -> f64 {
    match pga {
        Pga::Fs6_144 => 187.5e-6,
        Pga::Fs4_096 => 125.0e-6,
        Pga::Fs2_048 => 62.5e-6,
        Pga::Fs1_024 => 31.25e-6,
        Pga::Fs0_512 => 15.625e-6,
        Pga::Fs0_256 => 7.8125e-6,
    }
}

/// Scale a raw sample to volts.
pub fn to_volts(raw: RawSample, pga: Pga) -> f64 {
    raw as f64 * scale_factor(pga)
}

/// Time to wait between triggering a conversion and reading it back.
///
/// The conversion period plus 10% for the internal oscillator tolerance,
/// plus `margin`.
pub fn settle_time(rate: DataRate, margin: Duration) -> Duration {
    let period = rate.conversion_time();
    period + period / 10 + margin
}

/// Longest a conversion already running on the chip can take to finish:
/// one period at the slowest rate, with the same 10% tolerance.
///
/// A configuration written while the chip is converting only takes effect
/// once that conversion completes, whatever rate it was started at.
pub fn in_flight_bound() -> Duration {
    settle_time(DataRate::Sps8, Duration::ZERO)
}
