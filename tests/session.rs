//! Session-level tests against simulated buses. No hardware required.

use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use ads1115::protocol::{decode_config, REG_CONFIG, REG_CONVERSION};
use ads1115::*;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

fn fast(gain: Pga) -> ReadOptions {
    ReadOptions::new(gain, DataRate::Sps860).with_settle_margin(Duration::ZERO)
}

// -- Simulated chip behind the embedded-hal adapter --

#[derive(Debug)]
struct SimError(ErrorKind);

impl embedded_hal::i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Conversion running on the simulated chip: the input it samples is
/// latched when it starts.
struct Running {
    ends: Instant,
    mux: u8,
}

/// Register-level model of one ADS1115 with conversion timing.
///
/// A conversion takes one nominal period of the configured rate. A
/// configuration written while a conversion runs only applies once that
/// conversion completes, and OS=1 is ignored then. In continuous mode the
/// next conversion starts as soon as one completes, with the settings
/// current at that moment; in single-shot mode the chip powers down.
struct SimulatedAdc {
    address: u8,
    pointer: u8,
    config: [u8; 2],
    conversion: [u8; 2],
    running: Option<Running>,
    inputs: [i16; 8],
}

impl SimulatedAdc {
    fn new(address: u8) -> Self {
        let mut inputs = [0i16; 8];
        for (code, value) in inputs.iter_mut().enumerate() {
            *value = (code as i16 - 4) * 1000;
        }
        Self {
            address,
            pointer: 0,
            config: [0x85, 0x83],
            conversion: [0, 0],
            running: None,
            inputs,
        }
    }

    fn start(&mut self, at: Instant) {
        let cfg = decode_config(self.config);
        let period = cfg.data_rate_setting().unwrap().conversion_time();
        self.running = Some(Running {
            ends: at + period,
            mux: cfg.mux,
        });
    }

    /// Complete every conversion that has ended by `now`.
    fn advance(&mut self, now: Instant) {
        while let Some(run) = self.running.take() {
            if run.ends > now {
                self.running = Some(run);
                return;
            }
            self.conversion = self.inputs[run.mux as usize].to_be_bytes();
            if decode_config(self.config).mode_setting().unwrap() == Mode::Continuous {
                self.start(run.ends);
            }
        }
    }

    fn write_config(&mut self, msb: u8, lsb: u8) {
        let now = Instant::now();
        self.advance(now);
        self.config = [msb, lsb];
        let cfg = decode_config(self.config);
        if self.running.is_none() && (cfg.conversion_ready() || cfg.mode_setting().unwrap() == Mode::Continuous) {
            self.start(now);
        }
    }

    fn read_config(&mut self) -> [u8; 2] {
        self.advance(Instant::now());
        let os = if self.running.is_some() { 0x00 } else { 0x80 };
        [self.config[0] & 0x7F | os, self.config[1]]
    }
}

#[test]
fn simulated_chip_single_ended_inputs() {
    let adc = Ads1115::new(I2cBus::new(SimulatedAdc::new(DEFAULT_ADDRESS)));
    let volts = adc.read_single_ended(&fast(Pga::Fs6_144)).unwrap();
    // Single-ended codes 4..=7 are wired to 0, 1000, 2000, 3000 counts.
    let expected = [0.0, 1000.0 * 187.5e-6, 2000.0 * 187.5e-6, 3000.0 * 187.5e-6];
    for (got, want) in volts.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
    }
}

#[test]
fn simulated_chip_differential_is_signed() {
    let adc = Ads1115::new(I2cBus::new(SimulatedAdc::new(DEFAULT_ADDRESS)));
    // AIN0-AIN1 is mux code 0, wired to -4000 counts.
    let raw = adc.read_raw("AIN0-AIN1", &fast(Pga::Fs2_048)).unwrap();
    assert_eq!(raw, -4000);
    let volts = adc.read_channel("ain0-ain1", &fast(Pga::Fs2_048)).unwrap();
    assert!((volts + 0.25).abs() < 1e-12, "got {volts}");
}

#[test]
fn simulated_chip_config_readback() {
    let adc = Ads1115::new(I2cBus::new(SimulatedAdc::new(DEFAULT_ADDRESS)));
    assert_eq!(adc.read_config().unwrap(), Configuration::default());

    let opts = fast(Pga::Fs0_512).with_mode(Mode::Continuous);
    adc.read_channel("AIN3", &opts).unwrap();
    let cfg = adc.read_config().unwrap();
    assert_eq!(cfg.mux_setting().unwrap(), Mux::Ain3);
    assert_eq!(cfg.pga_setting().unwrap(), Pga::Fs0_512);
    assert_eq!(cfg.mode_setting().unwrap(), Mode::Continuous);
    assert_eq!(cfg.data_rate_setting().unwrap(), DataRate::Sps860);
}

#[test]
fn single_shot_after_slow_continuous_reads_new_input() {
    let adc = Ads1115::new(I2cBus::new(SimulatedAdc::new(DEFAULT_ADDRESS)));
    let slow = ReadOptions::new(Pga::Fs2_048, DataRate::Sps8).with_mode(Mode::Continuous);
    assert_eq!(adc.read_raw("AIN1", &slow).unwrap(), 1000);

    // The chip is still converting AIN1 at 8 SPS; the new request must not
    // return that conversion.
    assert_eq!(adc.read_raw("AIN3", &fast(Pga::Fs2_048)).unwrap(), 3000);
    let cfg = adc.read_config().unwrap();
    assert_eq!(cfg.mode_setting().unwrap(), Mode::SingleShot);
    assert!(cfg.conversion_ready());
}

#[test]
fn continuous_rate_change_reads_new_input() {
    let adc = Ads1115::new(I2cBus::new(SimulatedAdc::new(DEFAULT_ADDRESS)));
    let slow = ReadOptions::new(Pga::Fs2_048, DataRate::Sps8).with_mode(Mode::Continuous);
    assert_eq!(adc.read_raw("AIN1", &slow).unwrap(), 1000);

    let quick = fast(Pga::Fs0_512).with_mode(Mode::Continuous);
    assert_eq!(adc.read_raw("AIN3", &quick).unwrap(), 3000);
    let volts = adc.read_channel("AIN2", &quick).unwrap();
    assert!((volts - 2000.0 * 15.625e-6).abs() < 1e-12, "got {volts}");
}

#[test]
fn simulated_chip_defers_config_until_conversion_ends() {
    // Guard on the model itself: a bare write mid-conversion changes nothing yet.
    let mut chip = SimulatedAdc::new(DEFAULT_ADDRESS);
    chip.write_config(0x50, 0x03); // AIN1, continuous, 8 SPS
    chip.write_config(0xF1, 0xE3); // AIN3, single-shot, 860 SPS, OS=1
    thread::sleep(Duration::from_millis(5));
    assert_eq!(chip.read_config()[0] & 0x80, 0, "AIN1 conversion still running");
    thread::sleep(DataRate::Sps8.conversion_time());
    assert_eq!(chip.read_config()[0] & 0x80, 0x80, "powered down, not retriggered");
    chip.advance(Instant::now());
    assert_eq!(i16::from_be_bytes(chip.conversion), 1000);
}

#[test]
fn absent_device_surfaces_transport_error() {
    let adc = Ads1115::new_with_address(I2cBus::new(SimulatedAdc::new(0x49)), 0x48).unwrap();
    match adc.read_channel("AIN0", &fast(Pga::Fs2_048)) {
        Err(Ads1115Error::Transport { op, source }) => {
            // The sequence opens with a configuration read-back.
            assert_eq!(op, "config read");
            let bus = source.downcast_ref::<BusError>().expect("source should be a BusError");
            assert_eq!(bus.kind, ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

// -- Recording transport --

#[derive(Debug, thiserror::Error)]
#[error("recorder failure")]
struct RecorderError;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Write(ThreadId, Vec<u8>),
    WriteRead(ThreadId, Vec<u8>),
}

/// Records every call and flags any call made while another caller's
/// sequence, opened by its configuration read, has not yet read its sample.
/// Conversions finish instantly: the configuration reads back with OS=1.
struct Recorder {
    calls: Vec<Call>,
    config: [u8; 2],
    owner: Option<ThreadId>,
    overlaps: usize,
}

impl Recorder {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            config: [0x85, 0x83],
            owner: None,
            overlaps: 0,
        }
    }

    fn enter(&mut self) -> ThreadId {
        let me = thread::current().id();
        match self.owner {
            Some(owner) if owner != me => self.overlaps += 1,
            Some(_) => {}
            None => self.owner = Some(me),
        }
        me
    }
}

impl Transport for Recorder {
    type Error = RecorderError;

    fn write(&mut self, _address: u8, bytes: &[u8]) -> Result<(), RecorderError> {
        let me = self.enter();
        self.config = [bytes[1] | 0x80, bytes[2]];
        self.calls.push(Call::Write(me, bytes.to_vec()));
        Ok(())
    }

    fn write_read(&mut self, _address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), RecorderError> {
        let me = self.enter();
        self.calls.push(Call::WriteRead(me, bytes.to_vec()));
        match bytes[0] {
            REG_CONFIG => buffer.copy_from_slice(&self.config),
            _ => {
                self.owner = None;
                buffer.fill(0);
            }
        }
        Ok(())
    }
}

#[test]
fn golden_config_write_for_ain2() {
    let adc = Ads1115::new(Recorder::new());
    let opts = ReadOptions::new(Pga::Fs4_096, DataRate::Sps128).with_settle_margin(Duration::ZERO);
    adc.read_channel("AIN2", &opts).unwrap();
    let calls = adc.release().calls;
    // OS=1 MUX=110 PGA=001 MODE=1 | DR=100 COMP=000 QUE=11
    let golden = hex::decode("01e383").unwrap();
    assert_eq!(calls.len(), 4);
    assert!(matches!(&calls[0], Call::WriteRead(_, bytes) if *bytes == [REG_CONFIG]));
    assert!(matches!(&calls[1], Call::Write(_, bytes) if *bytes == golden));
    assert!(matches!(&calls[2], Call::WriteRead(_, bytes) if *bytes == [REG_CONFIG]));
    assert!(matches!(&calls[3], Call::WriteRead(_, bytes) if *bytes == [REG_CONVERSION]));
}

#[test]
fn every_label_selects_its_own_mux_code() {
    let adc = Ads1115::new(Recorder::new());
    let labels = [
        "AIN0-AIN1", "AIN0-AIN3", "AIN1-AIN3", "AIN2-AIN3", "AIN0", "AIN1", "AIN2", "AIN3",
    ];
    for label in labels {
        adc.read_channel(label, &fast(Pga::Fs2_048)).unwrap();
    }
    let codes: Vec<u8> = adc
        .release()
        .calls
        .into_iter()
        .filter_map(|call| match call {
            Call::Write(_, bytes) => Some(decode_config([bytes[1], bytes[2]]).mux),
            Call::WriteRead(..) => None,
        })
        .collect();
    assert_eq!(codes, (0..8).collect::<Vec<u8>>());
}

#[test]
fn unknown_label_never_reaches_the_bus() {
    let adc = Ads1115::new(Recorder::new());
    for label in ["AIN4", "ain", "AIN3-AIN0", "VDD"] {
        assert!(matches!(
            adc.read_channel(label, &fast(Pga::Fs2_048)),
            Err(Ads1115Error::UnknownChannel(_))
        ));
    }
    assert!(adc.release().calls.is_empty());
}

#[test]
fn session_is_shareable_across_threads() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<Ads1115<Recorder>>();
    assert_sync::<Ads1115<I2cBus<SimulatedAdc>>>();
}

#[test]
fn concurrent_reads_never_interleave() {
    const PER_THREAD: usize = 6;

    let adc = Ads1115::new(Recorder::new());
    thread::scope(|s| {
        for label in ["AIN0", "AIN1", "AIN2"] {
            let adc = &adc;
            s.spawn(move || {
                for _ in 0..PER_THREAD {
                    adc.read_channel(label, &fast(Pga::Fs2_048)).unwrap();
                }
            });
        }
    });
    assert_eq!(adc.state(), ConversionState::Idle);

    let recorder = adc.release();
    assert_eq!(recorder.overlaps, 0);
    assert_eq!(recorder.calls.len(), 3 * PER_THREAD * 4);
    for sequence in recorder.calls.chunks(4) {
        match sequence {
            [Call::WriteRead(a, check), Call::Write(b, _), Call::WriteRead(c, _), Call::WriteRead(d, read)] => {
                assert_eq!(*check, [REG_CONFIG]);
                assert_eq!(*read, [REG_CONVERSION]);
                assert!(a == b && b == c && c == d, "sequence split across threads");
            }
            other => panic!("sequence broken: {other:?}"),
        }
    }
}

#[test]
fn independent_sessions_run_in_parallel() {
    let sessions: Vec<_> = ADDRESSES
        .iter()
        .map(|&addr| Ads1115::new_with_address(I2cBus::new(SimulatedAdc::new(addr)), addr).unwrap())
        .collect();
    let results: Vec<f64> = thread::scope(|s| {
        let handles: Vec<_> = sessions
            .iter()
            .map(|adc| s.spawn(move || adc.read_channel("AIN3", &fast(Pga::Fs2_048)).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for volts in results {
        assert!((volts - 3000.0 * 62.5e-6).abs() < 1e-12);
    }
}

#[test]
fn cancel_from_another_thread() {
    let adc = Ads1115::new(Recorder::new());
    let token = CancelToken::new();
    let slow = ReadOptions::new(Pga::Fs2_048, DataRate::Sps8);
    let result = thread::scope(|s| {
        let remote = token.clone();
        s.spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.cancel();
        });
        adc.read_channel_with_cancel("AIN1", &slow, &token)
    });
    assert!(matches!(result, Err(Ads1115Error::Cancelled)));
    let calls = adc.release().calls;
    assert_eq!(calls.len(), 2, "the read must be abandoned, not issued");
    assert!(matches!(&calls[1], Call::Write(..)));
}
