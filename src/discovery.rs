//! Device discovery: find ADS1115 chips on the local I2C buses.

use linux_embedded_hal::I2cdev;

use crate::device::{Ads1115, ADDRESSES};
use crate::linux::{find_buses, open_bus};
use crate::protocol::Configuration;
use crate::transport::I2cBus;
use crate::Ads1115Error;

/// A responding device with its bus, address and current configuration.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Bus device path (e.g. `/dev/i2c-1`).
    pub bus: String,
    pub address: u8,
    /// Configuration register as read during the probe.
    pub config: Configuration,
}

/// Probe one address on one bus.
///
/// Reads the configuration register and returns it if the device answers.
/// Any device that acknowledges a two-byte register read passes, so this
/// confirms presence rather than identity.
pub fn probe_device(bus: &str, address: u8) -> Option<Configuration> {
    let mut transport = open_bus(bus).ok()?;
    let adc = Ads1115::new_with_address(&mut transport, address).ok()?;
    adc.read_config().ok()
}

/// Probe the four strap addresses on every I2C bus.
///
/// Each bus is opened once and shared by its probes.
pub fn discover_devices() -> Vec<DiscoveredDevice> {
    let mut found = Vec::new();
    for bus in find_buses() {
        let Ok(mut transport) = open_bus(&bus) else {
            continue;
        };
        for address in ADDRESSES {
            let Ok(adc) = Ads1115::new_with_address(&mut transport, address) else {
                continue;
            };
            if let Ok(config) = adc.read_config() {
                found.push(DiscoveredDevice {
                    bus: bus.clone(),
                    address,
                    config,
                });
            }
        }
    }
    found
}

/// Open the first discovered device.
pub fn open_first() -> Result<Ads1115<I2cBus<I2cdev>>, Ads1115Error> {
    let device = discover_devices()
        .into_iter()
        .next()
        .ok_or(Ads1115Error::NoDevice)?;
    Ads1115::open(Some(&device.bus), Some(device.address))
}
