//! Linux `/dev/i2c-*` bus access through `linux-embedded-hal`.

use std::path::Path;

use linux_embedded_hal::I2cdev;

use crate::transport::I2cBus;
use crate::Ads1115Error;

/// List I2C bus device nodes, ordered by bus number.
pub fn find_buses() -> Vec<String> {
    let mut buses: Vec<(u32, String)> = std::fs::read_dir("/dev")
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let name = entry.file_name().into_string().ok()?;
                    let number = name.strip_prefix("i2c-")?.parse().ok()?;
                    Some((number, entry.path().to_string_lossy().into_owned()))
                })
                .collect()
        })
        .unwrap_or_default();
    buses.sort();
    buses.into_iter().map(|(_, path)| path).collect()
}

/// Open an I2C bus device, e.g. `/dev/i2c-1`.
pub fn open_bus<P: AsRef<Path>>(path: P) -> Result<I2cBus<I2cdev>, Ads1115Error> {
    let path = path.as_ref();
    let i2c = I2cdev::new(path)
        .map_err(|e| Ads1115Error::Bus(format!("Failed to open {}: {e}", path.display())))?;
    Ok(I2cBus::new(i2c))
}
