use ads1115::{discover_devices, Ads1115, DataRate, Mux, Pga, ReadOptions};

fn main() -> Result<(), ads1115::Ads1115Error> {
    env_logger::init();

    // Discover connected devices
    let devices = discover_devices();
    if devices.is_empty() {
        eprintln!("No ADS1115 devices found.");
        std::process::exit(1);
    }
    for dev in &devices {
        println!(
            "Found: {} @ {:#04x} (config {})",
            dev.bus,
            dev.address,
            hex::encode(ads1115::protocol::encode_config(&dev.config)?)
        );
    }

    let first = &devices[0];
    let adc = Ads1115::open(Some(&first.bus), Some(first.address))?;

    // Single-ended inputs, widest range
    let opts = ReadOptions::new(Pga::Fs6_144, DataRate::Sps128);
    for mux in Mux::single_ended() {
        let volts = adc.read_mux(mux, &opts)?;
        println!("{:<9} {:>8.4} V", mux.label(), volts);
    }

    // Differential pair at higher resolution
    let opts = ReadOptions::new(Pga::Fs0_256, DataRate::Sps8);
    let raw = adc.read_raw("AIN0-AIN1", &opts)?;
    println!(
        "\nAIN0-AIN1 raw {raw} = {:.7} V",
        ads1115::protocol::to_volts(raw, opts.gain)
    );

    // Configuration as left on the chip
    let cfg = adc.read_config()?;
    println!("\nConfig: {cfg:?}");
    println!("Conversion ready: {}", cfg.conversion_ready());

    Ok(())
}
