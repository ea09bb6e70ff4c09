use cpal::traits::{DeviceTrait, HostTrait};
use log::LevelFilter;
use std::io::Read;
use std::process::exit;

pub fn init_logger() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .with_colors(true)
        .with_utc_timestamps()
        .init()
        .unwrap();
}

/// Returns all valid and available input devices.
fn get_input_devices() -> Vec<(cpal::HostId, Vec<cpal::Device>)> {
    cpal::available_hosts()
        .into_iter()
        .filter_map(|host_id| {
            let host = cpal::host_from_id(host_id).ok()?;
            let devices = host.devices().ok()?;
            Some((host_id, devices))
        })
        .map(|(host_id, devices)| {
            (
                host_id,
                devices
                    // check: is input device?
                    .filter(|dev| dev.default_input_config().is_ok())
                    // check: can we get its name?
                    .filter(|dev| dev.name().is_ok())
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>()
}

/// Prompts the user in the terminal to choose an audio input device.
pub fn select_audio_device() -> cpal::Device {
    let mut devices = get_input_devices()
        .into_iter()
        .flat_map(|(host_id, devices)| devices.into_iter().map(move |dev| (host_id, dev)))
        .collect::<Vec<_>>();

    if devices.is_empty() {
        println!("No audio input device available");
        exit(0);
    }

    if devices.len() == 1 {
        return devices.swap_remove(0).1;
    }

    println!("Available input devices:");
    for (device_i, (host_id, device)) in devices.iter().enumerate() {
        println!(
            "[{}]: {:?} - {}",
            device_i,
            host_id,
            device
                .name()
                .expect("should be existent at that point due to the filtering")
        );
    }

    print!("Type a number: ");
    let mut buf = [0];
    std::io::stdin().read_exact(&mut buf).unwrap();
    println!(); // newline
    let buf = std::str::from_utf8(&buf).unwrap();
    let choice = buf.parse::<usize>().unwrap();

    // Remove element and take ownership.
    devices.swap_remove(choice).1
}
