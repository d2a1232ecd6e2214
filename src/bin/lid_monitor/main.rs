//! Polls the lid sensor and logs what it sees, without any audio or screen.
//! Handy for checking that the sensor helper is reachable before playing.

use clap::Parser;
use harmonium::{
    args::HarmoniumArgs, bellows::target_pressure, config::HarmoniumConfig, lid_sensor,
    poller::AnglePoller,
};

use log::{error, info, warn};
use std::{process::exit, thread::sleep};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = HarmoniumArgs::parse();

    let config = match HarmoniumConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };
    info!("Sensor: {:?}", config.sensor);

    let poller = match AnglePoller::spawn(
        lid_sensor::from_source(&config.sensor),
        config.poll_interval(),
    ) {
        Ok(poller) => poller,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    loop {
        sleep(config.poll_interval());
        match poller.latest() {
            Some(angle) => info!(
                "Lid angle {:6.1}, bellows target {:.2}",
                angle,
                target_pressure(angle)
            ),
            None => warn!("No reading yet"),
        }
    }
}
