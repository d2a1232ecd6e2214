//! The instrument. Focus the terminal, hold A through K to play, open and
//! close the lid to pump the bellows, hold Space for a drone, M to change
//! mode, Esc to quit.

use clap::Parser;
use harmonium::{
    args::HarmoniumArgs,
    audio_engine::AudioEngine,
    config::HarmoniumConfig,
    error::HarmoniumError,
    gui::play,
    instrument::Instrument,
    lid_sensor,
    poller::AnglePoller,
    samples::SampleBank,
};

use log::{error, info};
use std::{fs::File, path::Path, process::exit, time::Instant};

// Example:
// cargo run --bin harmonium --
//                           --assets  sounds
//                           --sensor  simulated
//                           --log-file harmonium.log

fn main() {
    let args = HarmoniumArgs::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("Could not open log file: {}", e);
        exit(1);
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("harmonium: {}", e);
        exit(1);
    }
}

/// The log goes to `log_file` if given, since stderr shares the screen with
/// the instrument.
fn init_logging(log_file: Option<&Path>) -> Result<(), HarmoniumError> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn run(args: &HarmoniumArgs) -> Result<(), HarmoniumError> {
    let config = HarmoniumConfig::from_args(args)?;
    info!("Starting with {:?}", config);

    let bank = SampleBank::load(&config.asset_dir)?;
    let engine = AudioEngine::start(&bank)?;

    let mut poller = AnglePoller::spawn(
        lid_sensor::from_source(&config.sensor),
        config.poll_interval(),
    )?;

    let instrument = Instrument::new(engine, config.hold_window(), Instant::now());
    let res = play(instrument, poller.cell(), config.frame_period());
    poller.stop()?;

    let instrument = res?;
    info!(
        "Stopped with {} voice(s) still sounding",
        instrument.playback().sink().voice_count()
    );
    Ok(())
}
