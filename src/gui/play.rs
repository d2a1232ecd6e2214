use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

use crate::{
    error::HarmoniumError,
    gui::scene::draw_scene,
    instrument::Instrument,
    keyboard::translate_key,
    mixer::AudioSink,
    poller::AngleCell,
};

use crossterm::{
    event::{
        self, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use log::{info, warn};
use ratatui::{backend::Backend, prelude::*, Terminal};

/// Takes over the terminal and plays until the player closes the instrument.
///
/// When the terminal can report key releases the instrument is told to trust
/// them; otherwise the configured hold window decides when a key is let go.
/// The terminal is restored before returning, even if the loop failed.
pub fn play<S: AudioSink>(
    mut instrument: Instrument<S>,
    angle: AngleCell,
    frame_period: Duration,
) -> Result<Instrument<S>, HarmoniumError> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        stdout().execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
        instrument.trust_key_releases();
        info!("Terminal reports key releases");
    } else {
        warn!("Terminal does not report key releases, falling back to the hold window");
    }

    let res = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(HarmoniumError::from)
        .and_then(|mut terminal| {
            terminal.clear()?;
            run_loop(&mut terminal, &mut instrument, &angle, frame_period)
        });

    let restored = restore_terminal(enhanced);
    res.and(restored).map(|_| instrument)
}

/// Undoes what [`play`] did to the terminal. Every step is attempted; the
/// first failure is reported.
fn restore_terminal(enhanced: bool) -> Result<(), HarmoniumError> {
    first_error([
        if enhanced {
            stdout().execute(PopKeyboardEnhancementFlags).map(|_| ())
        } else {
            Ok(())
        },
        disable_raw_mode(),
        stdout().execute(LeaveAlternateScreen).map(|_| ()),
    ])?;
    Ok(())
}

fn first_error(steps: impl IntoIterator<Item = io::Result<()>>) -> io::Result<()> {
    steps.into_iter().fold(Ok(()), |first, step| first.and(step))
}

fn run_loop<B: Backend, S: AudioSink>(
    terminal: &mut Terminal<B>,
    instrument: &mut Instrument<S>,
    angle: &AngleCell,
    frame_period: Duration,
) -> Result<(), HarmoniumError> {
    let mut last_frame = Instant::now();
    let mut frames: u64 = 0;

    while instrument.is_running() {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            if let event::Event::Key(key) = event::read()? {
                if let Some(action) = translate_key(&key) {
                    instrument.handle(action, frame_start);
                }
            }
        }

        let dt = frame_start.saturating_duration_since(last_frame);
        last_frame = frame_start;
        let scene = instrument.frame(angle.get(), dt, frame_start);
        terminal.draw(|f| draw_scene(f, &scene))?;
        frames += 1;

        if let Some(rest) = frame_period.checked_sub(frame_start.elapsed()) {
            spin_sleep::sleep(rest);
        }
    }

    info!("Drew {} frames", frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn restore_reports_the_first_failed_step() {
        let mut ran = 0;
        let mut step = |result: io::Result<()>| {
            ran += 1;
            result
        };
        let res = first_error([
            step(Err(io::Error::new(ErrorKind::Other, "pop"))),
            step(Ok(())),
            step(Err(io::Error::new(ErrorKind::Other, "leave"))),
        ]);
        assert_eq!(ran, 3);
        assert_eq!(res.unwrap_err().to_string(), "pop");
        assert!(first_error([Ok(()), Ok(())]).is_ok());
    }
}
