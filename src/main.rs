//! Glidesynth - pointer motion becomes a click-free tone and a scrolling
//! spectral waterfall.

use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use glidesynth::audio::AudioSystem;
use glidesynth::cli::{Args, SourceKind};
use glidesynth::control::{event_channel, ControlPlane};
use glidesynth::params::ConfigHandle;
use glidesynth::record::render_offline;
use glidesynth::shared::SharedState;
use glidesynth::source::{spawn_stdin_reader, DemoGesture};
use glidesynth::synth::ParameterTarget;
use glidesynth::visual::Visualizer;

/// Demo runs this long when no duration is given
const DEFAULT_DEMO_SECS: f32 = 10.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ConfigHandle::new(args.engine_config())?;

    if let Some(recording) = args.recording_config() {
        info!(
            "Offline render: {:.1}s → {}",
            recording.duration_secs, recording.output_dir
        );
        render_offline(config, &recording)?;
        return Ok(());
    }

    run_live(&args, config)
}

fn run_live(args: &Args, config: ConfigHandle) -> Result<(), Box<dyn Error>> {
    let shared = SharedState::new(ParameterTarget::silent(
        config.load().synth.base_frequency_hz,
    ));
    let (sender, events) = event_channel();

    // Audio first: a device failure is fatal before any thread starts
    let audio = AudioSystem::start(config.clone(), Arc::clone(&shared))?;

    let control = ControlPlane::new(config.clone(), Arc::clone(&shared), events).spawn()?;

    let (source, join_source, duration) = match args.source {
        SourceKind::Demo => {
            let handle = DemoGesture::default().spawn(sender.clone(), Arc::clone(&shared))?;
            (handle, true, Some(args.duration.unwrap_or(DEFAULT_DEMO_SECS)))
        }
        SourceKind::Stdin => {
            info!("Reading `dx dy` lines from standard input");
            let handle = spawn_stdin_reader(sender.clone(), Arc::clone(&shared))?;
            (handle, false, args.duration)
        }
    };
    // Only producers hold senders, so a finished source disconnects the queue
    drop(sender);

    let mut visualizer = Visualizer::new(audio.sample_rate_hz(), config.clone(), Arc::clone(&shared));
    let refresh = config.load().spectrum.refresh_interval();
    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs_f32(secs.max(0.0)));
    let mut next_tick = Instant::now();
    let mut ticks: u64 = 0;

    loop {
        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            break;
        }
        if source.is_finished() && shared.smoothed_volume() == 0.0 {
            info!("Source finished and output is silent");
            break;
        }

        let snapshot = visualizer.snapshot();
        ticks += 1;
        if ticks % 64 == 0 {
            debug!(
                sequence = snapshot.sequence,
                volume = shared.smoothed_volume(),
                skipped = shared.frames_skipped(),
                "visual tick"
            );
        }

        next_tick += refresh;
        thread::sleep(next_tick.saturating_duration_since(Instant::now()));
    }

    let mut threads = vec![("Control", control)];
    if join_source {
        threads.push(("Source", source));
    }
    shut_down(|| audio.stop(), &shared, threads)?;

    if let Some(path) = &args.waterfall {
        visualizer.waterfall().to_image().save(path)?;
        info!("Waterfall saved to {}", path);
    }

    Ok(())
}

/// Stop audio, clear the running flag, then join `threads`.
///
/// A failure to stop the stream is logged and returned only after the rest
/// of the sequence has run.
fn shut_down<E: Display>(
    stop_audio: impl FnOnce() -> Result<(), E>,
    shared: &SharedState,
    threads: Vec<(&'static str, JoinHandle<()>)>,
) -> Result<(), E> {
    let stopped = stop_audio();
    if let Err(err) = &stopped {
        error!("Failed to stop audio stream: {}", err);
    }

    shared.shutdown();
    for (name, handle) in threads {
        if handle.join().is_err() {
            warn!("{} thread panicked", name);
        }
    }
    stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use glidesynth::error::AudioError;

    #[test]
    fn test_shutdown_continues_after_audio_stop_failure() {
        let shared = SharedState::new(ParameterTarget::silent(110.0));
        let finished = Arc::new(AtomicBool::new(false));

        let worker = {
            let shared = Arc::clone(&shared);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                while shared.is_running() {
                    thread::sleep(Duration::from_millis(1));
                }
                finished.store(true, Ordering::SeqCst);
            })
        };

        let result = shut_down(
            || Err(AudioError::NoOutputDevice),
            &shared,
            vec![("Worker", worker)],
        );

        assert!(matches!(result, Err(AudioError::NoOutputDevice)));
        assert!(!shared.is_running());
        assert!(finished.load(Ordering::SeqCst));
    }
}
