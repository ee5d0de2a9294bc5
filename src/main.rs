//! Console monitor: runs the engine against a capture source and prints
//! direction snapshots until stdin closes or the user enters `q`.
//!
//! Usage:
//!   sound-radar [--list | SOURCE_ID]
//!
//! SOURCE_ID is an id from `--list` (e.g. `system_audio`, `output:Speakers`,
//! `input:Microphone`); the default is the system loopback.

use sound_radar::{EngineSettings, RadarEngine, SensitivityProfile};
use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    let arg = std::env::args().nth(1);
    match arg.as_deref() {
        Some("--list") => list_sources(),
        Some("--help") | Some("-h") => print_usage(),
        source => run_monitor(source.map(str::to_string)),
    }
}

fn print_usage() {
    println!("Usage: sound-radar [--list | SOURCE_ID]");
    println!();
    println!("Profiles: {}", profile_names().join(", "));
    println!("Set SOUND_RADAR_PROFILE to pick one (default: balanced).");
}

fn profile_names() -> Vec<String> {
    SensitivityProfile::presets()
        .into_iter()
        .map(|p| p.name)
        .collect()
}

fn list_sources() {
    match sound_radar::list_sources() {
        Ok(sources) => {
            for source in sources {
                println!("{:40} {}", source.id, source.name);
            }
        }
        Err(e) => {
            log::error!("Failed to enumerate sources: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_monitor(source_id: Option<String>) {
    let mut settings = EngineSettings::default();
    if let Ok(name) = std::env::var("SOUND_RADAR_PROFILE") {
        match SensitivityProfile::preset(&name) {
            Some(profile) => settings.profile = profile,
            None => log::warn!("Unknown profile '{}', using balanced", name),
        }
    }

    let mut engine = match RadarEngine::start(source_id, settings) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to start capture: {}", e);
            std::process::exit(1);
        }
    };

    println!("Listening. Press q + Enter to quit.");

    // stdin watcher so the print loop stays interruptible
    let (quit_tx, quit_rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(text) if text.trim() == "q" => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        let _ = quit_tx.send(());
    });

    loop {
        match quit_rx.recv_timeout(Duration::from_millis(250)) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        if let Some(error) = engine.fatal_error() {
            log::error!("Capture failed: {}", error);
            break;
        }

        let snapshot = engine.snapshot();
        let direction = &snapshot.direction;
        let label = direction.dominant_label.as_deref().unwrap_or("-");
        println!(
            "[{}] az {:+6.0} deg  el {:+5.0} deg  mag {:.2}  hits {:2}  {}",
            snapshot.mode_label,
            direction.azimuth.to_degrees(),
            direction.elevation.to_degrees(),
            direction.magnitude,
            snapshot.hits.len(),
            label,
        );
    }

    engine.stop();
}
