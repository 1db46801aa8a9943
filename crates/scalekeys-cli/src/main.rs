//! scalekeys: play a scale-bounded keyboard from the terminal

mod commands;
mod config;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use commands::{Command, HELP};
use config::AppConfig;
use crossbeam_channel::Receiver;
use scalekeys_core::{key_for_slot, PitchTable, ScaleCatalog};
use scalekeys_services::{
    load_scales, EffectStore, MetronomeBeat, OutputRouter, SerialError, SerialLink, Session, SessionError,
    METRONOME_BEATS,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BUNDLED_SCALES: &str = include_str!("../data/scales.csv");

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("scalekeys=info".parse()?)
            .add_directive("scalekeys_services=info".parse()?))
        .init();

    let config = config::load_config();
    info!(path = %config::config_path().display(), "Starting scalekeys");

    let table = PitchTable::new();
    let catalog = match load_scales(&config.scales_path, &table) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(path = %config.scales_path.display(), error = %e, "Using bundled scales");
            ScaleCatalog::from_reader(BUNDLED_SCALES.as_bytes(), &table).context("bundled scales")?
        }
    };

    let router = Arc::new(OutputRouter::new(config.output, open_serial(&config), table));
    let store = EffectStore::new(config.effect_state_path.clone());
    let mut session = Session::new(catalog, router, config.timing.scheduler(), store);
    print_beats(session.beats());

    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run(&mut session, &config, command),
            Ok(None) => {}
            Err(message) => println!("{message}"),
        }
        io::stdout().flush()?;
    }

    // dropping the session stops runs, releases notes and closes the port
    drop(session);
    Ok(())
}

/// Prints metronome beats while it runs.
fn print_beats(beats: Receiver<MetronomeBeat>) {
    thread::spawn(move || {
        for beat in beats {
            println!("{}", beat_mark(&beat));
        }
    });
}

fn beat_mark(beat: &MetronomeBeat) -> String {
    let tick = if beat.accent { "TICK" } else { "tick" };
    format!("{tick} {}/{METRONOME_BEATS} bar {}", beat.index + 1, beat.bar + 1)
}

/// Opens the configured port when the output needs one. Failure is reported
/// and leaves the link closed so another port can be chosen.
fn open_serial(config: &AppConfig) -> SerialLink {
    if !config.output.uses_serial() {
        return SerialLink::closed();
    }
    let port = match &config.serial.port {
        Some(port) => port.clone(),
        None => match SerialLink::available_ports() {
            Ok(mut ports) => ports.swap_remove(0),
            Err(e) => {
                warn!(error = %e, "No serial output");
                return SerialLink::closed();
            }
        },
    };
    match SerialLink::open(&port, config.serial.settings()) {
        Ok(link) => link,
        Err(e) => {
            warn!(error = %e, "No serial output");
            SerialLink::closed()
        }
    }
}

fn run(session: &mut Session, config: &AppConfig, command: Command) {
    match command {
        Command::Scale { root, mode } => match session.select_scale(&root, &mode) {
            Ok(true) => show(session),
            Ok(false) => println!("select a root and a mode"),
            Err(e) => println!("{e}"),
        },
        Command::Scales => {
            println!("roots: {}", session.catalog().roots().join(" "));
            println!("modes: {}", session.catalog().modes().join(" "));
        }
        Command::Show => show(session),
        Command::ShiftLeft => moved(session, Session::shift_left),
        Command::ShiftRight => moved(session, Session::shift_right),
        Command::OctaveUp => moved(session, |s| s.change_octave(1)),
        Command::OctaveDown => moved(session, |s| s.change_octave(-1)),
        Command::Play(keys) => {
            for key in keys.chars() {
                let mut events = session.key_down_char(key);
                events.extend(session.key_up_char(key));
                println!("{key}: {events:?}");
            }
        }
        Command::Hold(key) => println!("{:?}", session.key_down_char(key)),
        Command::Release(key) => println!("{:?}", session.key_up_char(key)),
        Command::Effect(effect) => {
            session.set_effect(effect);
            println!("effect: {effect}");
        }
        Command::RemoveEffect => match session.remove_effect() {
            Ok(Some(effect)) => println!("removed {effect}"),
            Ok(None) => println!("no effect active"),
            Err(e) => println!("{e}"),
        },
        Command::LoadEffect => match session.load_effect() {
            Ok(effect) => println!("effect: {effect}"),
            Err(SessionError::Store(e)) => println!("{e}; effect unchanged"),
            Err(e) => println!("{e}"),
        },
        Command::Record => println!("recording: {}", session.toggle_recording()),
        Command::Metronome => println!("metronome: {}", session.toggle_metronome()),
        Command::Pattern => println!("{}", session.pattern()),
        Command::Ports => match SerialLink::available_ports() {
            Ok(ports) => println!("{}", ports.join("\n")),
            Err(SerialError::NoPorts) => println!("no serial ports found"),
            Err(e) => println!("{e}"),
        },
        Command::Port(name) => match SerialLink::open(&name, config.serial.settings()) {
            Ok(link) => {
                session.router().replace_serial(link);
                println!("serial: {name}");
            }
            Err(e) => println!("{e}; try `ports`"),
        },
        Command::Output(mode) => session.router().set_mode(mode),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn moved(session: &mut Session, step: impl FnOnce(&mut Session) -> bool) {
    if step(session) {
        show(session);
    } else {
        println!("at the edge");
    }
}

fn show(session: &Session) {
    let window = session.window();
    let keys: Vec<String> = window
        .visible()
        .iter()
        .enumerate()
        .map(|(slot, key)| {
            let marker = if window.is_root(slot) { "*" } else { "" };
            format!("{}:{}{marker}", key_for_slot(slot).unwrap_or('?'), key.label())
        })
        .collect();
    println!("{}", keys.join(" "));
}
