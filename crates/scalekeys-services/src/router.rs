//! Fans processed note events out to the selected sinks

use std::sync::Mutex;

use scalekeys_core::{Frame, NoteEvent, PitchTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pattern::{MidiAccumulator, Rhythm};
use crate::serial::SerialLink;
use crate::task::{CancelToken, TaskHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    MidiFile,
    #[serde(rename = "serial")]
    SerialOnly,
    Both,
}

impl OutputMode {
    pub fn uses_serial(&self) -> bool {
        matches!(self, Self::SerialOnly | Self::Both)
    }

    pub fn uses_midi(&self) -> bool {
        matches!(self, Self::MidiFile | Self::Both)
    }
}

struct Sinks {
    mode: OutputMode,
    serial: SerialLink,
    midi: MidiAccumulator,
}

impl Sinks {
    fn deliver(&mut self, event: NoteEvent) {
        if self.mode.uses_serial() {
            self.serial.send(Frame::from(event));
        }
        if self.mode.uses_midi() {
            if let NoteEvent::On(code) = event {
                self.midi.append_note(code);
            }
        }
    }
}

/// Shared by the control thread and background runs. Every event is
/// delivered under one lock, so two producers never interleave frames.
pub struct OutputRouter {
    sinks: Mutex<Sinks>,
}

impl OutputRouter {
    pub fn new(mode: OutputMode, serial: SerialLink, table: PitchTable) -> Self {
        Self {
            sinks: Mutex::new(Sinks {
                mode,
                serial,
                midi: MidiAccumulator::new(table),
            }),
        }
    }

    pub fn dispatch(&self, event: NoteEvent) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.deliver(event);
        }
    }

    pub fn dispatch_all(&self, events: &[NoteEvent]) {
        if events.is_empty() {
            return;
        }
        if let Ok(mut sinks) = self.sinks.lock() {
            for event in events {
                sinks.deliver(*event);
            }
        }
    }

    /// Delivers unless the run owning `token` was cancelled. The check is made
    /// under the sinks lock; returns whether the event went out.
    pub fn dispatch_unless_cancelled(&self, event: NoteEvent, token: &CancelToken) -> bool {
        let Ok(mut sinks) = self.sinks.lock() else {
            return false;
        };
        if token.is_cancelled() {
            return false;
        }
        sinks.deliver(event);
        token.track(event);
        true
    }

    /// Waits for any in-flight delivery from the cancelled run, then switches
    /// off the pitch it left sounding. Nothing from the run follows.
    pub fn silence_cancelled(&self, handle: &TaskHandle) {
        let Ok(mut sinks) = self.sinks.lock() else {
            return;
        };
        if let Some(code) = handle.take_sounding() {
            debug!(code, "Releasing note cut short");
            sinks.deliver(NoteEvent::Off(code));
        }
    }

    /// Sends the first window keys as a config frame; no-op without a serial sink.
    pub fn send_window_config(&self, codes: &[u8]) {
        if let Ok(sinks) = self.sinks.lock() {
            if sinks.mode.uses_serial() {
                debug!(?codes, "Window config");
                sinks.serial.send(Frame::config(codes));
            }
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.sinks.lock().map(|s| s.mode).unwrap_or_default()
    }

    pub fn set_mode(&self, mode: OutputMode) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.mode = mode;
            info!(?mode, "Output mode");
        }
    }

    /// Swaps in a new serial link, closing the previous one.
    pub fn replace_serial(&self, link: SerialLink) {
        let old = self
            .sinks
            .lock()
            .ok()
            .map(|mut s| std::mem::replace(&mut s.serial, link));
        // closed outside the lock: draining paces every queued byte
        drop(old);
    }

    pub fn close_serial(&self) {
        self.replace_serial(SerialLink::closed());
    }

    pub fn serial_open(&self) -> bool {
        self.sinks.lock().map(|s| s.serial.is_open()).unwrap_or(false)
    }

    pub fn is_recording(&self) -> bool {
        self.sinks.lock().map(|s| s.midi.is_recording()).unwrap_or(false)
    }

    pub fn set_recording(&self, recording: bool) {
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.midi.set_recording(recording);
            info!(recording, "MIDI recording");
        }
    }

    pub fn toggle_recording(&self) -> bool {
        let recording = !self.is_recording();
        self.set_recording(recording);
        recording
    }

    /// Adds a rhythm fragment if recording to a MIDI sink.
    pub fn append_rhythm(&self, rhythm: Rhythm) -> bool {
        let Ok(mut sinks) = self.sinks.lock() else {
            return false;
        };
        if !sinks.mode.uses_midi() || !sinks.midi.is_recording() {
            return false;
        }
        sinks.midi.append_rhythm(rhythm);
        true
    }

    pub fn pattern(&self) -> String {
        self.sinks.lock().map(|s| s.midi.pattern()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::tests::MemoryPort;
    use crate::task::cancel_pair;
    use std::time::Duration;

    fn router(mode: OutputMode) -> (OutputRouter, MemoryPort) {
        let port = MemoryPort::default();
        let link = SerialLink::attach("mem", port.clone(), Duration::ZERO);
        (OutputRouter::new(mode, link, PitchTable::new()), port)
    }

    #[test]
    fn test_serial_only_skips_pattern() {
        let (router, port) = router(OutputMode::SerialOnly);
        router.set_recording(true);
        router.dispatch(NoteEvent::On(60));
        router.dispatch(NoteEvent::Off(60));
        router.close_serial();
        assert_eq!(port.bytes(), vec![0x7F, 60, 0x7E, 60]);
        assert_eq!(router.pattern(), "");
    }

    #[test]
    fn test_midi_records_note_on_only() {
        let (router, port) = router(OutputMode::MidiFile);
        router.dispatch(NoteEvent::On(60));
        router.set_recording(true);
        router.dispatch_all(&[NoteEvent::On(62), NoteEvent::Off(62), NoteEvent::On(64)]);
        router.send_window_config(&[60; 8]);
        router.close_serial();
        assert_eq!(router.pattern(), "D5 E5");
        assert!(port.bytes().is_empty());
    }

    #[test]
    fn test_both_sinks() {
        let (router, port) = router(OutputMode::Both);
        assert!(router.toggle_recording());
        router.send_window_config(&[60, 62, 64, 65, 67, 69, 71, 72]);
        router.dispatch(NoteEvent::On(72));
        router.close_serial();
        assert_eq!(port.bytes().len(), 11);
        assert_eq!(router.pattern(), "C6");
        assert!(!router.serial_open());
    }

    #[test]
    fn test_cancelled_run_is_dropped() {
        let (router, port) = router(OutputMode::SerialOnly);
        let (mut handle, token) = cancel_pair();
        assert!(router.dispatch_unless_cancelled(NoteEvent::On(60), &token));
        handle.cancel();
        assert!(!router.dispatch_unless_cancelled(NoteEvent::On(64), &token));
        router.silence_cancelled(&handle);
        router.silence_cancelled(&handle);
        router.close_serial();
        assert_eq!(port.bytes(), vec![0x7F, 60, 0x7E, 60]);
    }

    #[test]
    fn test_finished_note_not_silenced_again() {
        let (router, port) = router(OutputMode::SerialOnly);
        let (mut handle, token) = cancel_pair();
        router.dispatch_unless_cancelled(NoteEvent::On(60), &token);
        router.dispatch_unless_cancelled(NoteEvent::Off(60), &token);
        handle.cancel();
        router.silence_cancelled(&handle);
        router.close_serial();
        assert_eq!(port.bytes(), vec![0x7F, 60, 0x7E, 60]);
    }

    #[test]
    fn test_rhythm_needs_recording() {
        let (router, _port) = router(OutputMode::MidiFile);
        assert!(!router.append_rhythm(Rhythm::metronome()));
        router.set_recording(true);
        assert!(router.append_rhythm(Rhythm::metronome()));
        assert_eq!(router.pattern(), "[s.x.x.x.]x15");
    }
}
