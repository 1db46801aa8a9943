//! Cancellation handles for background runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use scalekeys_core::NoteEvent;

/// Held by the control thread. Cancelling never waits for the run.
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    sounding: Arc<Mutex<Option<u8>>>,
    wake: Option<Sender<()>>,
}

/// Held by the run. Sleeps wake early once the handle is cancelled.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    /// Pitch the run has switched on and not yet off.
    sounding: Arc<Mutex<Option<u8>>>,
    wake: Receiver<()>,
}

pub fn cancel_pair() -> (TaskHandle, CancelToken) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let sounding = Arc::new(Mutex::new(None));
    let (tx, rx) = bounded(0);
    (
        TaskHandle { cancelled: cancelled.clone(), sounding: sounding.clone(), wake: Some(tx) },
        CancelToken { cancelled, sounding, wake: rx },
    )
}

impl TaskHandle {
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // disconnecting wakes any recv_timeout in progress
        self.wake.take();
    }

    /// Takes the pitch the run left sounding, if any.
    pub fn take_sounding(&self) -> Option<u8> {
        self.sounding.lock().ok().and_then(|mut s| s.take())
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Records a delivered event so the handle can silence a note cut short.
    pub fn track(&self, event: NoteEvent) {
        if let Ok(mut sounding) = self.sounding.lock() {
            *sounding = match event {
                NoteEvent::On(code) => Some(code),
                NoteEvent::Off(code) if *sounding == Some(code) => None,
                NoteEvent::Off(_) => *sounding,
            };
        }
    }

    /// Sleeps for `duration`; returns false if cancelled meanwhile.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.wake.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => !self.is_cancelled(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}
