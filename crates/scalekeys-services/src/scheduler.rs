//! Background runs: arpeggio playback and the metronome

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use scalekeys_core::{ArpOrder, ArpeggioRequest, NoteEvent};
use tracing::{debug, info};

use crate::pattern::Rhythm;
use crate::router::OutputRouter;
use crate::task::{cancel_pair, CancelToken, TaskHandle};

/// Beats per metronome bar.
pub const METRONOME_BEATS: u8 = 4;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerTiming {
    pub arp_step: Duration,
    pub arp_random_step: Duration,
    pub metronome_tick: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            arp_step: Duration::from_millis(150),
            arp_random_step: Duration::from_millis(500),
            metronome_tick: Duration::from_millis(500),
        }
    }
}

impl SchedulerTiming {
    pub fn arp_step_for(&self, order: ArpOrder) -> Duration {
        match order {
            ArpOrder::Random => self.arp_random_step,
            _ => self.arp_step,
        }
    }
}

/// One metronome blink for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeBeat {
    pub index: u8,
    /// First beat of the bar.
    pub accent: bool,
    /// Bars alternate colour schemes.
    pub bar: u64,
}

pub struct Scheduler {
    router: Arc<OutputRouter>,
    timing: SchedulerTiming,
    arpeggio: Option<TaskHandle>,
    metronome: Option<Arc<AtomicBool>>,
    beat_tx: Sender<MetronomeBeat>,
    beat_rx: Receiver<MetronomeBeat>,
}

impl Scheduler {
    pub fn new(router: Arc<OutputRouter>, timing: SchedulerTiming) -> Self {
        let (beat_tx, beat_rx) = bounded(64);
        Self {
            router,
            timing,
            arpeggio: None,
            metronome: None,
            beat_tx,
            beat_rx,
        }
    }

    // ========================================================================
    // Arpeggio
    // ========================================================================

    /// Starts playback, preempting any run in progress without waiting for it.
    pub fn start_arpeggio(&mut self, request: ArpeggioRequest) {
        self.cancel_arpeggio();

        let (handle, token) = cancel_pair();
        let router = self.router.clone();
        let step = self.timing.arp_step_for(request.order);
        info!(order = %request.order, ?step, "Arpeggio started");

        thread::spawn(move || Self::arpeggio_loop(router, token, request, step));
        self.arpeggio = Some(handle);
    }

    /// Hard-cancels the current run. A pitch it left sounding is switched
    /// off; once this returns nothing else from the run is delivered.
    pub fn cancel_arpeggio(&mut self) {
        if let Some(mut handle) = self.arpeggio.take() {
            handle.cancel();
            self.router.silence_cancelled(&handle);
            debug!("Arpeggio cancelled");
        }
    }

    fn arpeggio_loop(router: Arc<OutputRouter>, token: CancelToken, request: ArpeggioRequest, step: Duration) {
        let mut rng = fastrand::Rng::new();
        loop {
            let snapshot = request.notes.sorted_snapshot();
            if snapshot.is_empty() {
                break;
            }
            for code in request.order.sequence(&snapshot, &mut rng) {
                for event in [NoteEvent::On(code), NoteEvent::Off(code)] {
                    if !router.dispatch_unless_cancelled(event, &token) || !token.sleep(step) {
                        return;
                    }
                }
            }
        }
        debug!("Arpeggio note set empty, run finished");
    }

    // ========================================================================
    // Metronome
    // ========================================================================

    pub fn metronome_running(&self) -> bool {
        self.metronome.is_some()
    }

    /// Beats published while the metronome runs. Beats nobody reads are dropped.
    pub fn beats(&self) -> Receiver<MetronomeBeat> {
        self.beat_rx.clone()
    }

    pub fn toggle_metronome(&mut self) -> bool {
        if self.metronome_running() {
            self.stop_metronome();
            false
        } else {
            self.start_metronome();
            true
        }
    }

    pub fn start_metronome(&mut self) {
        if self.metronome_running() {
            return;
        }
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let tx = self.beat_tx.clone();
        let tick = self.timing.metronome_tick;

        thread::spawn(move || {
            let mut bar = 0u64;
            while flag.load(Ordering::SeqCst) {
                for index in 0..METRONOME_BEATS {
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    let _ = tx.try_send(MetronomeBeat { index, accent: index == 0, bar });
                    thread::sleep(tick);
                }
                bar += 1;
            }
        });

        self.metronome = Some(running);
        info!(?tick, "Metronome started");
    }

    /// Stops the blink loop within one tick and lays the percussion fragment
    /// under a MIDI recording.
    pub fn stop_metronome(&mut self) {
        let Some(running) = self.metronome.take() else {
            return;
        };
        running.store(false, Ordering::SeqCst);
        let flushed = self.router.append_rhythm(Rhythm::metronome());
        info!(flushed, "Metronome stopped");
    }

    pub fn shutdown(&mut self) {
        self.cancel_arpeggio();
        self.stop_metronome();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
