//! Control-thread facade: window navigation, key events and effect selection

use std::sync::Arc;

use scalekeys_core::{
    slot_for_key, ActiveEffect, EffectChain, KeyboardWindow, NoteEvent, ScaleCatalog, ScaleKeysError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::effect_store::{EffectStore, EffectStoreError};
use crate::router::OutputRouter;
use crate::scheduler::{MetronomeBeat, Scheduler, SchedulerTiming};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] ScaleKeysError),
    #[error(transparent)]
    Store(#[from] EffectStoreError),
}

pub struct Session {
    catalog: ScaleCatalog,
    window: KeyboardWindow,
    chain: EffectChain,
    router: Arc<OutputRouter>,
    scheduler: Scheduler,
    store: EffectStore,
    shut_down: bool,
}

impl Session {
    pub fn new(catalog: ScaleCatalog, router: Arc<OutputRouter>, timing: SchedulerTiming, store: EffectStore) -> Self {
        Self {
            catalog,
            window: KeyboardWindow::new(),
            chain: EffectChain::new(),
            scheduler: Scheduler::new(router.clone(), timing),
            router,
            store,
            shut_down: false,
        }
    }

    pub fn catalog(&self) -> &ScaleCatalog {
        &self.catalog
    }

    pub fn window(&self) -> &KeyboardWindow {
        &self.window
    }

    pub fn active_effect(&self) -> ActiveEffect {
        self.chain.active()
    }

    pub fn router(&self) -> &Arc<OutputRouter> {
        &self.router
    }

    pub fn beats(&self) -> crossbeam_channel::Receiver<MetronomeBeat> {
        self.scheduler.beats()
    }

    fn window_changed(&self) {
        self.router.send_window_config(&self.window.config_codes());
    }

    // ========================================================================
    // Window
    // ========================================================================

    /// Returns false when root or mode is unset. Notes held under the old
    /// scale are released and any arpeggio run is cancelled.
    pub fn select_scale(&mut self, root: &str, mode: &str) -> Result<bool, SessionError> {
        let previous = pitch_table(&self.window).to_vec();
        let selected = self.window.select_scale(&self.catalog, root, mode)?;
        if selected {
            self.scheduler.cancel_arpeggio();
            let released = self.chain.release_all(&previous);
            self.router.dispatch_all(&released);
            info!(root, mode, start_octave = self.window.start_octave(), "Scale selected");
            self.window_changed();
        }
        Ok(selected)
    }

    pub fn shift_right(&mut self) -> bool {
        let moved = self.window.shift_right();
        if moved {
            self.window_changed();
        }
        moved
    }

    pub fn shift_left(&mut self) -> bool {
        let moved = self.window.shift_left();
        if moved {
            self.window_changed();
        }
        moved
    }

    pub fn change_octave(&mut self, delta: i8) -> bool {
        let moved = self.window.change_octave(delta);
        if moved {
            debug!(delta, start_octave = self.window.start_octave(), "Octave changed");
            self.window_changed();
        }
        moved
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Runs a key press through the active effect and out to the sinks.
    /// A key that cannot be resolved to a pitch produces no events.
    pub fn key_down(&mut self, slot: usize) -> Vec<NoteEvent> {
        let (Some(key), Some(scale)) = (self.window.key(slot), self.window.scale()) else {
            return Vec::new();
        };
        let output = match self.chain.on_key_down(slot, &key.name, key.octave, scale) {
            Ok(output) => output,
            Err(e) => {
                warn!(slot, error = %e, "Key ignored");
                return Vec::new();
            }
        };
        self.router.dispatch_all(&output.events);
        if let Some(request) = output.arpeggio {
            self.scheduler.start_arpeggio(request);
        }
        output.events
    }

    pub fn key_up(&mut self, slot: usize) -> Vec<NoteEvent> {
        let Some(scale) = self.window.scale() else {
            return Vec::new();
        };
        let output = self.chain.on_key_up(slot, scale);
        self.router.dispatch_all(&output.events);
        output.events
    }

    /// Key press by hardware key character.
    pub fn key_down_char(&mut self, key: char) -> Vec<NoteEvent> {
        slot_for_key(key).map(|slot| self.key_down(slot)).unwrap_or_default()
    }

    pub fn key_up_char(&mut self, key: char) -> Vec<NoteEvent> {
        slot_for_key(key).map(|slot| self.key_up(slot)).unwrap_or_default()
    }

    // ========================================================================
    // Effects
    // ========================================================================

    /// Swaps the active effect. Any arpeggio run is cancelled first and
    /// sounding notes are released.
    pub fn set_effect(&mut self, effect: ActiveEffect) {
        self.scheduler.cancel_arpeggio();
        let released = self.chain.set_effect(effect, pitch_table(&self.window));
        self.router.dispatch_all(&released);
        info!(%effect, "Effect set");
    }

    /// Removes the active effect and saves it for a later reload.
    pub fn remove_effect(&mut self) -> Result<Option<ActiveEffect>, SessionError> {
        let removed = self.chain.active();
        if removed == ActiveEffect::None {
            return Ok(None);
        }
        self.set_effect(ActiveEffect::None);
        self.store.save(removed)?;
        Ok(Some(removed))
    }

    /// Recreates the last removed effect. A missing file leaves the current
    /// effect in place.
    pub fn load_effect(&mut self) -> Result<ActiveEffect, SessionError> {
        let effect = self.store.load()?;
        self.set_effect(effect);
        Ok(effect)
    }

    // ========================================================================
    // Recording and metronome
    // ========================================================================

    pub fn toggle_recording(&self) -> bool {
        self.router.toggle_recording()
    }

    pub fn toggle_metronome(&mut self) -> bool {
        self.scheduler.toggle_metronome()
    }

    pub fn pattern(&self) -> String {
        self.router.pattern()
    }

    /// Stops background runs, releases held notes and closes the serial link.
    /// Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.scheduler.shutdown();
        let released = self.chain.release_all(pitch_table(&self.window));
        self.router.dispatch_all(&released);
        self.router.close_serial();
        info!("Session shut down");
    }
}

fn pitch_table(window: &KeyboardWindow) -> &[u8] {
    window.scale().map(|s| s.pitch_table()).unwrap_or(&[])
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
