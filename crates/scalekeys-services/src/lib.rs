//! scalekeys-services: output sinks, background runs and the session facade

pub mod effect_store;
pub mod pattern;
pub mod router;
pub mod scales;
pub mod scheduler;
pub mod serial;
pub mod session;
pub mod task;

pub use effect_store::{EffectStore, EffectStoreError};
pub use pattern::{MidiAccumulator, PatternToken, Rhythm};
pub use router::{OutputMode, OutputRouter};
pub use scales::load_scales;
pub use scheduler::{MetronomeBeat, Scheduler, SchedulerTiming, METRONOME_BEATS};
pub use serial::{SerialError, SerialLink, SerialSettings};
pub use session::{Session, SessionError};
pub use task::{cancel_pair, CancelToken, TaskHandle};
