// Sequencer module - Timeline, note scheduling and transport
// Converts musical time to render time and hands voices to the backend ahead of time

pub mod metronome;
pub mod note;
pub mod note_store;
pub mod playhead;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use metronome::{ClickType, MetronomeScheduler};
pub use note::{InstrumentRef, NoteId, ScheduledNote, TrackId};
pub use note_store::NoteStore;
pub use playhead::{PlayheadTracker, PollMode, Visibility};
pub use scheduler::{NoteScheduler, PassReport};
pub use timeline::{MusicalTime, Tempo, TimeModel, TimeSignature};
pub use transport::{TransportError, TransportSession, TransportState, TransportStatus};
