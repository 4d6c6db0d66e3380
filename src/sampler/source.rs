// Instrument source - Where the scheduler gets decoded buffers from

use crate::audio::buffer::AudioBuffer;
use crate::sequencer::note::InstrumentRef;
use std::sync::Arc;

/// Buffer lookup for an instrument and pitch
///
/// `None` means the note cannot be rendered; the scheduler logs it and skips
/// the note.
pub trait InstrumentSource {
    fn fetch_buffer(&self, instrument: &InstrumentRef, pitch: u8) -> Option<Arc<AudioBuffer>>;
}

impl<T: InstrumentSource + ?Sized> InstrumentSource for Arc<T> {
    fn fetch_buffer(&self, instrument: &InstrumentRef, pitch: u8) -> Option<Arc<AudioBuffer>> {
        (**self).fetch_buffer(instrument, pitch)
    }
}
