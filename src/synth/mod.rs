// Synth module - Voices, fade envelopes and the voice pool

pub mod envelope;
pub mod voice;
pub mod voice_pool;
