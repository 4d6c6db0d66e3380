// Audio module - CPAL backend, render graph and render clock

pub mod automation;
pub mod backend;
pub mod buffer;
pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod graph;
pub mod parameters;
pub mod timing;
