// Format conversion for cpal output streams
//
// The render graph produces mono f32. The callback writes each sample to every
// channel of the device frame, converting to the device format on the way.
// Allocation-free, safe for the render callback.

use cpal::{FromSample, Sample};

/// Write one mono sample to all channels of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}
