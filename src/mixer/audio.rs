use crate::foundation::core::VideoFormatDesc;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::layer::AudioSink;

/// Sums per-layer audio into one interleaved buffer per tick.
///
/// Accumulation is an exact per-sample sum; nothing is averaged or clamped. Output is
/// sized by [`VideoFormatDesc::audio_samples_for_tick`], so shorter contributions are padded
/// with silence and longer ones are cut.
#[derive(Debug, Default)]
pub struct AudioMixer {
    accum: Vec<f32>,
    layer_open: bool,
    tick: u64,
}

impl AudioMixer {
    /// Create a mixer positioned at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the tick the next [`AudioMixer::finalize`] produces.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Open a layer scope.
    pub fn begin_layer(&mut self) -> PlayoutResult<()> {
        if self.layer_open {
            return Err(PlayoutError::invalid_operation(
                "audio mixer: begin_layer while a layer is open",
            ));
        }
        self.layer_open = true;
        Ok(())
    }

    /// Close the open layer scope.
    pub fn end_layer(&mut self) -> PlayoutResult<()> {
        if !self.layer_open {
            return Err(PlayoutError::invalid_operation(
                "audio mixer: end_layer without begin_layer",
            ));
        }
        self.layer_open = false;
        Ok(())
    }

    /// Produce this tick's buffer and reset for the next one.
    pub fn finalize(&mut self, format: &VideoFormatDesc) -> PlayoutResult<Vec<f32>> {
        if self.layer_open {
            return Err(PlayoutError::invalid_operation(
                "audio mixer: finalize with a layer still open",
            ));
        }
        let len = format.audio_samples_for_tick(self.tick) * usize::from(format.audio_channels);
        let mut out = std::mem::take(&mut self.accum);
        if out.len() > len {
            tracing::trace!(
                extra = out.len() - len,
                tick = self.tick,
                "audio mixer: truncating contributions longer than the tick"
            );
        }
        out.resize(len, 0.0);
        self.tick += 1;
        Ok(out)
    }

    /// Drop accumulated samples without advancing the tick.
    pub fn reset(&mut self) {
        self.accum.clear();
        self.layer_open = false;
    }

    /// Advance past a tick that produced no mix.
    pub(crate) fn skip_tick(&mut self) {
        self.reset();
        self.tick += 1;
    }
}

impl AudioSink for AudioMixer {
    fn push_audio(&mut self, samples: &[f32], volume: f32) -> PlayoutResult<()> {
        if !self.layer_open {
            return Err(PlayoutError::invalid_operation(
                "audio mixer: samples pushed outside a layer scope",
            ));
        }
        if samples.len() > self.accum.len() {
            self.accum.resize(samples.len(), 0.0);
        }
        if volume == 1.0 {
            for (acc, &s) in self.accum.iter_mut().zip(samples) {
                *acc += s;
            }
        } else {
            for (acc, &s) in self.accum.iter_mut().zip(samples) {
                *acc += s * volume;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/audio.rs"]
mod tests;
