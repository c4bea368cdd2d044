use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::accel::backend::Accelerator;
use crate::foundation::config::MixerOpts;
use crate::foundation::core::VideoFormatDesc;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::composite::{CompositeFrame, FrameTag};
use crate::frame::deferred::{Deferred, deferred};
use crate::frame::layer::LayerInput;
use crate::mixer::audio::AudioMixer;
use crate::mixer::blend::{BlendMode, BlendModeRegistry};
use crate::mixer::executor::{Executor, Priority};
use crate::mixer::image::ImageMixer;

/// Layers of one tick keyed by stacking index; lower indices are drawn first.
pub type LayerMap = BTreeMap<i32, Arc<dyn LayerInput>>;

/// Snapshot of a mixer's bookkeeping.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MixerInfo {
    /// Name of the executor thread.
    pub thread_name: String,
    /// Ticks that produced a real composite.
    pub ticks_composed: u64,
    /// Ticks that fell back to the empty frame.
    pub ticks_failed: u64,
    /// Explicit blend modes by layer index, ascending.
    pub blend_modes: Vec<(i32, BlendMode)>,
}

struct MixerState {
    thread_name: String,
    tag: FrameTag,
    audio: AudioMixer,
    image: ImageMixer,
    blend: BlendModeRegistry,
    composed: u64,
    failed: u64,
}

impl MixerState {
    fn mix(
        &mut self,
        layers: &LayerMap,
        format: &VideoFormatDesc,
    ) -> PlayoutResult<Arc<CompositeFrame>> {
        format.validate()?;
        for (&index, layer) in layers {
            let mode = self.blend.get(index);
            self.image.begin_layer(mode)?;
            self.audio.begin_layer()?;
            layer.contribute_image(&mut self.image)?;
            layer.contribute_audio(&mut self.audio)?;
            self.audio.end_layer()?;
            self.image.end_layer()?;
        }
        let image = self.image.finalize(format)?;
        let audio = self.audio.finalize(format)?;
        Ok(Arc::new(CompositeFrame::new(self.tag, image, audio, format)))
    }

    fn tick(&mut self, layers: &LayerMap, format: &VideoFormatDesc) -> Arc<CompositeFrame> {
        let tick = self.audio.tick();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.mix(layers, format)))
            .unwrap_or_else(|_| Err(PlayoutError::composition("layer code panicked")));
        match outcome {
            Ok(frame) => {
                self.composed += 1;
                frame
            }
            Err(e) => {
                tracing::error!(error = %e, tick, mixer = %self.thread_name, "mixer tick failed");
                self.failed += 1;
                self.image.reset();
                self.audio.skip_tick();
                CompositeFrame::empty_for_tick(format, tick)
            }
        }
    }

    fn info(&self) -> MixerInfo {
        MixerInfo {
            thread_name: self.thread_name.clone(),
            ticks_composed: self.composed,
            ticks_failed: self.failed,
            blend_modes: self.blend.entries(),
        }
    }
}

/// Frame mixer of one channel.
///
/// All mixer state lives on a dedicated executor thread. [`Mixer::compose`] blocks until the
/// tick is assembled but not until its pixels are rendered. Blend-mode changes are queued at
/// high priority and apply to every tick that starts after they run.
pub struct Mixer {
    executor: Executor<MixerState>,
    ticks: AtomicU64,
}

impl Mixer {
    /// Spawn the mixer thread, compositing through `accelerator`.
    pub fn new(opts: &MixerOpts, accelerator: Arc<dyn Accelerator>) -> PlayoutResult<Self> {
        let state = MixerState {
            thread_name: opts.thread_name.clone(),
            tag: FrameTag::unique(),
            audio: AudioMixer::new(),
            image: ImageMixer::new(accelerator),
            blend: BlendModeRegistry::new(),
            composed: 0,
            failed: 0,
        };
        Ok(Self {
            executor: Executor::new(opts.thread_name.clone(), state)?,
            ticks: AtomicU64::new(0),
        })
    }

    /// Compose one tick from `layers` in ascending index order.
    ///
    /// Never fails: any error is logged and replaced by [`CompositeFrame::empty`] content.
    #[tracing::instrument(skip_all, fields(layers = layers.len(), format = %format.name))]
    pub fn compose(&self, layers: LayerMap, format: &VideoFormatDesc) -> Arc<CompositeFrame> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let fmt = format.clone();
        match self
            .executor
            .invoke(Priority::Normal, move |state| state.tick(&layers, &fmt))
        {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "mixer executor unavailable");
                CompositeFrame::empty(format)
            }
        }
    }

    /// Set the blend mode of layer `index` for subsequent ticks.
    pub fn set_blend_mode(&self, index: i32, mode: BlendMode) {
        if let Err(e) = self
            .executor
            .begin_invoke(Priority::High, move |state| state.blend.set(index, mode))
        {
            tracing::warn!(error = %e, index, %mode, "set_blend_mode dropped");
        }
    }

    /// Reset every layer to [`BlendMode::Normal`].
    pub fn clear_blend_modes(&self) {
        if let Err(e) = self
            .executor
            .begin_invoke(Priority::High, |state| state.blend.clear())
        {
            tracing::warn!(error = %e, "clear_blend_modes dropped");
        }
    }

    /// Snapshot of the mixer, taken on the mixer thread after already queued work.
    pub fn info(&self) -> Deferred<MixerInfo> {
        let (promise, handle) = deferred();
        // A rejected task drops the promise, failing the handle.
        let _ = self
            .executor
            .begin_invoke(Priority::Normal, move |state| promise.set(state.info()));
        handle
    }

    /// Tasks queued on the mixer thread behind the one currently running.
    pub fn queued(&self) -> usize {
        self.executor.pending()
    }

    /// Number of `compose` calls so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/mixer.rs"]
mod tests;
