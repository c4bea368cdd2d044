use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Fps, VideoFormatDesc};
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::buffer::PixelBuffer;
use crate::frame::deferred::Deferred;
use crate::frame::pixel_format::PixelFormatDesc;

/// Opaque identity of the source that produced a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTag(u64);

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

impl FrameTag {
    /// Tag carried by [`CompositeFrame::empty`] frames.
    pub const EMPTY: FrameTag = FrameTag(0);

    /// Allocate a process-unique tag.
    pub fn unique() -> Self {
        Self(NEXT_TAG.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw tag value.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// The mixer's per-tick output.
///
/// Pixels are resolved asynchronously by the accelerator and read through
/// [`CompositeFrame::image_data`], which blocks until they exist. Audio and metadata are
/// available immediately. The frame is immutable; share it through `Arc`.
#[derive(Debug)]
pub struct CompositeFrame {
    image: Deferred<PixelBuffer>,
    audio: Vec<f32>,
    format: VideoFormatDesc,
    pixel_desc: PixelFormatDesc,
    tag: FrameTag,
}

impl CompositeFrame {
    pub(crate) fn new(
        tag: FrameTag,
        image: Deferred<PixelBuffer>,
        audio: Vec<f32>,
        format: &VideoFormatDesc,
    ) -> Self {
        Self {
            image,
            audio,
            pixel_desc: PixelFormatDesc::bgra(format.width, format.height),
            format: format.clone(),
            tag,
        }
    }

    /// Blank frame for `format`: transparent pixels and the first tick's worth of silence.
    pub fn empty(format: &VideoFormatDesc) -> Arc<Self> {
        Self::empty_for_tick(format, 0)
    }

    /// Blank frame whose silent audio is sized for tick `tick`.
    pub fn empty_for_tick(format: &VideoFormatDesc, tick: u64) -> Arc<Self> {
        let pixels = PixelBuffer::new(PixelFormatDesc::bgra(format.width, format.height));
        let samples = format.audio_samples_for_tick(tick) * usize::from(format.audio_channels);
        Arc::new(Self::new(
            FrameTag::EMPTY,
            Deferred::ready(pixels),
            vec![0.0; samples],
            format,
        ))
    }

    /// Return `true` for the blank fallback frame.
    pub fn is_empty(&self) -> bool {
        self.tag == FrameTag::EMPTY
    }

    /// Block until the composite pixels are resolved.
    pub fn image_data(&self) -> PlayoutResult<Arc<PixelBuffer>> {
        self.image.get()
    }

    /// Return `true` once pixel data can be read without blocking.
    pub fn is_image_ready(&self) -> bool {
        self.image.is_ready()
    }

    /// Composite frames are read-only.
    pub fn image_data_mut(&mut self) -> PlayoutResult<&mut [u8]> {
        Err(PlayoutError::invalid_operation(
            "composite frame pixels are read-only",
        ))
    }

    /// Interleaved audio for this tick.
    pub fn audio_data(&self) -> &[f32] {
        &self.audio
    }

    /// Composite frames are read-only.
    pub fn audio_data_mut(&mut self) -> PlayoutResult<&mut [f32]> {
        Err(PlayoutError::invalid_operation(
            "composite frame audio is read-only",
        ))
    }

    /// Channel format the frame was composed for.
    pub fn format_desc(&self) -> &VideoFormatDesc {
        &self.format
    }

    /// Layout of the resolved pixels (always packed BGRA).
    pub fn pixel_format_desc(&self) -> &PixelFormatDesc {
        &self.pixel_desc
    }

    /// Frame rate of the owning channel.
    pub fn frame_rate(&self) -> Fps {
        self.format.fps
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.format.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.format.height
    }

    /// Identity of the producing mixer.
    pub fn tag(&self) -> FrameTag {
        self.tag
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/composite.rs"]
mod tests;
