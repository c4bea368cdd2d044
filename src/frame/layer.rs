//! Per-layer contributions to a mixer tick.
//!
//! A layer implements whichever half of [`LayerInput`] it supports; the defaults contribute
//! nothing.

use std::sync::Arc;

use crate::foundation::error::PlayoutResult;
use crate::foundation::math::mul_div255_u8;
use crate::frame::buffer::PixelBuffer;
use crate::frame::pixel_format::PixelFormatDesc;

/// One image handed to the compositor.
///
/// Packed 4-channel pixels are treated as premultiplied alpha. Planar Y'CbCr images are
/// converted by the accelerator.
#[derive(Clone, Debug)]
pub struct LayerImage {
    /// Source pixels.
    pub pixels: Arc<PixelBuffer>,
    /// Opacity multiplier in `0..=1`.
    pub opacity: f32,
    /// Offset as a fraction of the output size, `[x, y]`; positive moves right and down.
    pub translation: [f64; 2],
}

impl LayerImage {
    /// Fully opaque, untranslated image.
    pub fn new(pixels: Arc<PixelBuffer>) -> Self {
        Self {
            pixels,
            opacity: 1.0,
            translation: [0.0, 0.0],
        }
    }
}

/// Receiver of image contributions during a layer scope.
pub trait ImageSink {
    /// Add one image to the open layer.
    fn push_image(&mut self, image: LayerImage) -> PlayoutResult<()>;
}

/// Receiver of audio contributions during a layer scope.
pub trait AudioSink {
    /// Add interleaved samples to the open layer, scaled by `volume`.
    fn push_audio(&mut self, samples: &[f32], volume: f32) -> PlayoutResult<()>;
}

/// Capability interface of a drawable layer.
pub trait LayerInput: Send + Sync {
    /// Contribute pixels for this tick.
    fn contribute_image(&self, sink: &mut dyn ImageSink) -> PlayoutResult<()> {
        let _ = sink;
        Ok(())
    }

    /// Contribute audio for this tick.
    fn contribute_audio(&self, sink: &mut dyn AudioSink) -> PlayoutResult<()> {
        let _ = sink;
        Ok(())
    }
}

/// A decoded picture with optional audio, the usual producer output.
#[derive(Clone, Debug)]
pub struct FrameLayer {
    image: LayerImage,
    audio: Option<Arc<Vec<f32>>>,
    volume: f32,
}

impl FrameLayer {
    /// Wrap a pixel buffer.
    pub fn new(pixels: impl Into<Arc<PixelBuffer>>) -> Self {
        Self {
            image: LayerImage::new(pixels.into()),
            audio: None,
            volume: 1.0,
        }
    }

    /// Attach interleaved audio for the tick.
    pub fn with_audio(mut self, samples: impl Into<Arc<Vec<f32>>>) -> Self {
        self.audio = Some(samples.into());
        self
    }

    /// Set the image opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.image.opacity = opacity;
        self
    }

    /// Set the audio gain.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Offset the image by a fraction of the output size.
    pub fn with_translation(mut self, x: f64, y: f64) -> Self {
        self.image.translation = [x, y];
        self
    }
}

impl LayerInput for FrameLayer {
    fn contribute_image(&self, sink: &mut dyn ImageSink) -> PlayoutResult<()> {
        sink.push_image(self.image.clone())
    }

    fn contribute_audio(&self, sink: &mut dyn AudioSink) -> PlayoutResult<()> {
        match &self.audio {
            Some(samples) => sink.push_audio(samples, self.volume),
            None => Ok(()),
        }
    }
}

/// Solid colour fill; a 1x1 image the compositor stretches to the output size.
#[derive(Clone, Debug)]
pub struct ColorLayer {
    image: LayerImage,
}

impl ColorLayer {
    /// Build from straight-alpha B, G, R, A.
    pub fn bgra(b: u8, g: u8, r: u8, a: u8) -> Self {
        let a16 = u16::from(a);
        let px = [
            mul_div255_u8(u16::from(b), a16),
            mul_div255_u8(u16::from(g), a16),
            mul_div255_u8(u16::from(r), a16),
            a,
        ];
        let mut buf = PixelBuffer::new(PixelFormatDesc::bgra(1, 1));
        buf.planes_mut()[0].copy_from_slice(&px);
        Self {
            image: LayerImage::new(Arc::new(buf)),
        }
    }

    /// Set the fill opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.image.opacity = opacity;
        self
    }
}

impl LayerInput for ColorLayer {
    fn contribute_image(&self, sink: &mut dyn ImageSink) -> PlayoutResult<()> {
        sink.push_image(self.image.clone())
    }
}

/// Audio-only contribution.
#[derive(Clone, Debug)]
pub struct AudioLayer {
    samples: Arc<Vec<f32>>,
    volume: f32,
}

impl AudioLayer {
    /// Interleaved samples at unity gain.
    pub fn new(samples: impl Into<Arc<Vec<f32>>>) -> Self {
        Self {
            samples: samples.into(),
            volume: 1.0,
        }
    }

    /// Set the gain.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

impl LayerInput for AudioLayer {
    fn contribute_audio(&self, sink: &mut dyn AudioSink) -> PlayoutResult<()> {
        sink.push_audio(&self.samples, self.volume)
    }
}
