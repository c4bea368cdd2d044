use std::sync::Arc;

use crate::accel::backend::{Accelerator, CompositeJob, CompositeLayer};
use crate::foundation::core::VideoFormatDesc;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::buffer::PixelBuffer;
use crate::frame::deferred::Deferred;
use crate::frame::layer::{ImageSink, LayerImage};
use crate::mixer::blend::BlendMode;

/// Accumulates one tick's layer images and hands them to the accelerator.
///
/// Layer scopes must strictly nest: one `begin_layer`, any number of images, one
/// `end_layer`. [`ImageMixer::finalize`] never waits for the accelerator.
pub struct ImageMixer {
    accelerator: Arc<dyn Accelerator>,
    layers: Vec<CompositeLayer>,
    open: Option<CompositeLayer>,
}

impl ImageMixer {
    /// Create a compositor submitting to `accelerator`.
    pub fn new(accelerator: Arc<dyn Accelerator>) -> Self {
        Self {
            accelerator,
            layers: Vec::new(),
            open: None,
        }
    }

    /// Open a layer scope blended with `mode`.
    pub fn begin_layer(&mut self, mode: BlendMode) -> PlayoutResult<()> {
        if self.open.is_some() {
            return Err(PlayoutError::invalid_operation(
                "image mixer: begin_layer while a layer is open",
            ));
        }
        self.open = Some(CompositeLayer {
            mode,
            images: Vec::new(),
        });
        Ok(())
    }

    /// Close the open layer scope. Layers without images are dropped.
    pub fn end_layer(&mut self) -> PlayoutResult<()> {
        let layer = self.open.take().ok_or_else(|| {
            PlayoutError::invalid_operation("image mixer: end_layer without begin_layer")
        })?;
        if !layer.images.is_empty() {
            self.layers.push(layer);
        }
        Ok(())
    }

    /// Number of closed layers holding at least one image.
    pub fn pending_layers(&self) -> usize {
        self.layers.len()
    }

    /// Submit the accumulated layers for `format` and return the deferred result.
    pub fn finalize(&mut self, format: &VideoFormatDesc) -> PlayoutResult<Deferred<PixelBuffer>> {
        if self.open.is_some() {
            return Err(PlayoutError::invalid_operation(
                "image mixer: finalize with a layer still open",
            ));
        }
        format.validate()?;
        let job = CompositeJob {
            format: format.clone(),
            layers: std::mem::take(&mut self.layers),
        };
        Ok(self.accelerator.submit(job))
    }

    /// Drop accumulated state, including an open layer.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.open = None;
    }
}

impl ImageSink for ImageMixer {
    fn push_image(&mut self, image: LayerImage) -> PlayoutResult<()> {
        let layer = self.open.as_mut().ok_or_else(|| {
            PlayoutError::invalid_operation("image mixer: image pushed outside a layer scope")
        })?;
        if image.pixels.plane_count() == 0 {
            return Err(PlayoutError::validation(
                "image mixer: layer image has no planes",
            ));
        }
        image.pixels.check_geometry()?;
        layer.images.push(image);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/image.rs"]
mod tests;
