use std::sync::Arc;

use crate::foundation::core::VideoFormatDesc;
use crate::foundation::error::PlayoutResult;
use crate::frame::buffer::PixelBuffer;
use crate::frame::deferred::Deferred;
use crate::frame::layer::LayerImage;
use crate::mixer::blend::BlendMode;

/// One closed layer scope: its blend mode and the images drawn into it, in order.
#[derive(Clone, Debug)]
pub struct CompositeLayer {
    /// Operator combining this layer into the layers below.
    pub mode: BlendMode,
    /// Images of the layer, drawn in submission order.
    pub images: Vec<LayerImage>,
}

/// Everything needed to render one tick's composite.
#[derive(Clone, Debug)]
pub struct CompositeJob {
    /// Output format.
    pub format: VideoFormatDesc,
    /// Layers bottom to top.
    pub layers: Vec<CompositeLayer>,
}

/// Device that turns a [`CompositeJob`] into packed BGRA pixels.
///
/// `submit` returns immediately; the handle resolves exactly once, with pixels or an error,
/// once the device finishes. Implementations must be safe to share between mixers.
pub trait Accelerator: Send + Sync {
    /// Queue `job` and return its deferred result.
    fn submit(&self, job: CompositeJob) -> Deferred<PixelBuffer>;
}

/// Available accelerator kinds.
///
/// - `Cpu` is always available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceleratorKind {
    /// Worker-thread compositor using rayon row parallelism.
    #[default]
    Cpu,
}

/// Accelerator-agnostic settings.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AcceleratorSettings {
    /// Backend to create.
    pub kind: AcceleratorKind,
    /// Optional explicit worker thread count for row parallelism.
    pub threads: Option<usize>,
    /// Background the composite starts from (premultiplied BGRA); transparent when unset.
    pub clear_bgra: Option<[u8; 4]>,
}

/// Create an accelerator implementation.
pub fn create_accelerator(settings: &AcceleratorSettings) -> PlayoutResult<Arc<dyn Accelerator>> {
    match settings.kind {
        AcceleratorKind::Cpu => Ok(Arc::new(crate::accel::cpu::CpuAccelerator::new(
            settings.clone(),
        )?)),
    }
}
