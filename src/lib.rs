//! Playout core: the per-tick frame mixer and the video decode stage of a broadcast channel.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: `Packet -> VideoDecoder -> DecodedVideoFrame` (queue, flush protocol, plane
//!    layout negotiation, frame numbering)
//! 2. **Mix**: `BTreeMap<i32, Arc<dyn LayerInput>> -> Mixer::compose -> CompositeFrame`
//!    (blend modes per layer index, exact audio sum)
//! 3. **Resolve**: the composite's pixels are rendered by an [`Accelerator`] on its own thread;
//!    `CompositeFrame::image_data` blocks until they exist, audio never blocks
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **One thread owns the mixer**: blend modes and mixer state are only touched by the
//!   mixer's executor, so the mixer holds no locks.
//! - **A tick always yields a frame**: failures inside `compose` are logged and replaced by
//!   the empty frame.
//! - **Premultiplied BGRA8** is the composite pixel format.
#![forbid(unsafe_code)]

mod accel;
mod decode;
mod diag;
mod foundation;
mod frame;
mod mixer;

pub use accel::backend::{
    Accelerator, AcceleratorKind, AcceleratorSettings, CompositeJob, CompositeLayer,
    create_accelerator,
};
pub use accel::cpu::CpuAccelerator;
pub use decode::codec::{CodecError, RawPicture, VideoCodec};
pub use decode::convert::{ColorConverter, SoftwareScaler};
pub use decode::factory::{ChannelFrameFactory, FrameFactory};
pub use decode::packet::Packet;
pub use decode::testsrc::{INVALID_DATA, TestPatternCodec};
pub use decode::video::{
    ConverterFactory, DecodeOutput, DecodedVideoFrame, DecoderState, VideoDecoder,
};
pub use diag::events::{
    EventSink, EventValue, MemoryEventSink, MonitorEvent, NullEventSink, TracingEventSink,
};
pub use foundation::config::{
    ChannelConfig, DEFAULT_FRAME_INTERVAL_TOLERANCE, DecoderOpts, MixerOpts,
};
pub use foundation::core::{
    DEFAULT_AUDIO_CHANNELS, DEFAULT_SAMPLE_RATE, FieldMode, Fps, VideoFormatDesc,
    frame_to_sample,
};
pub use foundation::error::{PlayoutError, PlayoutResult};
pub use frame::buffer::PixelBuffer;
pub use frame::composite::{CompositeFrame, FrameTag};
pub use frame::deferred::{Deferred, Promise, deferred};
pub use frame::layer::{
    AudioLayer, AudioSink, ColorLayer, FrameLayer, ImageSink, LayerImage, LayerInput,
};
pub use frame::pixel_format::{Plane, PixelFormat, PixelFormatDesc, SourcePixelFormat};
pub use mixer::audio::AudioMixer;
pub use mixer::blend::{BlendMode, BlendModeRegistry, PremulBgra8, composite_pixel, over};
pub use mixer::executor::{Executor, Priority};
pub use mixer::image::ImageMixer;
pub use mixer::mixer::{LayerMap, Mixer, MixerInfo};
