use std::collections::VecDeque;
use std::sync::Arc;

use rayon::prelude::*;

use crate::decode::codec::{RawPicture, VideoCodec};
use crate::decode::convert::{ColorConverter, SoftwareScaler};
use crate::decode::factory::FrameFactory;
use crate::decode::packet::Packet;
use crate::diag::events::{EventSink, MonitorEvent, NullEventSink};
use crate::foundation::config::DecoderOpts;
use crate::foundation::core::FieldMode;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::buffer::PixelBuffer;
use crate::frame::layer::FrameLayer;
use crate::frame::pixel_format::{PixelFormat, PixelFormatDesc, SourcePixelFormat};

/// Lifecycle of a [`VideoDecoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecoderState {
    /// Nothing decoded since construction, `clear` or a restart after draining.
    #[default]
    Idle,
    /// Data packets are being decoded.
    Decoding,
    /// The sentinel is queued and delayed pictures are being drained.
    Flushing,
    /// The sentinel was consumed and the codec flushed.
    Drained,
}

/// One decoded picture ready for the mixer.
#[derive(Clone, Debug)]
pub struct DecodedVideoFrame {
    /// Pixels laid out as the decoder's [`PixelFormatDesc`].
    pub pixels: PixelBuffer,
    /// Frame number taken from the packet timestamp.
    pub frame_number: u32,
    /// The picture is progressive.
    pub progressive: bool,
    /// Field order of the picture.
    pub field_mode: FieldMode,
    /// Codec long name.
    pub codec_name: String,
    /// Coded width.
    pub width: u32,
    /// Coded height.
    pub height: u32,
    /// Image offset to apply when mixing, as fractions of the output size.
    pub translation: [f64; 2],
}

impl DecodedVideoFrame {
    /// Wrap the picture as a mixer layer, carrying its translation.
    pub fn into_layer(self) -> FrameLayer {
        let [x, y] = self.translation;
        FrameLayer::new(self.pixels).with_translation(x, y)
    }
}

/// Result of one [`VideoDecoder::poll`].
#[derive(Clone, Debug)]
pub enum DecodeOutput {
    /// A decoded picture.
    Frame(DecodedVideoFrame),
    /// A packet was consumed by a stream without codec.
    Empty,
    /// End of stream reached; every delayed picture has been returned.
    Flush,
}

impl DecodeOutput {
    /// Return `true` for [`DecodeOutput::Flush`].
    pub fn is_flush(&self) -> bool {
        matches!(self, DecodeOutput::Flush)
    }

    /// The decoded picture, if any.
    pub fn into_frame(self) -> Option<DecodedVideoFrame> {
        match self {
            DecodeOutput::Frame(f) => Some(f),
            _ => None,
        }
    }
}

/// Constructor for the software conversion path.
pub type ConverterFactory =
    dyn FnOnce(SourcePixelFormat, u32, u32) -> PlayoutResult<Box<dyn ColorConverter>>;

fn software_converter(
    src: SourcePixelFormat,
    width: u32,
    height: u32,
) -> PlayoutResult<Box<dyn ColorConverter>> {
    Ok(Box::new(SoftwareScaler::new(src, width, height)?))
}

fn clamp_frame(pts: i64) -> u32 {
    pts.clamp(0, i64::from(u32::MAX)) as u32
}

/// Packet queue, flush protocol and plane copy for one video stream.
///
/// Not internally synchronised: drive `push` and `poll` from one thread.
pub struct VideoDecoder {
    stream_index: usize,
    codec: Option<Box<dyn VideoCodec>>,
    factory: Option<Arc<dyn FrameFactory>>,
    converter: Option<Box<dyn ColorConverter>>,
    events: Arc<dyn EventSink>,
    packets: VecDeque<Packet>,
    desc: PixelFormatDesc,
    state: DecoderState,
    codec_name: String,
    width: u32,
    height: u32,
    declared_frames: u32,
    frame_number: u32,
    is_progressive: bool,
    parallel_copy: bool,
    translation: [f64; 2],
}

impl VideoDecoder {
    /// Open a decoder for `stream_index`, converting in software with [`SoftwareScaler`] when
    /// the codec's format cannot be composited directly.
    pub fn open(
        codec: Box<dyn VideoCodec>,
        stream_index: usize,
        factory: Arc<dyn FrameFactory>,
        opts: &DecoderOpts,
    ) -> PlayoutResult<Self> {
        Self::open_with_converter(
            codec,
            stream_index,
            factory,
            opts,
            Box::new(software_converter),
        )
    }

    /// Like [`VideoDecoder::open`], building the conversion path with `make_converter`.
    pub fn open_with_converter(
        codec: Box<dyn VideoCodec>,
        stream_index: usize,
        factory: Arc<dyn FrameFactory>,
        opts: &DecoderOpts,
        make_converter: Box<ConverterFactory>,
    ) -> PlayoutResult<Self> {
        let (width, height) = (codec.width(), codec.height());
        if width == 0 || height == 0 {
            return Err(PlayoutError::configuration(format!(
                "invalid video size {width}x{height} from codec '{}'",
                codec.name()
            )));
        }
        let native = codec.pixel_format();

        let codec_interval = codec.frame_interval();
        let channel_interval = factory.video_format_desc().frame_interval_secs();
        let drift = (codec_interval - channel_interval).abs();
        if drift.is_nan() || drift > opts.frame_interval_tolerance {
            return Err(PlayoutError::configuration(format!(
                "invalid video frame rate: codec frame interval {codec_interval:.6}s, \
                 channel {channel_interval:.6}s"
            )));
        }

        let mut desc = PixelFormatDesc::for_source(native, width, height);
        let mut converter = None;
        if desc.format == PixelFormat::Invalid {
            tracing::warn!(
                codec = codec.name(),
                format = ?native,
                "accelerated colour transform not supported; converting to BGRA in software"
            );
            desc = PixelFormatDesc::bgra(width, height);
            converter = Some(make_converter(native, width, height).map_err(|e| {
                PlayoutError::configuration(format!(
                    "could not create software scaling context: {e}"
                ))
            })?);
        }

        // DV pictures are shifted down one line to land on the upper field.
        let translation = if codec.is_dv()
            && factory.video_format_desc().field_mode == FieldMode::Upper
        {
            [0.0, 1.0 / f64::from(height)]
        } else {
            [0.0, 0.0]
        };

        Ok(Self {
            stream_index,
            codec_name: codec.name().to_string(),
            declared_frames: codec.declared_frames(),
            codec: Some(codec),
            factory: Some(factory),
            converter,
            events: Arc::new(NullEventSink),
            packets: VecDeque::new(),
            desc,
            state: DecoderState::Idle,
            width,
            height,
            frame_number: 0,
            is_progressive: true,
            parallel_copy: opts.parallel_copy,
            translation,
        })
    }

    /// Pass-through decoder for a stream without video codec.
    pub fn null(stream_index: usize) -> Self {
        Self {
            stream_index,
            codec: None,
            factory: None,
            converter: None,
            events: Arc::new(NullEventSink),
            packets: VecDeque::new(),
            desc: PixelFormatDesc {
                format: PixelFormat::Invalid,
                planes: Default::default(),
            },
            state: DecoderState::Idle,
            codec_name: String::new(),
            width: 0,
            height: 0,
            declared_frames: 0,
            frame_number: 0,
            is_progressive: true,
            parallel_copy: false,
            translation: [0.0, 0.0],
        }
    }

    /// Send monitoring events to `sink`.
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Queue `packet` if it belongs to this stream or is the sentinel.
    pub fn push(&mut self, packet: Packet) {
        if !packet.is_end_of_stream() && packet.stream_index != self.stream_index {
            return;
        }
        if !packet.is_end_of_stream() && self.state == DecoderState::Drained {
            tracing::debug!(stream = self.stream_index, "video decoder restarting after drain");
            self.state = DecoderState::Idle;
        }
        self.packets.push_back(packet);
    }

    /// Consume the front packet.
    pub fn poll(&mut self) -> PlayoutResult<Option<DecodeOutput>> {
        let Some(front) = self.packets.front() else {
            return Ok(None);
        };
        let eos = front.is_end_of_stream();

        let Some(codec) = self.codec.as_ref() else {
            self.packets.pop_front();
            if eos {
                self.state = DecoderState::Drained;
                return Ok(Some(DecodeOutput::Flush));
            }
            return Ok(Some(DecodeOutput::Empty));
        };

        if eos {
            if codec.has_delay() {
                let sentinel = Packet::end_of_stream();
                if let Some(frame) = self.decode(&sentinel)? {
                    self.state = DecoderState::Flushing;
                    return Ok(Some(DecodeOutput::Frame(frame)));
                }
            }
            self.packets.pop_front();
            if let Some(codec) = self.codec.as_mut() {
                codec.flush_buffers();
            }
            self.state = DecoderState::Drained;
            tracing::debug!(codec = %self.codec_name, "video decoder drained");
            return Ok(Some(DecodeOutput::Flush));
        }

        let Some(packet) = self.packets.pop_front() else {
            return Ok(None);
        };
        self.state = DecoderState::Decoding;
        Ok(self.decode(&packet)?.map(DecodeOutput::Frame))
    }

    /// Run the codec on `packet` and copy out the picture, if one completed.
    #[tracing::instrument(skip_all, fields(codec = %self.codec_name, pts = ?packet.pts))]
    pub fn decode(&mut self, packet: &Packet) -> PlayoutResult<Option<DecodedVideoFrame>> {
        let codec = self.codec.as_mut().ok_or_else(|| {
            PlayoutError::invalid_operation("decode called on a decoder without codec")
        })?;
        let picture = match codec.decode(packet) {
            Ok(Some(p)) => p,
            Ok(None) => return Ok(None),
            Err(e) => return Err(PlayoutError::decode_failed(self.codec_name.clone(), e.0)),
        };

        self.is_progressive = !picture.interlaced;
        if picture.repeat_pict > 0 {
            tracing::warn!(repeat_pict = picture.repeat_pict, "field repeat_pict not implemented");
        }

        let field = picture.field_mode();
        self.events.emit(MonitorEvent::new("file/video/width", self.width));
        self.events.emit(MonitorEvent::new("file/video/height", self.height));
        self.events.emit(MonitorEvent::new("file/video/field", field.as_str()));
        self.events
            .emit(MonitorEvent::new("file/video/codec", self.codec_name.as_str()));

        // Drained pictures arrive on the sentinel, which has no pts.
        match (packet.pts, picture.pts) {
            (Some(pts), _) => self.frame_number = clamp_frame(pts),
            (None, Some(pts)) => self.frame_number = self.frame_number.max(clamp_frame(pts)),
            (None, None) => {}
        }

        let pixels = self.make_frame(&picture)?;
        Ok(Some(DecodedVideoFrame {
            pixels,
            frame_number: self.frame_number,
            progressive: self.is_progressive,
            field_mode: field,
            codec_name: self.codec_name.clone(),
            width: self.width,
            height: self.height,
            translation: self.translation,
        }))
    }

    fn make_frame(&mut self, picture: &RawPicture) -> PlayoutResult<PixelBuffer> {
        let factory = self.factory.as_ref().ok_or_else(|| {
            PlayoutError::invalid_operation("decoder has no frame factory")
        })?;
        let mut out = factory.create_frame(&self.desc);

        if let Some(converter) = self.converter.as_mut() {
            converter.convert(picture, &mut out)?;
            return Ok(out);
        }

        if PixelFormatDesc::for_source(picture.format, picture.width, picture.height) != self.desc {
            return Err(PlayoutError::validation(format!(
                "{:?} {}x{} picture does not match the stream layout",
                picture.format, picture.width, picture.height
            )));
        }
        picture.check_layout()?;
        let parallel = self.parallel_copy;
        for (n, plane) in self.desc.planes.iter().enumerate() {
            let (src, src_linesize) = picture.plane(n)?;
            let dst = out.plane_mut(n)?;
            let row = plane.linesize;
            let copy_row = |(y, dst_row): (usize, &mut [u8])| {
                let start = y * src_linesize;
                dst_row.copy_from_slice(&src[start..start + row]);
            };
            if parallel {
                dst.par_chunks_mut(row).enumerate().for_each(copy_row);
            } else {
                dst.chunks_mut(row).enumerate().for_each(copy_row);
            }
        }
        Ok(out)
    }

    /// Return `true` while packets are queued.
    pub fn ready(&self) -> bool {
        !self.packets.is_empty()
    }

    /// Drop every queued packet without decoding.
    pub fn clear(&mut self) {
        self.packets.clear();
        self.state = DecoderState::Idle;
    }

    /// Greater of the declared frame count and the highest frame number seen.
    pub fn nb_frames(&self) -> u32 {
        self.declared_frames.max(self.frame_number)
    }

    /// Frame number of the most recent picture.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    /// Interlacing of the most recent picture.
    pub fn is_progressive(&self) -> bool {
        self.is_progressive
    }

    /// Coded width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Coded height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Layout of the frames this decoder produces.
    pub fn pixel_format_desc(&self) -> &PixelFormatDesc {
        &self.desc
    }

    /// Human readable identity.
    pub fn print(&self) -> String {
        format!("[video-decoder] {}", self.codec_name)
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("stream_index", &self.stream_index)
            .field("codec", &self.codec_name)
            .field("state", &self.state)
            .field("queued", &self.packets.len())
            .field("frame_number", &self.frame_number)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/video.rs"]
mod tests;
