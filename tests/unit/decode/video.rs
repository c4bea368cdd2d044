use super::*;
use crate::decode::codec::CodecError;
use crate::decode::factory::ChannelFrameFactory;
use crate::decode::testsrc::{INVALID_DATA, TestPatternCodec};
use crate::diag::events::{EventValue, MemoryEventSink};
use crate::foundation::core::{Fps, VideoFormatDesc};

fn fps() -> Fps {
    Fps::new(25, 1).unwrap()
}

fn factory() -> Arc<dyn FrameFactory> {
    Arc::new(ChannelFrameFactory::new(VideoFormatDesc::new(
        16,
        8,
        fps(),
        FieldMode::Progressive,
    )))
}

fn open(codec: TestPatternCodec) -> VideoDecoder {
    VideoDecoder::open(Box::new(codec), 1, factory(), &DecoderOpts::default()).unwrap()
}

fn data(pts: i64) -> Packet {
    Packet::new(1, Some(pts), vec![0u8; 4])
}

fn frame(out: Option<DecodeOutput>) -> DecodedVideoFrame {
    match out {
        Some(DecodeOutput::Frame(f)) => f,
        other => panic!("expected a frame, got {other:?}"),
    }
}

#[test]
fn push_filters_foreign_streams_but_keeps_sentinel() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()));
    dec.push(Packet::new(0, Some(1), vec![1u8]));
    assert!(!dec.ready());
    dec.push(Packet::end_of_stream());
    assert!(dec.ready());
    dec.push(data(1));
    assert!(dec.ready());
}

#[test]
fn frame_numbers_follow_packet_pts() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()).with_declared_frames(3));
    for pts in [0, 1, 5, 9] {
        dec.push(data(pts));
    }
    let mut seen = Vec::new();
    while let Some(out) = dec.poll().unwrap() {
        seen.push(frame(Some(out)).frame_number);
    }
    assert_eq!(seen, vec![0, 1, 5, 9]);
    assert_eq!(dec.frame_number(), 9);
    assert_eq!(dec.nb_frames(), 9);
    assert_eq!(dec.state(), DecoderState::Decoding);
}

#[test]
fn nb_frames_prefers_declared_count_when_larger() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()).with_declared_frames(250));
    dec.push(data(4));
    dec.poll().unwrap();
    assert_eq!(dec.nb_frames(), 250);
}

#[test]
fn sentinel_without_delay_flushes_immediately() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()));
    dec.push(data(0));
    dec.push(Packet::end_of_stream());
    frame(dec.poll().unwrap());
    assert!(dec.ready());
    assert!(dec.poll().unwrap().is_some_and(|o| o.is_flush()));
    assert!(!dec.ready());
    assert_eq!(dec.state(), DecoderState::Drained);
    assert!(dec.poll().unwrap().is_none());
}

#[test]
fn delayed_pictures_are_drained_before_flush() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()).with_delay(2));
    for pts in 0..4 {
        dec.push(data(pts));
    }
    dec.push(Packet::end_of_stream());

    assert!(dec.poll().unwrap().is_none());
    assert!(dec.poll().unwrap().is_none());
    assert_eq!(frame(dec.poll().unwrap()).frame_number, 2);
    assert_eq!(frame(dec.poll().unwrap()).frame_number, 3);

    frame(dec.poll().unwrap());
    assert_eq!(dec.state(), DecoderState::Flushing);
    assert!(dec.ready());
    frame(dec.poll().unwrap());
    assert!(dec.ready());
    assert_eq!(dec.frame_number(), 3);

    assert!(dec.poll().unwrap().is_some_and(|o| o.is_flush()));
    assert!(!dec.ready());
    assert_eq!(dec.state(), DecoderState::Drained);
}

#[test]
fn data_after_drain_restarts_the_stream() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()));
    dec.push(Packet::end_of_stream());
    dec.poll().unwrap();
    assert_eq!(dec.state(), DecoderState::Drained);
    dec.push(data(0));
    assert_eq!(dec.state(), DecoderState::Idle);
    assert_eq!(frame(dec.poll().unwrap()).frame_number, 0);
}

#[test]
fn codec_failure_is_decode_failed_and_recoverable() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()).with_name("H.264 / AVC").fail_at(1));
    dec.push(data(0));
    dec.push(data(1));
    dec.push(data(2));
    frame(dec.poll().unwrap());
    match dec.poll() {
        Err(PlayoutError::DecodeFailed { codec, code }) => {
            assert_eq!(codec, "H.264 / AVC");
            assert_eq!(code, INVALID_DATA);
        }
        other => panic!("expected DecodeFailed, got {other:?}"),
    }
    assert_eq!(frame(dec.poll().unwrap()).frame_number, 2);
}

#[test]
fn null_decoder_passes_markers_through() {
    let mut dec = VideoDecoder::null(3);
    dec.push(Packet::new(3, Some(0), vec![1u8]));
    dec.push(Packet::new(2, Some(0), vec![1u8]));
    dec.push(Packet::end_of_stream());
    assert!(matches!(dec.poll().unwrap(), Some(DecodeOutput::Empty)));
    assert!(dec.poll().unwrap().is_some_and(|o| o.is_flush()));
    assert!(dec.poll().unwrap().is_none());
    assert!(dec.decode(&data(0)).is_err());
}

#[test]
fn frame_rate_mismatch_is_a_configuration_error() {
    let codec = TestPatternCodec::new(16, 8, Fps::new(30, 1).unwrap());
    let err = VideoDecoder::open(Box::new(codec), 1, factory(), &DecoderOpts::default())
        .unwrap_err();
    assert!(matches!(err, PlayoutError::Configuration(_)));

    let loose = DecoderOpts {
        frame_interval_tolerance: 0.01,
        ..DecoderOpts::default()
    };
    let codec = TestPatternCodec::new(16, 8, Fps::new(30, 1).unwrap());
    assert!(VideoDecoder::open(Box::new(codec), 1, factory(), &loose).is_ok());
}

#[test]
fn planar_yuv_is_copied_without_conversion() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()));
    assert_eq!(dec.pixel_format_desc().format, PixelFormat::Ycbcr);
    assert_eq!(dec.pixel_format_desc().planes.len(), 3);
    dec.push(data(0));
    let f = frame(dec.poll().unwrap());
    let luma = f.pixels.plane(0).unwrap();
    assert_eq!(luma[0], 16);
    assert_eq!(luma[15], 235);
    assert!(f.pixels.plane(1).unwrap().iter().all(|&b| b == 128));
}

#[test]
fn unsupported_format_falls_back_to_bgra() {
    let codec = TestPatternCodec::new(16, 8, fps()).with_format(SourcePixelFormat::Nv12);
    let mut dec = open(codec);
    assert_eq!(dec.pixel_format_desc(), &PixelFormatDesc::bgra(16, 8));
    dec.push(data(0));
    let f = frame(dec.poll().unwrap());
    let p = f.pixels.plane(0).unwrap();
    assert_eq!(&p[0..4], &[0, 0, 0, 255]);
    assert_eq!(&p[15 * 4..16 * 4], &[255, 255, 255, 255]);
}

#[test]
fn zero_sized_codec_is_rejected_at_open() {
    for (w, h) in [(0, 0), (16, 0), (0, 8)] {
        let codec = TestPatternCodec::new(w, h, fps()).with_format(SourcePixelFormat::Bgra);
        let err = VideoDecoder::open(Box::new(codec), 1, factory(), &DecoderOpts::default())
            .unwrap_err();
        assert!(matches!(err, PlayoutError::Configuration(_)), "{w}x{h}");
    }
    let converted = TestPatternCodec::new(0, 0, fps()).with_format(SourcePixelFormat::Nv12);
    assert!(VideoDecoder::open(Box::new(converted), 1, factory(), &DecoderOpts::default()).is_err());
}

#[test]
fn dv_on_upper_field_channel_is_shifted_one_line() {
    let upper: Arc<dyn FrameFactory> = Arc::new(ChannelFrameFactory::new(VideoFormatDesc::new(
        16,
        8,
        fps(),
        FieldMode::Upper,
    )));
    let opts = DecoderOpts::default();
    let open_on = |codec: TestPatternCodec, factory: Arc<dyn FrameFactory>| {
        let mut dec = VideoDecoder::open(Box::new(codec), 1, factory, &opts).unwrap();
        dec.push(data(0));
        frame(dec.poll().unwrap()).translation
    };

    let dv = TestPatternCodec::new(16, 8, fps()).as_dv();
    assert_eq!(open_on(dv, upper.clone()), [0.0, 0.125]);
    let dv = TestPatternCodec::new(16, 8, fps()).as_dv();
    assert_eq!(open_on(dv, factory()), [0.0, 0.0]);
    assert_eq!(open_on(TestPatternCodec::new(16, 8, fps()), upper), [0.0, 0.0]);
}

#[test]
fn converter_construction_failure_is_a_configuration_error() {
    let codec = TestPatternCodec::new(16, 8, fps()).with_format(SourcePixelFormat::Gray8);
    let err = VideoDecoder::open_with_converter(
        Box::new(codec),
        1,
        factory(),
        &DecoderOpts::default(),
        Box::new(
            |_: SourcePixelFormat, _: u32, _: u32| -> PlayoutResult<Box<dyn ColorConverter>> {
                Err(PlayoutError::validation("no scaler available"))
            },
        ),
    )
    .unwrap_err();
    assert!(matches!(err, PlayoutError::Configuration(_)));
}

#[test]
fn monitor_events_describe_the_stream() {
    let sink = Arc::new(MemoryEventSink::new());
    let codec = TestPatternCodec::new(16, 8, fps())
        .with_name("DV (Digital Video)")
        .interlaced(false)
        .with_repeat_pict(1);
    let mut dec = open(codec).with_events(sink.clone());
    dec.push(data(7));
    let f = frame(dec.poll().unwrap());

    assert!(!f.progressive);
    assert!(!dec.is_progressive());
    assert_eq!(f.field_mode, FieldMode::Lower);
    assert_eq!(sink.last("file/video/width"), Some(EventValue::Int(16)));
    assert_eq!(sink.last("file/video/height"), Some(EventValue::Int(8)));
    assert_eq!(
        sink.last("file/video/field"),
        Some(EventValue::Str("lower".to_string()))
    );
    assert_eq!(
        sink.last("file/video/codec"),
        Some(EventValue::Str("DV (Digital Video)".to_string()))
    );
    assert_eq!(dec.print(), "[video-decoder] DV (Digital Video)");
}

#[test]
fn clear_discards_queue_and_resets_state() {
    let mut dec = open(TestPatternCodec::new(16, 8, fps()));
    dec.push(data(0));
    dec.push(data(1));
    frame(dec.poll().unwrap());
    dec.clear();
    assert!(!dec.ready());
    assert_eq!(dec.state(), DecoderState::Idle);
    assert!(dec.poll().unwrap().is_none());
}

/// Emits 4x2 YUV 4:2:0 pictures with padded rows.
struct PaddedCodec;

impl VideoCodec for PaddedCodec {
    fn name(&self) -> &str {
        "padded"
    }
    fn width(&self) -> u32 {
        4
    }
    fn height(&self) -> u32 {
        2
    }
    fn pixel_format(&self) -> SourcePixelFormat {
        SourcePixelFormat::Yuv420p
    }
    fn frame_interval(&self) -> f64 {
        0.04
    }
    fn decode(&mut self, packet: &Packet) -> Result<Option<RawPicture>, CodecError> {
        let mut pic = RawPicture::blank(SourcePixelFormat::Yuv420p, 4, 2);
        pic.linesizes = vec![8, 8, 8];
        pic.planes = vec![
            vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8],
            vec![9, 10, 0, 0],
            vec![11, 12, 0, 0],
        ];
        pic.pts = packet.pts;
        Ok(Some(pic))
    }
    fn flush_buffers(&mut self) {}
}

#[test]
fn padded_rows_are_copied_tightly_serial_and_parallel() {
    for parallel_copy in [false, true] {
        let opts = DecoderOpts {
            parallel_copy,
            ..DecoderOpts::default()
        };
        let mut dec = VideoDecoder::open(Box::new(PaddedCodec), 1, factory(), &opts).unwrap();
        let f = dec.decode(&data(0)).unwrap().unwrap();
        assert_eq!(f.pixels.plane(0).unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(f.pixels.plane(1).unwrap(), &[9, 10]);
        assert_eq!(f.pixels.plane(2).unwrap(), &[11, 12]);
    }
}
