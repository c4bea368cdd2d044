use std::collections::VecDeque;

use crate::decode::codec::{CodecError, RawPicture, VideoCodec};
use crate::decode::packet::Packet;
use crate::foundation::core::Fps;
use crate::frame::pixel_format::SourcePixelFormat;

/// `AVERROR(EINVAL)`, reported for packets marked to fail.
pub const INVALID_DATA: i32 = -22;

const BARS: usize = 8;

/// Synthetic codec producing vertical luminance bars.
///
/// Every data packet yields one picture stamped with the packet's pts. With a delay of `n`,
/// the first `n` packets produce nothing and pictures come out `n` packets late; the
/// end-of-stream sentinel then releases them one per call.
#[derive(Debug)]
pub struct TestPatternCodec {
    name: String,
    width: u32,
    height: u32,
    format: SourcePixelFormat,
    fps: Fps,
    delay: usize,
    declared: u32,
    interlaced: Option<bool>,
    repeat_pict: u32,
    fail_at: Option<i64>,
    dv: bool,
    pending: VecDeque<RawPicture>,
    flushes: u32,
}

impl TestPatternCodec {
    /// Progressive YUV 4:2:0 bars without delay.
    pub fn new(width: u32, height: u32, fps: Fps) -> Self {
        Self {
            name: "Test pattern".to_string(),
            width,
            height,
            format: SourcePixelFormat::Yuv420p,
            fps,
            delay: 0,
            declared: 0,
            interlaced: None,
            repeat_pict: 0,
            fail_at: None,
            dv: false,
            pending: VecDeque::new(),
            flushes: 0,
        }
    }

    /// Emit pictures in `format`.
    pub fn with_format(mut self, format: SourcePixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Hold `frames` pictures back until more input or the sentinel arrives.
    pub fn with_delay(mut self, frames: usize) -> Self {
        self.delay = frames;
        self
    }

    /// Report `frames` as the container's frame count.
    pub fn with_declared_frames(mut self, frames: u32) -> Self {
        self.declared = frames;
        self
    }

    /// Mark pictures interlaced with the given field dominance.
    pub fn interlaced(mut self, top_field_first: bool) -> Self {
        self.interlaced = Some(top_field_first);
        self
    }

    /// Request field repeats on every picture.
    pub fn with_repeat_pict(mut self, repeat: u32) -> Self {
        self.repeat_pict = repeat;
        self
    }

    /// Fail the packet whose pts equals `pts`.
    pub fn fail_at(mut self, pts: i64) -> Self {
        self.fail_at = Some(pts);
        self
    }

    /// Report the stream as DV video.
    pub fn as_dv(mut self) -> Self {
        self.dv = true;
        self.name = "DV (Digital Video)".to_string();
        self
    }

    /// Override the reported codec name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of `flush_buffers` calls so far.
    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    fn picture(&self, pts: Option<i64>) -> RawPicture {
        let mut pic = RawPicture::blank(self.format, self.width, self.height);
        pic.pts = pts;
        pic.interlaced = self.interlaced.is_some();
        pic.top_field_first = self.interlaced.unwrap_or(false);
        pic.repeat_pict = self.repeat_pict;

        let w = self.width as usize;
        let bar = |x: usize| (x * BARS / w.max(1)).min(BARS - 1);
        let limited = |x: usize| (16 + bar(x) * 219 / (BARS - 1)) as u8;
        let full = |x: usize| (bar(x) * 255 / (BARS - 1)) as u8;
        let rows = self.height as usize;

        match self.format {
            SourcePixelFormat::Bgra
            | SourcePixelFormat::Rgba
            | SourcePixelFormat::Argb
            | SourcePixelFormat::Abgr => {
                let alpha = match self.format {
                    SourcePixelFormat::Argb | SourcePixelFormat::Abgr => 0,
                    _ => 3,
                };
                fill_rows(&mut pic.planes[0], w * 4, rows, |i| {
                    if i % 4 == alpha { 255 } else { full(i / 4) }
                });
            }
            SourcePixelFormat::Rgb24 | SourcePixelFormat::Bgr24 => {
                fill_rows(&mut pic.planes[0], w * 3, rows, |i| full(i / 3));
            }
            SourcePixelFormat::Gray8 => fill_rows(&mut pic.planes[0], w, rows, full),
            SourcePixelFormat::Yuyv422 => {
                let row = pic.linesizes[0];
                // Luma on even bytes, neutral chroma on odd ones.
                fill_rows(&mut pic.planes[0], row, rows, |i| {
                    if i % 2 == 0 {
                        limited((i / 4) * 2 + (i % 4) / 2)
                    } else {
                        128
                    }
                });
            }
            _ => {
                fill_rows(&mut pic.planes[0], w, rows, limited);
                for plane in pic.planes.iter_mut().skip(1).take(2) {
                    plane.fill(128);
                }
                if let Some(alpha) = pic.planes.get_mut(3) {
                    alpha.fill(255);
                }
            }
        }
        pic
    }
}

fn fill_rows(plane: &mut [u8], row_bytes: usize, rows: usize, value: impl Fn(usize) -> u8) {
    if row_bytes == 0 {
        return;
    }
    for row in plane.chunks_exact_mut(row_bytes).take(rows) {
        for (i, b) in row.iter_mut().enumerate() {
            *b = value(i);
        }
    }
}

impl VideoCodec for TestPatternCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> SourcePixelFormat {
        self.format
    }

    fn frame_interval(&self) -> f64 {
        self.fps.frame_duration_secs()
    }

    fn has_delay(&self) -> bool {
        self.delay > 0
    }

    fn is_dv(&self) -> bool {
        self.dv
    }

    fn declared_frames(&self) -> u32 {
        self.declared
    }

    fn decode(&mut self, packet: &Packet) -> Result<Option<RawPicture>, CodecError> {
        if packet.is_end_of_stream() {
            return Ok(self.pending.pop_front());
        }
        if self.fail_at.is_some() && self.fail_at == packet.pts {
            return Err(CodecError(INVALID_DATA));
        }
        let pic = self.picture(packet.pts);
        self.pending.push_back(pic);
        if self.pending.len() > self.delay {
            Ok(self.pending.pop_front())
        } else {
            Ok(None)
        }
    }

    fn flush_buffers(&mut self) {
        self.pending.clear();
        self.flushes += 1;
    }
}
