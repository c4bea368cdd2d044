use crate::decode::packet::Packet;
use crate::foundation::core::FieldMode;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::pixel_format::SourcePixelFormat;

/// Negative status returned by a codec's decode primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("codec returned status {0}")]
pub struct CodecError(pub i32);

/// A decoded picture in the codec's native layout.
///
/// Line sizes may exceed the visible row width; codecs commonly pad rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPicture {
    /// Native pixel format.
    pub format: SourcePixelFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Plane storage.
    pub planes: Vec<Vec<u8>>,
    /// Bytes per row of each plane.
    pub linesizes: Vec<usize>,
    /// The picture holds two interlaced fields.
    pub interlaced: bool,
    /// The top field is displayed first.
    pub top_field_first: bool,
    /// Extra field repeats requested by the stream.
    pub repeat_pict: u32,
    /// Timestamp carried through the codec.
    pub pts: Option<i64>,
}

impl RawPicture {
    /// Zero-filled, tightly packed progressive picture.
    pub fn blank(format: SourcePixelFormat, width: u32, height: u32) -> Self {
        let layout = format.native_planes(width, height);
        Self {
            format,
            width,
            height,
            planes: layout.iter().map(|&(w, h)| vec![0u8; w * h]).collect(),
            linesizes: layout.iter().map(|&(w, _)| w).collect(),
            interlaced: false,
            top_field_first: false,
            repeat_pict: 0,
            pts: None,
        }
    }

    /// Field order derived from the interlace flags.
    pub fn field_mode(&self) -> FieldMode {
        match (self.interlaced, self.top_field_first) {
            (false, _) => FieldMode::Progressive,
            (true, true) => FieldMode::Upper,
            (true, false) => FieldMode::Lower,
        }
    }

    /// Plane `index` with its line size.
    pub fn plane(&self, index: usize) -> PlayoutResult<(&[u8], usize)> {
        match (self.planes.get(index), self.linesizes.get(index)) {
            (Some(data), Some(&linesize)) => Ok((data, linesize)),
            _ => Err(PlayoutError::validation(format!(
                "picture has no plane {index}"
            ))),
        }
    }

    /// Check that every native plane is present and large enough for its rows.
    pub fn check_layout(&self) -> PlayoutResult<()> {
        let layout = self.format.native_planes(self.width, self.height);
        if self.planes.len() < layout.len() || self.linesizes.len() < layout.len() {
            return Err(PlayoutError::validation(format!(
                "{:?} picture needs {} planes, got {}",
                self.format,
                layout.len(),
                self.planes.len().min(self.linesizes.len())
            )));
        }
        for (i, &(row_bytes, rows)) in layout.iter().enumerate() {
            let (data, linesize) = self.plane(i)?;
            if linesize < row_bytes {
                return Err(PlayoutError::validation(format!(
                    "plane {i} line size {linesize} is below row width {row_bytes}"
                )));
            }
            let needed = if rows == 0 {
                0
            } else {
                (rows - 1) * linesize + row_bytes
            };
            if data.len() < needed {
                return Err(PlayoutError::validation(format!(
                    "plane {i} holds {} bytes, needs {needed}",
                    data.len()
                )));
            }
        }
        Ok(())
    }
}

/// The decode primitive behind a [`crate::decode::video::VideoDecoder`].
pub trait VideoCodec: Send {
    /// Long codec name, reported in diagnostics.
    fn name(&self) -> &str;

    /// Coded width in pixels.
    fn width(&self) -> u32;

    /// Coded height in pixels.
    fn height(&self) -> u32;

    /// Native output format.
    fn pixel_format(&self) -> SourcePixelFormat;

    /// Seconds per frame.
    fn frame_interval(&self) -> f64;

    /// The codec may hold frames back and must be drained at end of stream.
    fn has_delay(&self) -> bool {
        false
    }

    /// Total frame count declared by the container; 0 when unknown.
    fn declared_frames(&self) -> u32 {
        0
    }

    /// The stream is DV video, whose pictures sit one line high on upper-field channels.
    fn is_dv(&self) -> bool {
        false
    }

    /// Feed one packet; `Ok(None)` means the codec needs more input. The sentinel asks a
    /// delaying codec for one buffered picture.
    fn decode(&mut self, packet: &Packet) -> Result<Option<RawPicture>, CodecError>;

    /// Drop internally buffered pictures.
    fn flush_buffers(&mut self);
}
