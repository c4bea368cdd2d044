use smallvec::SmallVec;

/// Pixel layouts the compositor consumes directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Packed 8-bit B, G, R, A.
    Bgra,
    /// Packed 8-bit R, G, B, A.
    Rgba,
    /// Packed 8-bit A, R, G, B.
    Argb,
    /// Packed 8-bit A, B, G, R.
    Abgr,
    /// Planar Y, Cb, Cr (any chroma subsampling).
    Ycbcr,
    /// Planar Y, Cb, Cr plus a full-resolution alpha plane.
    Ycbcra,
    /// Not consumable without software conversion.
    Invalid,
}

impl PixelFormat {
    /// Return `true` for single-plane 4-byte layouts.
    pub fn is_packed(self) -> bool {
        matches!(
            self,
            PixelFormat::Bgra | PixelFormat::Rgba | PixelFormat::Argb | PixelFormat::Abgr
        )
    }
}

/// Native pixel formats a decoder may report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePixelFormat {
    /// Packed BGRA.
    Bgra,
    /// Packed ARGB.
    Argb,
    /// Packed RGBA.
    Rgba,
    /// Packed ABGR.
    Abgr,
    /// Planar 4:4:4.
    Yuv444p,
    /// Planar 4:2:2.
    Yuv422p,
    /// Planar 4:2:0.
    Yuv420p,
    /// Planar 4:1:1.
    Yuv411p,
    /// Planar 4:1:0.
    Yuv410p,
    /// Planar 4:2:0 with alpha.
    Yuva420p,
    /// Luma plane plus interleaved CbCr plane, 4:2:0.
    Nv12,
    /// Packed Y0 Cb Y1 Cr, 4:2:2.
    Yuyv422,
    /// Packed R, G, B.
    Rgb24,
    /// Packed B, G, R.
    Bgr24,
    /// Single luma plane.
    Gray8,
}

impl SourcePixelFormat {
    /// Parse a lowercase ffmpeg-style pixel format name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bgra" => Self::Bgra,
            "argb" => Self::Argb,
            "rgba" => Self::Rgba,
            "abgr" => Self::Abgr,
            "yuv444p" => Self::Yuv444p,
            "yuv422p" => Self::Yuv422p,
            "yuv420p" => Self::Yuv420p,
            "yuv411p" => Self::Yuv411p,
            "yuv410p" => Self::Yuv410p,
            "yuva420p" => Self::Yuva420p,
            "nv12" => Self::Nv12,
            "yuyv422" => Self::Yuyv422,
            "rgb24" => Self::Rgb24,
            "bgr24" => Self::Bgr24,
            "gray" | "gray8" => Self::Gray8,
            _ => return None,
        })
    }

    /// Logical format the compositor sees for this source format.
    pub fn logical(self) -> PixelFormat {
        match self {
            Self::Bgra => PixelFormat::Bgra,
            Self::Argb => PixelFormat::Argb,
            Self::Rgba => PixelFormat::Rgba,
            Self::Abgr => PixelFormat::Abgr,
            Self::Yuv444p | Self::Yuv422p | Self::Yuv420p | Self::Yuv411p | Self::Yuv410p => {
                PixelFormat::Ycbcr
            }
            Self::Yuva420p => PixelFormat::Ycbcra,
            Self::Nv12 | Self::Yuyv422 | Self::Rgb24 | Self::Bgr24 | Self::Gray8 => {
                PixelFormat::Invalid
            }
        }
    }

    /// Horizontal and vertical chroma subsampling as log2 shifts.
    pub fn chroma_shift(self) -> (u32, u32) {
        match self {
            Self::Yuv422p | Self::Yuyv422 => (1, 0),
            Self::Yuv420p | Self::Yuva420p | Self::Nv12 => (1, 1),
            Self::Yuv411p => (2, 0),
            Self::Yuv410p => (2, 2),
            _ => (0, 0),
        }
    }

    /// Byte layout `(width_bytes, rows)` of each native plane at `width` x `height`.
    ///
    /// This is the layout a codec hands out, before any padding it adds to line sizes.
    pub fn native_planes(self, width: u32, height: u32) -> SmallVec<[(usize, usize); 4]> {
        let (w, h) = (width as usize, height as usize);
        let (sw, sh) = self.chroma_shift();
        let (cw, ch) = (shift_ceil(width, sw) as usize, shift_ceil(height, sh) as usize);
        let mut out = SmallVec::new();
        match self {
            Self::Bgra | Self::Argb | Self::Rgba | Self::Abgr => out.push((w * 4, h)),
            Self::Rgb24 | Self::Bgr24 => out.push((w * 3, h)),
            Self::Gray8 => out.push((w, h)),
            Self::Yuyv422 => out.push((cw * 4, h)),
            Self::Nv12 => {
                out.push((w, h));
                out.push((cw * 2, ch));
            }
            Self::Yuv444p | Self::Yuv422p | Self::Yuv420p | Self::Yuv411p | Self::Yuv410p => {
                out.push((w, h));
                out.push((cw, ch));
                out.push((cw, ch));
            }
            Self::Yuva420p => {
                out.push((w, h));
                out.push((cw, ch));
                out.push((cw, ch));
                out.push((w, h));
            }
        }
        out
    }
}

/// `ceil(v / 2^shift)`.
fn shift_ceil(v: u32, shift: u32) -> u32 {
    (v + (1 << shift) - 1) >> shift
}

/// One contiguous region of a pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Plane {
    /// Bytes per row.
    pub linesize: usize,
    /// Elements per row.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Bytes per element.
    pub depth: usize,
}

impl Plane {
    /// Create a tightly packed plane of `width` elements of `depth` bytes.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            linesize: width * depth,
            width,
            height,
            depth,
        }
    }

    /// Total byte size of the plane.
    pub fn size(&self) -> usize {
        self.linesize * self.height
    }
}

/// Logical format tag plus ordered plane layout.
///
/// Fully determined by `(format, width, height)`; built once per decoder or mixer and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelFormatDesc {
    /// Logical format.
    pub format: PixelFormat,
    /// Planes in storage order.
    pub planes: SmallVec<[Plane; 4]>,
}

impl PixelFormatDesc {
    /// Descriptor for a packed 4-channel BGRA image.
    pub fn bgra(width: u32, height: u32) -> Self {
        Self::packed(PixelFormat::Bgra, width, height)
    }

    /// Descriptor for any packed 4-channel layout.
    pub fn packed(format: PixelFormat, width: u32, height: u32) -> Self {
        let mut planes = SmallVec::new();
        planes.push(Plane::new(width as usize, height as usize, 4));
        Self { format, planes }
    }

    /// Derive the descriptor for a decoder's native format.
    ///
    /// Formats the compositor cannot take directly yield [`PixelFormat::Invalid`] with no
    /// planes; callers fall back to software conversion.
    pub fn for_source(src: SourcePixelFormat, width: u32, height: u32) -> Self {
        let format = src.logical();
        let (w, h) = (width as usize, height as usize);
        let mut planes = SmallVec::<[Plane; 4]>::new();
        match format {
            PixelFormat::Bgra | PixelFormat::Rgba | PixelFormat::Argb | PixelFormat::Abgr => {
                planes.push(Plane::new(w, h, 4));
            }
            PixelFormat::Ycbcr | PixelFormat::Ycbcra => {
                let (sw, sh) = src.chroma_shift();
                let cw = shift_ceil(width, sw) as usize;
                let ch = shift_ceil(height, sh) as usize;
                planes.push(Plane::new(w, h, 1));
                planes.push(Plane::new(cw, ch, 1));
                planes.push(Plane::new(cw, ch, 1));
                if format == PixelFormat::Ycbcra {
                    planes.push(Plane::new(w, h, 1));
                }
            }
            PixelFormat::Invalid => {}
        }
        Self { format, planes }
    }

    /// Sum of all plane sizes in bytes.
    pub fn total_size(&self) -> usize {
        self.planes.iter().map(Plane::size).sum()
    }

    /// Width and height of the first plane in elements.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.planes.first().map(|p| (p.width, p.height))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/pixel_format.rs"]
mod tests;
