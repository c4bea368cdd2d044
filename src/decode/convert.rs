use rayon::prelude::*;

use crate::decode::codec::RawPicture;
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::foundation::math::{mul_div255_u8, ycbcr_to_bgr};
use crate::frame::buffer::PixelBuffer;
use crate::frame::pixel_format::{PixelFormat, SourcePixelFormat};

/// Software colour conversion for pictures the compositor cannot take directly.
///
/// Built once per stream, then reused for every picture.
pub trait ColorConverter: Send {
    /// Convert `src` into `dst`, which is laid out as packed BGRA.
    fn convert(&mut self, src: &RawPicture, dst: &mut PixelBuffer) -> PlayoutResult<()>;
}

/// Nearest-sample converter from any [`SourcePixelFormat`] to packed premultiplied BGRA.
///
/// Y'CbCr input is interpreted as BT.709 limited range; grey input as full range.
#[derive(Clone, Debug)]
pub struct SoftwareScaler {
    src: SourcePixelFormat,
    width: u32,
    height: u32,
}

impl SoftwareScaler {
    /// Create a converter for `src` pictures of `width` x `height`.
    pub fn new(src: SourcePixelFormat, width: u32, height: u32) -> PlayoutResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlayoutError::configuration(format!(
                "cannot convert {src:?} pictures of {width}x{height}"
            )));
        }
        Ok(Self { src, width, height })
    }
}

impl ColorConverter for SoftwareScaler {
    fn convert(&mut self, src: &RawPicture, dst: &mut PixelBuffer) -> PlayoutResult<()> {
        if src.format != self.src || src.width != self.width || src.height != self.height {
            return Err(PlayoutError::validation(format!(
                "converter built for {:?} {}x{}, got {:?} {}x{}",
                self.src, self.width, self.height, src.format, src.width, src.height
            )));
        }
        if dst.desc().format != PixelFormat::Bgra
            || dst.dimensions() != (self.width as usize, self.height as usize)
        {
            return Err(PlayoutError::validation(
                "converter output must be packed BGRA of the picture size",
            ));
        }
        src.check_layout()?;

        let reader = Reader::new(src)?;
        let row_bytes = self.width as usize * 4;
        let out = dst.plane_mut(0)?;
        out.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    px.copy_from_slice(&reader.bgra(x, y));
                }
            });
        Ok(())
    }
}

struct Reader<'a> {
    pic: &'a RawPicture,
    planes: Vec<(&'a [u8], usize)>,
    shift: (u32, u32),
}

impl<'a> Reader<'a> {
    fn new(pic: &'a RawPicture) -> PlayoutResult<Self> {
        let count = pic.format.native_planes(pic.width, pic.height).len();
        let planes = (0..count)
            .map(|i| pic.plane(i))
            .collect::<PlayoutResult<Vec<_>>>()?;
        Ok(Self {
            pic,
            planes,
            shift: pic.format.chroma_shift(),
        })
    }

    fn at(&self, plane: usize, x: usize, y: usize) -> u8 {
        let (data, linesize) = self.planes[plane];
        data[y * linesize + x]
    }

    fn bgra(&self, x: usize, y: usize) -> [u8; 4] {
        let (sw, sh) = self.shift;
        let (cx, cy) = (x >> sw, y >> sh);
        match self.pic.format {
            SourcePixelFormat::Bgra => {
                let i = x * 4;
                [self.at(0, i, y), self.at(0, i + 1, y), self.at(0, i + 2, y), self.at(0, i + 3, y)]
            }
            SourcePixelFormat::Rgba => {
                let i = x * 4;
                [self.at(0, i + 2, y), self.at(0, i + 1, y), self.at(0, i, y), self.at(0, i + 3, y)]
            }
            SourcePixelFormat::Argb => {
                let i = x * 4;
                [self.at(0, i + 3, y), self.at(0, i + 2, y), self.at(0, i + 1, y), self.at(0, i, y)]
            }
            SourcePixelFormat::Abgr => {
                let i = x * 4;
                [self.at(0, i + 1, y), self.at(0, i + 2, y), self.at(0, i + 3, y), self.at(0, i, y)]
            }
            SourcePixelFormat::Rgb24 => {
                let i = x * 3;
                [self.at(0, i + 2, y), self.at(0, i + 1, y), self.at(0, i, y), 255]
            }
            SourcePixelFormat::Bgr24 => {
                let i = x * 3;
                [self.at(0, i, y), self.at(0, i + 1, y), self.at(0, i + 2, y), 255]
            }
            SourcePixelFormat::Gray8 => {
                let v = self.at(0, x, y);
                [v, v, v, 255]
            }
            SourcePixelFormat::Nv12 => {
                let [b, g, r] = ycbcr_to_bgr(
                    self.at(0, x, y),
                    self.at(1, cx * 2, cy),
                    self.at(1, cx * 2 + 1, cy),
                );
                [b, g, r, 255]
            }
            SourcePixelFormat::Yuyv422 => {
                // Y0 U Y1 V per pixel pair.
                let base = cx * 4;
                let luma = self.at(0, base + (x & 1) * 2, y);
                let [b, g, r] = ycbcr_to_bgr(luma, self.at(0, base + 1, y), self.at(0, base + 3, y));
                [b, g, r, 255]
            }
            SourcePixelFormat::Yuv444p
            | SourcePixelFormat::Yuv422p
            | SourcePixelFormat::Yuv420p
            | SourcePixelFormat::Yuv411p
            | SourcePixelFormat::Yuv410p => {
                let [b, g, r] =
                    ycbcr_to_bgr(self.at(0, x, y), self.at(1, cx, cy), self.at(2, cx, cy));
                [b, g, r, 255]
            }
            SourcePixelFormat::Yuva420p => {
                let [b, g, r] =
                    ycbcr_to_bgr(self.at(0, x, y), self.at(1, cx, cy), self.at(2, cx, cy));
                let a = self.at(3, x, y);
                let a16 = u16::from(a);
                [
                    mul_div255_u8(u16::from(b), a16),
                    mul_div255_u8(u16::from(g), a16),
                    mul_div255_u8(u16::from(r), a16),
                    a,
                ]
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/convert.rs"]
mod tests;
