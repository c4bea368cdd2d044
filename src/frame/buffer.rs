use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::frame::pixel_format::{PixelFormat, PixelFormatDesc};

/// Owned pixel storage laid out according to a [`PixelFormatDesc`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    desc: PixelFormatDesc,
    planes: Vec<Vec<u8>>,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer for `desc`.
    pub fn new(desc: PixelFormatDesc) -> Self {
        let planes = desc.planes.iter().map(|p| vec![0u8; p.size()]).collect();
        Self { desc, planes }
    }

    /// Wrap existing plane storage, checking each plane against the descriptor.
    pub fn from_planes(desc: PixelFormatDesc, planes: Vec<Vec<u8>>) -> PlayoutResult<Self> {
        if planes.len() != desc.planes.len() {
            return Err(PlayoutError::validation(format!(
                "pixel buffer expects {} planes, got {}",
                desc.planes.len(),
                planes.len()
            )));
        }
        for (i, (p, data)) in desc.planes.iter().zip(&planes).enumerate() {
            if data.len() != p.size() {
                return Err(PlayoutError::validation(format!(
                    "plane {i} expects {} bytes, got {}",
                    p.size(),
                    data.len()
                )));
            }
        }
        Ok(Self { desc, planes })
    }

    /// Layout of this buffer.
    pub fn desc(&self) -> &PixelFormatDesc {
        &self.desc
    }

    /// Number of planes.
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Borrow plane `index`.
    pub fn plane(&self, index: usize) -> PlayoutResult<&[u8]> {
        self.planes
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| PlayoutError::validation(format!("plane {index} out of range")))
    }

    /// Mutably borrow plane `index`.
    pub fn plane_mut(&mut self, index: usize) -> PlayoutResult<&mut [u8]> {
        self.planes
            .get_mut(index)
            .map(Vec::as_mut_slice)
            .ok_or_else(|| PlayoutError::validation(format!("plane {index} out of range")))
    }

    /// Mutably borrow all planes at once.
    pub fn planes_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.planes
    }

    /// Width and height of the first plane in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        self.desc.dimensions().unwrap_or((0, 0))
    }

    /// Check that the planes can be sampled as the descriptor's logical format.
    ///
    /// Packed formats need one plane of 4-byte elements. Ycbcr needs full-size luma and two
    /// equally sized chroma planes no larger than luma; Ycbcra adds a full-size alpha plane.
    pub fn check_geometry(&self) -> PlayoutResult<()> {
        let (count, depth) = match self.desc.format {
            PixelFormat::Bgra | PixelFormat::Rgba | PixelFormat::Argb | PixelFormat::Abgr => (1, 4),
            PixelFormat::Ycbcr => (3, 1),
            PixelFormat::Ycbcra => (4, 1),
            PixelFormat::Invalid => {
                return Err(PlayoutError::composition(
                    "cannot sample an unconverted pixel format",
                ));
            }
        };
        let format = self.desc.format;
        if self.desc.planes.len() != count || self.planes.len() != count {
            return Err(PlayoutError::validation(format!(
                "{format:?} expects {count} planes, got {}",
                self.desc.planes.len()
            )));
        }

        let (width, height) = self.dimensions();
        for (i, (plane, data)) in self.desc.planes.iter().zip(&self.planes).enumerate() {
            if plane.depth != depth || plane.linesize < plane.width * depth {
                return Err(PlayoutError::validation(format!(
                    "{format:?} plane {i}: depth {} linesize {} too small for width {}",
                    plane.depth, plane.linesize, plane.width
                )));
            }
            if data.len() < plane.size() {
                return Err(PlayoutError::validation(format!(
                    "{format:?} plane {i}: {} bytes, layout needs {}",
                    data.len(),
                    plane.size()
                )));
            }
            let full_size = i == 0 || i == 3;
            let fits = if full_size {
                plane.width == width && plane.height == height
            } else {
                let first = &self.desc.planes[1];
                plane.width == first.width
                    && plane.height == first.height
                    && plane.width <= width
                    && plane.height <= height
                    && (width == 0 || plane.width > 0)
                    && (height == 0 || plane.height > 0)
            };
            if !fits {
                return Err(PlayoutError::validation(format!(
                    "{format:?} plane {i} is {}x{} for a {width}x{height} image",
                    plane.width, plane.height
                )));
            }
        }
        Ok(())
    }

    /// Consume the buffer and return its planes.
    pub fn into_planes(self) -> Vec<Vec<u8>> {
        self.planes
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/buffer.rs"]
mod tests;
