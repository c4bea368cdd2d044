use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::VideoFormatDesc;
use crate::frame::buffer::PixelBuffer;
use crate::frame::pixel_format::PixelFormatDesc;

/// Allocator of writable frames for one channel.
pub trait FrameFactory: Send + Sync {
    /// Allocate a buffer laid out as `desc`.
    fn create_frame(&self, desc: &PixelFormatDesc) -> PixelBuffer;

    /// Format of the owning channel.
    fn video_format_desc(&self) -> VideoFormatDesc;
}

/// Heap-backed [`FrameFactory`] handing out zero-filled buffers.
#[derive(Debug)]
pub struct ChannelFrameFactory {
    format: VideoFormatDesc,
    created: AtomicU64,
}

impl ChannelFrameFactory {
    /// Factory for a channel running `format`.
    pub fn new(format: VideoFormatDesc) -> Self {
        Self {
            format,
            created: AtomicU64::new(0),
        }
    }

    /// Number of frames allocated so far.
    pub fn created_frames(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

impl FrameFactory for ChannelFrameFactory {
    fn create_frame(&self, desc: &PixelFormatDesc) -> PixelBuffer {
        self.created.fetch_add(1, Ordering::Relaxed);
        PixelBuffer::new(desc.clone())
    }

    fn video_format_desc(&self) -> VideoFormatDesc {
        self.format.clone()
    }
}
