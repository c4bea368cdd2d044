use std::sync::Arc;

/// One compressed packet as handed over by the demuxer.
///
/// A packet without payload is the end-of-stream sentinel; it is accepted by every decoder
/// regardless of `stream_index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Demuxer stream the packet belongs to.
    pub stream_index: usize,
    /// Presentation timestamp in frames.
    pub pts: Option<i64>,
    /// Compressed payload; `None` for the sentinel.
    pub data: Option<Arc<[u8]>>,
}

impl Packet {
    /// Data packet for `stream_index`.
    pub fn new(stream_index: usize, pts: Option<i64>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            stream_index,
            pts,
            data: Some(data.into()),
        }
    }

    /// The end-of-stream sentinel.
    pub fn end_of_stream() -> Self {
        Self {
            stream_index: 0,
            pts: None,
            data: None,
        }
    }

    /// Return `true` for the sentinel.
    pub fn is_end_of_stream(&self) -> bool {
        self.data.is_none()
    }

    /// Payload bytes; empty for the sentinel.
    pub fn payload(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}
