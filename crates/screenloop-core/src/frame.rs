//! Frame representation for captured screen data

use std::sync::Arc;

/// Bytes per pixel for BGRA frame data
pub const BYTES_PER_PIXEL: usize = 4;

/// A single captured still image
///
/// Pixel data is immutable and reference counted, so cloning a frame (or a
/// whole recorded sequence) does not copy pixels. Frames are ordered within a
/// session by `sequence`; `timestamp_us` records the wall clock at capture.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data in BGRA format
    data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Capture order within a session, starting at 1
    pub sequence: u64,
    /// Capture timestamp in microseconds since the Unix epoch
    pub timestamp_us: u64,
}

impl Frame {
    /// Create a new frame from BGRA pixel data, stamped with the current time
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        let timestamp_us = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        Self {
            data: Arc::new(data),
            width,
            height,
            sequence,
            timestamp_us,
        }
    }

    /// Get the raw pixel data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of bytes per row (stride)
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Get total size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check that the buffer holds at least `width * height` BGRA pixels
    pub fn is_valid(&self) -> bool {
        let expected_size = self.width as usize * self.height as usize * BYTES_PER_PIXEL;
        self.data.len() >= expected_size && self.width > 0 && self.height > 0
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("timestamp_us", &self.timestamp_us)
            .field("size", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_and_size_follow_dimensions() {
        let frame = Frame::new(vec![0u8; 2 * 2 * BYTES_PER_PIXEL], 2, 2, 1);
        assert_eq!(frame.stride(), 8);
        assert_eq!(frame.size(), 16);
        assert!(frame.is_valid());
    }

    #[test]
    fn short_buffer_is_invalid() {
        let frame = Frame::new(vec![0u8; 3], 2, 2, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        let frame = Frame::new(Vec::new(), 0, 0, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn clone_shares_pixel_data() {
        let frame = Frame::new(vec![7u8; 16], 2, 2, 1);
        let copy = frame.clone();
        assert_eq!(copy.data().as_ptr(), frame.data().as_ptr());
    }
}
