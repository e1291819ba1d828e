//! Cuts complete JPEG images out of an MJPEG byte stream.
//!
//! The camera pushes concatenated JPEGs over HTTP without reliable part
//! boundaries, so frames are recovered by scanning for the start-of-image and
//! end-of-image markers. Bytes arrive in arbitrary chunks; anything that does
//! not yet form a complete frame stays buffered until more data arrives.

use tracing::{debug, warn};

use crate::types::Frame;

pub const START_OF_IMAGE: [u8; 2] = [0xFF, 0xD8];
pub const END_OF_IMAGE: [u8; 2] = [0xFF, 0xD9];

pub struct FrameExtractor {
    buffer: Vec<u8>,
    max_buffered: usize,
}

impl FrameExtractor {
    pub fn new(max_buffered: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_buffered,
        }
    }

    /// Append `bytes` and return every complete frame now available, in stream order.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some((start, end)) = self.next_frame_bounds() {
            let frame = self.buffer[start..end].to_vec();
            self.buffer.drain(..end);
            debug!("Extracted frame of {} bytes ({} buffered)", frame.len(), self.buffer.len());
            frames.push(Frame::new(frame));
        }

        if self.buffer.len() > self.max_buffered {
            self.shed_stale_bytes();
        }

        frames
    }

    /// Bytes waiting for the rest of a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    // Returns [start, end) of the first start marker through the first end marker after it.
    fn next_frame_bounds(&self) -> Option<(usize, usize)> {
        let start = find_marker(&self.buffer, &START_OF_IMAGE, 0)?;
        let end = find_marker(&self.buffer, &END_OF_IMAGE, start + START_OF_IMAGE.len())?;
        Some((start, end + END_OF_IMAGE.len()))
    }

    fn shed_stale_bytes(&mut self) {
        let before = self.buffer.len();
        let last_start = self
            .buffer
            .windows(START_OF_IMAGE.len())
            .rposition(|w| w == START_OF_IMAGE);

        match last_start {
            Some(pos) if pos > 0 => {
                self.buffer.drain(..pos);
            }
            Some(_) => {
                // A single frame larger than the cap; nothing sane to keep.
                self.buffer.clear();
            }
            None => {
                // Keep the last byte: it may be the first half of a marker.
                let keep_from = self.buffer.len() - 1;
                self.buffer.drain(..keep_from);
            }
        }
        warn!(
            "Frame buffer exceeded {} bytes without a complete frame; dropped {} bytes",
            self.max_buffered,
            before - self.buffer.len()
        );
    }
}

fn find_marker(haystack: &[u8], marker: &[u8; 2], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(body: &[u8]) -> Vec<u8> {
        let mut v = START_OF_IMAGE.to_vec();
        v.extend_from_slice(body);
        v.extend_from_slice(&END_OF_IMAGE);
        v
    }

    #[test]
    fn split_frame_emitted_only_after_end_arrives() {
        let mut ex = FrameExtractor::new(1 << 20);
        let full = jpeg(b"abcdef");
        let (first, second) = full.split_at(4);

        assert!(ex.extend(first).is_empty());
        assert_eq!(ex.buffered(), 4);

        let frames = ex.extend(second);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &full[..]);
        assert_eq!(ex.buffered(), 0);

        assert!(ex.extend(&[]).is_empty());
    }

    #[test]
    fn back_to_back_frames_in_one_chunk() {
        let mut ex = FrameExtractor::new(1 << 20);
        let a = jpeg(b"first");
        let b = jpeg(b"second");
        let mut chunk = a.clone();
        chunk.extend_from_slice(&b);
        chunk.extend_from_slice(&[0xFF, 0xD8, 0x01]);

        let frames = ex.extend(&chunk);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &a[..]);
        assert_eq!(frames[1].as_bytes(), &b[..]);
        // The start of the third frame is retained.
        assert_eq!(ex.buffered(), 3);
    }

    #[test]
    fn marker_split_across_chunks() {
        let mut ex = FrameExtractor::new(1 << 20);
        let full = jpeg(b"xyz");
        // Split in the middle of the end marker.
        let cut = full.len() - 1;
        assert!(ex.extend(&full[..cut]).is_empty());
        let frames = ex.extend(&full[cut..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &full[..]);
    }

    #[test]
    fn byte_at_a_time() {
        let mut ex = FrameExtractor::new(1 << 20);
        let full = jpeg(b"0123456789");
        let mut emitted = Vec::new();
        for b in &full {
            emitted.extend(ex.extend(std::slice::from_ref(b)));
        }
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_bytes(), &full[..]);
    }

    #[test]
    fn end_marker_before_start_is_not_a_frame() {
        let mut ex = FrameExtractor::new(1 << 20);
        let mut chunk = END_OF_IMAGE.to_vec();
        chunk.extend_from_slice(&START_OF_IMAGE);
        chunk.extend_from_slice(b"partial");
        assert!(ex.extend(&chunk).is_empty());

        let frames = ex.extend(&END_OF_IMAGE);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &jpeg(b"partial")[..]);
    }

    #[test]
    fn garbage_without_markers_is_deferred() {
        let mut ex = FrameExtractor::new(1 << 20);
        assert!(ex.extend(b"no markers here").is_empty());
        assert_eq!(ex.buffered(), 15);
    }

    #[test]
    fn leading_garbage_is_discarded_with_the_frame() {
        let mut ex = FrameExtractor::new(1 << 20);
        let mut chunk = b"--boundary\r\n".to_vec();
        chunk.extend_from_slice(&jpeg(b"img"));
        let frames = ex.extend(&chunk);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &jpeg(b"img")[..]);
        assert_eq!(ex.buffered(), 0);
    }

    #[test]
    fn oversized_buffer_keeps_latest_start() {
        let mut ex = FrameExtractor::new(16);
        let mut chunk = vec![0u8; 20];
        chunk.extend_from_slice(&START_OF_IMAGE);
        chunk.extend_from_slice(b"tail");
        assert!(ex.extend(&chunk).is_empty());
        assert_eq!(ex.buffered(), 6);

        let frames = ex.extend(&END_OF_IMAGE);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &jpeg(b"tail")[..]);
    }

    #[test]
    fn oversized_buffer_without_start_keeps_last_byte() {
        let mut ex = FrameExtractor::new(8);
        let mut chunk = vec![0u8; 12];
        chunk.push(0xFF);
        assert!(ex.extend(&chunk).is_empty());
        assert_eq!(ex.buffered(), 1);

        let mut rest = vec![0xD8];
        rest.extend_from_slice(b"ok");
        rest.extend_from_slice(&END_OF_IMAGE);
        let frames = ex.extend(&rest);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), &jpeg(b"ok")[..]);
    }
}
