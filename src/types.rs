use serde::{Deserialize, Serialize};

/// Landmark index conventions of the 21-point hand model
#[allow(dead_code)]
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;

    pub const LANDMARK_COUNT: usize = 21;
}

/// A single landmark in image pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: i32,
    pub y: i32,
}

impl Point2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt() as f32
    }
}

/// A landmark as reported by the detector, as a fraction of image width/height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

/// Ordered landmarks of one detected hand. Index positions are fixed by the detector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Landmarks {
    pub points: Vec<Point2>,
}

impl Landmarks {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Scale normalized detector output to pixel coordinates, truncating toward zero.
    pub fn from_normalized(points: &[NormalizedPoint], width: u32, height: u32) -> Self {
        let points = points
            .iter()
            .map(|p| Point2 {
                x: (p.x * width as f32) as i32,
                y: (p.y * height as f32) as i32,
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One complete JPEG image cut out of the byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
