use nalgebra::DMatrix;

use crate::error::{GestureError, GestureResult};
use crate::types::{hand, Landmarks};

/// Pairwise landmark distances divided by palm size (wrist to middle-finger base).
///
/// Independent of where the hand sits in the image and how far it is from the
/// camera. Not rotation invariant in practice: the detector's landmark noise
/// differs with hand orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureDescriptor {
    distances: DMatrix<f32>,
}

impl GestureDescriptor {
    /// Build the descriptor for one hand.
    ///
    /// Fails with `DegenerateInput` when landmarks 0 and 9 coincide; the frame
    /// should be skipped rather than classified.
    pub fn build(landmarks: &Landmarks) -> GestureResult<Self> {
        let points = &landmarks.points;
        if points.len() <= hand::MIDDLE_FINGER_MCP {
            return Err(GestureError::MalformedLandmarks(format!(
                "need at least {} landmarks for a palm reference, got {}",
                hand::MIDDLE_FINGER_MCP + 1,
                points.len()
            )));
        }

        let wrist = points[hand::WRIST];
        let palm = wrist.distance(&points[hand::MIDDLE_FINGER_MCP]);
        if palm == 0.0 {
            return Err(GestureError::DegenerateInput { x: wrist.x, y: wrist.y });
        }

        let n = points.len();
        let mut distances = DMatrix::<f32>::zeros(n, n);
        for row in 0..n {
            for col in (row + 1)..n {
                let d = points[row].distance(&points[col]) / palm;
                distances[(row, col)] = d;
                distances[(col, row)] = d;
            }
        }

        Ok(Self { distances })
    }

    /// Number of landmarks the descriptor was built from
    pub fn size(&self) -> usize {
        self.distances.nrows()
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.distances[(row, col)]
    }

    /// Sum of absolute cell differences over `nodes` x `nodes`.
    ///
    /// Returns infinity when the descriptors have different sizes or a node is out of range.
    pub fn error_against(&self, other: &GestureDescriptor, nodes: &[usize]) -> f32 {
        let n = self.size();
        if other.size() != n || nodes.iter().any(|&i| i >= n) {
            return f32::INFINITY;
        }

        let mut error = 0.0;
        for &row in nodes {
            for &col in nodes {
                error += (self.distances[(row, col)] - other.distances[(row, col)]).abs();
            }
        }
        error
    }
}
