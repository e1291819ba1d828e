//! Synthetic hands shared by unit tests.

use crate::types::{Landmarks, Point2};

// An open right hand, wrist at the origin, fingers pointing up (negative y).
const OPEN_HAND: [(i32, i32); 21] = [
    (0, 0), (-20, -10), (-35, -25), (-45, -40), (-50, -55),
    (-15, -50), (-17, -75), (-18, -90), (-19, -105),
    (0, -52), (0, -80), (0, -97), (0, -113),
    (14, -49), (16, -74), (17, -90), (18, -103),
    (27, -43), (31, -62), (33, -74), (35, -85),
];

// Fist: fingertips folded back toward the palm.
const FIST: [(i32, i32); 21] = [
    (0, 0), (-20, -10), (-32, -25), (-30, -40), (-20, -48),
    (-15, -50), (-17, -65), (-14, -52), (-12, -42),
    (0, -52), (0, -66), (1, -53), (1, -43),
    (14, -49), (15, -62), (13, -51), (12, -42),
    (27, -43), (28, -54), (25, -46), (23, -38),
];

fn place(raw: &[(i32, i32)], scale: i32, dx: i32, dy: i32) -> Landmarks {
    Landmarks::new(
        raw.iter()
            .map(|&(x, y)| Point2::new(x * scale + dx, y * scale + dy))
            .collect(),
    )
}

pub fn sample_hand(scale: i32, dx: i32, dy: i32) -> Landmarks {
    place(&OPEN_HAND, scale, dx, dy)
}

pub fn sample_fist(scale: i32, dx: i32, dy: i32) -> Landmarks {
    place(&FIST, scale, dx, dy)
}
