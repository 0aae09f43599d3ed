use crate::models::{Dimensions, SUPPORTED_DIMENSIONS};

/// Picks the supported output size whose width/height ratio is closest to the input's.
///
/// Ties go to the earlier entry of [`SUPPORTED_DIMENSIONS`]. A zero side has no ratio,
/// so it maps to the first (square) entry.
pub fn closest_dimensions(width: u32, height: u32) -> Dimensions {
    closest_in(&SUPPORTED_DIMENSIONS, width, height)
}

pub(crate) fn closest_in(candidates: &[Dimensions], width: u32, height: u32) -> Dimensions {
    let first = candidates[0];
    if width == 0 || height == 0 {
        return first;
    }

    let ratio = width as f64 / height as f64;
    let mut best = first;
    let mut best_delta = f64::MAX;
    for candidate in candidates {
        let delta = (ratio - candidate.ratio()).abs();
        if delta < best_delta {
            best_delta = delta;
            best = *candidate;
        }
    }
    best
}
