//! Analysis-window generators for non-stationary Gabor frames.
//!
//! Every generator here authors its envelope so that the temporal center of
//! the window sits at index 0 under circular indexing: the second half of the
//! envelope wraps around to the end of the array. The layout module places
//! windows on the shared timeline with modular arithmetic, so a generated
//! window can be applied at its reference position without further shifting.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Coefficient set for the 4-term Blackman-Harris cosine series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackmanHarrisKind {
    /// Reduced sidelobe leakage at the cost of a slightly different DC term.
    #[default]
    Modified,
    /// The published minimum-4-term coefficients.
    Standard,
}

impl BlackmanHarrisKind {
    fn coefficients(self) -> (f64, f64, f64, f64) {
        match self {
            BlackmanHarrisKind::Modified => (0.35872, 0.48832, 0.14128, 0.01168),
            BlackmanHarrisKind::Standard => (0.35875, 0.48829, 0.14128, 0.01168),
        }
    }
}

/// Periodic Hann window with its peak at index 0.
///
/// Sample `i` is `0.5 + 0.5 * cos(2*pi*i/len)`; all values lie in `[0, 1]`
/// and a zero length yields an empty window.
pub fn hann(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 + 0.5 * (TAU * i as f64 / len as f64).cos())
        .collect()
}

/// Blackman-Harris window, zero-padded and rotated for circular placement.
///
/// The cosine series runs over a period of `len` rounded down to even, while
/// the requested lengths are honored exactly. When `padded_len` is `Some(l)`
/// the envelope is zero-padded to `l` samples before rotation; callers must
/// keep `l >= len`. The padded buffer is then rotated so the second half of
/// the envelope precedes the first, which centers the unpadded window at
/// index 0.
pub fn blackman_harris(
    len: usize,
    padded_len: Option<usize>,
    kind: BlackmanHarrisKind,
) -> Vec<f64> {
    let total = padded_len.unwrap_or(len).max(len);
    if total == 0 {
        return Vec::new();
    }

    let (a0, a1, a2, a3) = kind.coefficients();
    let period = ((len / 2) * 2).max(2) as f64;

    let mut out = vec![0.0; total];
    for (k, slot) in out.iter_mut().enumerate().take(len) {
        let phase = TAU * k as f64 / period;
        *slot = a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos() - a3 * (3.0 * phase).cos();
    }

    out.rotate_right(len.div_ceil(2));
    out
}

/// Flat-top window with raised-cosine transition edges, sampled from a
/// continuous profile.
///
/// `len` points are spread evenly over a conceptual span of `slice_len`; the
/// profile is 1 between the transition ramps, 0 outside them, and the ramps
/// of width `transition_area` are centered at the 1/4 and 3/4 points of the
/// span. Callers must keep `transition_area <= slice_len / 2`; the profile is
/// undefined outside that contract.
pub fn continuous_tukey(len: usize, slice_len: f64, transition_area: f64) -> Vec<f64> {
    let rise_center = slice_len / 4.0;
    let fall_center = 3.0 * slice_len / 4.0;
    let half = transition_area / 2.0;

    (0..len)
        .map(|i| {
            let pos = i as f64 * slice_len / len as f64;
            if pos >= rise_center - half && pos <= rise_center + half {
                0.5 + 0.5 * (PI * (pos - (rise_center + half)) / transition_area).cos()
            } else if pos >= fall_center - half && pos <= fall_center + half {
                0.5 + 0.5 * (PI * (pos - (fall_center - half)) / transition_area).cos()
            } else if pos > rise_center + half && pos < fall_center - half {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Truncated Gaussian envelope, split and wrapped around index 0.
///
/// The Gaussian is parameterized so its essential extent covers
/// `essential_len` samples, and it is lowered by `exp(-pi * 1.9^2)` so the
/// envelope reaches exactly zero at the edge of that support. The samples at
/// negative offsets are stored at the end of the array and the samples at
/// non-negative offsets at the start, so the peak lands on index 0 under
/// circular indexing. The output length is `max(essential_len, len)`; any
/// surplus stays zero between the two wrapped halves.
pub fn truncated_gaussian(essential_len: usize, len: usize) -> Vec<f64> {
    let total = len.max(essential_len);
    let mut out = vec![0.0; total];
    if essential_len == 0 {
        return out;
    }

    let tail = essential_len / 2;
    let head = essential_len.div_ceil(2) + 1;
    let floor = (-PI * 1.9f64 * 1.9).exp();
    let scale = 3.8 / essential_len as f64;
    let sample = |k: f64| (-PI * (k * scale).powi(2)).exp() - floor;

    for j in 0..tail {
        out[total - tail + j] = sample(j as f64 - tail as f64);
    }
    // Head second: where the two halves meet (no padding), the center sample
    // takes the head value.
    for (j, slot) in out.iter_mut().enumerate().take(head) {
        *slot = sample(j as f64);
    }

    out
}
