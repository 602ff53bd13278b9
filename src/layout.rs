//! Placement of analysis windows on a shared circular timeline.
//!
//! A window collection is laid out by pairing each window with a reference
//! position on the timeline. [`resolve_sizes`] turns an optional transform
//! size specification into one concrete size per window, and
//! [`window_ranges`] computes the circular index range each window covers in
//! the shared overlap-add buffer. Windows are expected to be authored with
//! their temporal center at index 0 (see the window module), which is what
//! makes plain modular placement sufficient here.

use serde::{Deserialize, Serialize};

/// Transform-size specification for a window collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeSpec {
    /// Each window uses its own length.
    #[default]
    Derived,
    /// One size broadcast to every window.
    Uniform(usize),
    /// An explicit size per window; must match the collection length.
    PerWindow(Vec<usize>),
}

/// Circular index ranges for a window collection, plus the total number of
/// samples the layout spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowLayout {
    /// Per-window index ranges into the shared buffer, each as long as its
    /// window and each entry in `[0, buffer_len)`.
    pub ranges: Vec<Vec<usize>>,
    /// Length of the shared circular buffer (`nn`).
    pub buffer_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("per-window size count is invalid; expected {expected}, got {got}")]
    SizeCountMismatch { expected: usize, got: usize },
    #[error("window collection is empty")]
    EmptyCollection,
    #[error("window and position counts differ; expected {expected}, got {got}")]
    PositionCountMismatch { expected: usize, got: usize },
    #[error("reference positions must be non-decreasing (violated at index {index})")]
    UnsortedPositions { index: usize },
    #[error("total transform length must be positive")]
    ZeroTotalLength,
    #[error("window layout spans zero samples")]
    EmptyTimeline,
}

/// Resolves a [`SizeSpec`] into one transform size per window.
pub fn resolve_sizes(spec: &SizeSpec, windows: &[Vec<f64>]) -> Result<Vec<usize>, LayoutError> {
    match spec {
        SizeSpec::Derived => Ok(windows.iter().map(Vec::len).collect()),
        SizeSpec::Uniform(size) => Ok(vec![*size; windows.len()]),
        SizeSpec::PerWindow(sizes) => {
            if sizes.len() != windows.len() {
                return Err(LayoutError::SizeCountMismatch {
                    expected: windows.len(),
                    got: sizes.len(),
                });
            }
            Ok(sizes.clone())
        }
    }
}

/// Computes where each window sits on the shared circular timeline.
///
/// `positions` holds the non-decreasing reference positions of the windows,
/// interpreted modulo `total_len`. The gap from each position to the next
/// (wrapping from the last position back to the first) determines the
/// timeline; its accumulated length becomes `buffer_len`. Window `i` of
/// length `L` is centered on its position and covers `L` consecutive indices
/// reduced modulo `buffer_len`, so ranges may overlap and may wrap past the
/// end of the buffer.
pub fn window_ranges(
    windows: &[Vec<f64>],
    positions: &[usize],
    total_len: usize,
) -> Result<WindowLayout, LayoutError> {
    if windows.is_empty() {
        return Err(LayoutError::EmptyCollection);
    }
    if windows.len() != positions.len() {
        return Err(LayoutError::PositionCountMismatch {
            expected: windows.len(),
            got: positions.len(),
        });
    }
    if total_len == 0 {
        return Err(LayoutError::ZeroTotalLength);
    }
    if let Some(index) = positions.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(LayoutError::UnsortedPositions { index: index + 1 });
    }

    let last = positions[positions.len() - 1];
    let wrap_shift = (total_len - last % total_len) % total_len;

    // Accumulate the gaps between consecutive positions; the wrap-around gap
    // of the final window leads the sequence, so the running sum ends at the
    // full span of the timeline.
    let mut timepos = Vec::with_capacity(positions.len());
    let mut running = wrap_shift;
    timepos.push(running);
    for pair in positions.windows(2) {
        running += pair[1] - pair[0];
        timepos.push(running);
    }

    let buffer_len = running;
    if buffer_len == 0 {
        return Err(LayoutError::EmptyTimeline);
    }

    // Anchor the first window at position 0.
    for position in &mut timepos {
        *position -= wrap_shift;
    }

    let ranges = windows
        .iter()
        .zip(&timepos)
        .map(|(window, &center)| {
            let len = window.len() as i64;
            let start = center as i64 - len / 2;
            (0..len)
                .map(|offset| (start + offset).rem_euclid(buffer_len as i64) as usize)
                .collect()
        })
        .collect();

    Ok(WindowLayout { ranges, buffer_len })
}
