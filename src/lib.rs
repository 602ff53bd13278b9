//! Building blocks for non-stationary Gabor-style time-frequency transforms.
//!
//! This crate supplies the pieces an overlap-add Gabor pipeline composes:
//! analysis-window generators authored for circular placement ([`window`]),
//! the size resolver and range calculator that lay those windows out on a
//! shared circular timeline ([`layout`]), and a Fourier-transform backend
//! that caches one execution plan per transform length ([`fft`]).
//!
//! The assembly of windows into a full forward/inverse transform lives in
//! the consuming pipeline; this crate deliberately stops at the numeric
//! primitives.

pub mod fft;
pub mod layout;
pub mod window;

pub use fft::{FftBackend, FftError, FftStrategy, PlanningEffort};
pub use layout::{LayoutError, SizeSpec, WindowLayout, resolve_sizes, window_ranges};
pub use window::{BlackmanHarrisKind, blackman_harris, continuous_tukey, hann, truncated_gaussian};
