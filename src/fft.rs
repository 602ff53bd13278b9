//! Forward and inverse Fourier transforms with per-length plan caching.
//!
//! [`FftBackend`] exposes the four transform flavours the enclosing pipeline
//! needs: complex forward/inverse and real-input/real-output. In the planned
//! strategy each distinct transform length is planned once and the plan is
//! reused on every later call of that length; the direct strategy evaluates
//! the same transforms without any persistent state, which is slower but
//! numerically equivalent. Forward transforms are unscaled and inverse
//! transforms divide by the output length, so a forward/inverse pair
//! reproduces its input.

use parking_lot::{Mutex, RwLock};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustc_hash::FxHashMap;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Execution strategy selected when a backend is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FftStrategy {
    /// Plan each transform length once and reuse the plan on later calls.
    #[default]
    Planned,
    /// Evaluate every call directly without building or caching plans.
    Direct,
}

/// How much up-front work to invest when a new plan is constructed.
///
/// `Measure` asks the backend to spend extra time searching for a faster
/// plan where the underlying library supports it; the bundled planners
/// derive plans from the transform length alone and treat it as a hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningEffort {
    #[default]
    Estimate,
    Measure,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FftError {
    #[error("transform length must be positive")]
    ZeroLength,
    #[error("half spectrum is too short; expected at least {needed} bins, got {got}")]
    SpectrumTooShort { needed: usize, got: usize },
}

/// Transform executor with one plan cache per operation.
///
/// The caches are keyed by input length and never evicted; a transform run
/// touches as many distinct lengths as its window collection has sizes, so
/// scoping a backend to a session bounds the cache. All methods take `&self`
/// and the type is `Send + Sync`, so one backend can serve windows processed
/// in parallel; concurrent first use of a length may race to plan it, but
/// only the first plan is retained.
pub struct FftBackend {
    strategy: FftStrategy,
    effort: PlanningEffort,
    complex_planner: Mutex<FftPlanner<f64>>,
    real_planner: Mutex<RealFftPlanner<f64>>,
    forward_plans: RwLock<FxHashMap<usize, Arc<dyn Fft<f64>>>>,
    inverse_plans: RwLock<FxHashMap<usize, Arc<dyn Fft<f64>>>>,
    forward_real_plans: RwLock<FxHashMap<usize, Arc<dyn RealToComplex<f64>>>>,
    inverse_real_plans: RwLock<FxHashMap<usize, Arc<dyn ComplexToReal<f64>>>>,
}

impl FftBackend {
    pub fn new(strategy: FftStrategy) -> Self {
        Self::with_effort(strategy, PlanningEffort::default())
    }

    pub fn with_effort(strategy: FftStrategy, effort: PlanningEffort) -> Self {
        Self {
            strategy,
            effort,
            complex_planner: Mutex::new(FftPlanner::new()),
            real_planner: Mutex::new(RealFftPlanner::new()),
            forward_plans: RwLock::new(FxHashMap::default()),
            inverse_plans: RwLock::new(FxHashMap::default()),
            forward_real_plans: RwLock::new(FxHashMap::default()),
            inverse_real_plans: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn strategy(&self) -> FftStrategy {
        self.strategy
    }

    pub fn planning_effort(&self) -> PlanningEffort {
        self.effort
    }

    /// Number of plans currently held across all four operations.
    pub fn cached_plan_count(&self) -> usize {
        self.forward_plans.read().len()
            + self.inverse_plans.read().len()
            + self.forward_real_plans.read().len()
            + self.inverse_real_plans.read().len()
    }

    /// Forward complex transform; output is unscaled.
    pub fn forward(&self, input: &[Complex64]) -> Result<Vec<Complex64>, FftError> {
        if input.is_empty() {
            return Err(FftError::ZeroLength);
        }
        match self.strategy {
            FftStrategy::Planned => {
                let plan = self.forward_plan(input.len());
                let mut buffer = input.to_vec();
                plan.process(&mut buffer);
                Ok(buffer)
            }
            FftStrategy::Direct => Ok(direct_dft(input, -1.0)),
        }
    }

    /// Inverse complex transform, scaled by `1/len`.
    pub fn inverse(&self, input: &[Complex64]) -> Result<Vec<Complex64>, FftError> {
        if input.is_empty() {
            return Err(FftError::ZeroLength);
        }
        let mut buffer = match self.strategy {
            FftStrategy::Planned => {
                let plan = self.inverse_plan(input.len());
                let mut buffer = input.to_vec();
                plan.process(&mut buffer);
                buffer
            }
            FftStrategy::Direct => direct_dft(input, 1.0),
        };
        let scale = 1.0 / buffer.len() as f64;
        for value in &mut buffer {
            *value *= scale;
        }
        Ok(buffer)
    }

    /// Forward transform of a real sequence, returning the `len/2 + 1`
    /// non-redundant half-spectrum bins.
    pub fn forward_real(&self, input: &[f64]) -> Result<Vec<Complex64>, FftError> {
        if input.is_empty() {
            return Err(FftError::ZeroLength);
        }
        match self.strategy {
            FftStrategy::Planned => {
                let plan = self.forward_real_plan(input.len());
                let mut time = input.to_vec();
                let mut spectrum = plan.make_output_vec();
                plan.process(&mut time, &mut spectrum)
                    .expect("real FFT forward transform");
                Ok(spectrum)
            }
            FftStrategy::Direct => {
                let complex: Vec<Complex64> =
                    input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
                let mut spectrum = direct_dft(&complex, -1.0);
                spectrum.truncate(input.len() / 2 + 1);
                Ok(spectrum)
            }
        }
    }

    /// Inverse transform of a half spectrum into `output_len` real samples,
    /// scaled by `1/output_len`.
    ///
    /// At least `output_len/2 + 1` bins are required; trailing bins beyond
    /// that are ignored. The imaginary parts of the DC bin and, for even
    /// `output_len`, the Nyquist bin are ignored as well, per the
    /// half-spectrum convention.
    pub fn inverse_real(
        &self,
        spectrum: &[Complex64],
        output_len: usize,
    ) -> Result<Vec<f64>, FftError> {
        if output_len == 0 {
            return Err(FftError::ZeroLength);
        }
        let needed = output_len / 2 + 1;
        if spectrum.len() < needed {
            return Err(FftError::SpectrumTooShort {
                needed,
                got: spectrum.len(),
            });
        }
        if spectrum.len() > needed {
            debug!(
                "[fft] ignoring {} trailing bins beyond the {needed}-bin half spectrum",
                spectrum.len() - needed
            );
        }

        let mut bins = spectrum[..needed].to_vec();
        bins[0].im = 0.0;
        if output_len % 2 == 0 {
            bins[needed - 1].im = 0.0;
        }

        let scale = 1.0 / output_len as f64;
        match self.strategy {
            FftStrategy::Planned => {
                let plan = self.inverse_real_plan(output_len);
                let mut output = plan.make_output_vec();
                plan.process(&mut bins, &mut output)
                    .expect("real FFT inverse transform");
                for value in &mut output {
                    *value *= scale;
                }
                Ok(output)
            }
            FftStrategy::Direct => {
                // Rebuild the redundant half by conjugate symmetry, then take
                // the real part of the inverse.
                let mut full = vec![Complex64::new(0.0, 0.0); output_len];
                full[..needed].copy_from_slice(&bins);
                for k in needed..output_len {
                    full[k] = full[output_len - k].conj();
                }
                let time = direct_dft(&full, 1.0);
                Ok(time.iter().map(|value| value.re * scale).collect())
            }
        }
    }

    fn forward_plan(&self, len: usize) -> Arc<dyn Fft<f64>> {
        if let Some(plan) = self.forward_plans.read().get(&len) {
            return Arc::clone(plan);
        }
        let mut plans = self.forward_plans.write();
        Arc::clone(plans.entry(len).or_insert_with(|| {
            debug!("[fft] planning forward complex transform of length {len}");
            self.complex_planner.lock().plan_fft_forward(len)
        }))
    }

    fn inverse_plan(&self, len: usize) -> Arc<dyn Fft<f64>> {
        if let Some(plan) = self.inverse_plans.read().get(&len) {
            return Arc::clone(plan);
        }
        let mut plans = self.inverse_plans.write();
        Arc::clone(plans.entry(len).or_insert_with(|| {
            debug!("[fft] planning inverse complex transform of length {len}");
            self.complex_planner.lock().plan_fft_inverse(len)
        }))
    }

    fn forward_real_plan(&self, len: usize) -> Arc<dyn RealToComplex<f64>> {
        if let Some(plan) = self.forward_real_plans.read().get(&len) {
            return Arc::clone(plan);
        }
        let mut plans = self.forward_real_plans.write();
        Arc::clone(plans.entry(len).or_insert_with(|| {
            debug!("[fft] planning forward real transform of length {len}");
            self.real_planner.lock().plan_fft_forward(len)
        }))
    }

    fn inverse_real_plan(&self, len: usize) -> Arc<dyn ComplexToReal<f64>> {
        if let Some(plan) = self.inverse_real_plans.read().get(&len) {
            return Arc::clone(plan);
        }
        let mut plans = self.inverse_real_plans.write();
        Arc::clone(plans.entry(len).or_insert_with(|| {
            debug!("[fft] planning inverse real transform of length {len}");
            self.real_planner.lock().plan_fft_inverse(len)
        }))
    }
}

impl Default for FftBackend {
    fn default() -> Self {
        Self::new(FftStrategy::default())
    }
}

impl fmt::Debug for FftBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftBackend")
            .field("strategy", &self.strategy)
            .field("effort", &self.effort)
            .field("cached_plans", &self.cached_plan_count())
            .finish()
    }
}

/// Direct O(n^2) DFT evaluation; `sign` is -1 for analysis, +1 for synthesis.
fn direct_dft(input: &[Complex64], sign: f64) -> Vec<Complex64> {
    let n = input.len();
    let step = sign * TAU / n as f64;
    (0..n)
        .map(|k| {
            let mut acc = Complex64::new(0.0, 0.0);
            for (i, value) in input.iter().enumerate() {
                // Reduce the phase index modulo n to keep the twiddle
                // arguments small and the evaluation exact.
                let phase = step * ((k * i) % n) as f64;
                acc += *value * Complex64::new(phase.cos(), phase.sin());
            }
            acc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn complex_rms(a: &[Complex64], b: &[Complex64]) -> f64 {
        assert_eq!(a.len(), b.len());
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (*x - *y).norm_sqr()).sum();
        (sum / a.len() as f64).sqrt()
    }

    fn real_rms(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len());
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        (sum / a.len() as f64).sqrt()
    }

    fn random_real(len: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.random::<f64>() - 0.5).collect()
    }

    fn random_complex(len: usize, seed: u64) -> Vec<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| Complex64::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5))
            .collect()
    }

    #[test]
    fn complex_round_trip_recovers_input() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let input = random_complex(1000, 1);
        let spectrum = backend.forward(&input).unwrap();
        let restored = backend.inverse(&spectrum).unwrap();
        assert!(complex_rms(&input, &restored) < 1e-9);
    }

    #[test]
    fn real_round_trip_recovers_input() {
        let backend = FftBackend::new(FftStrategy::Planned);
        for len in [1000usize, 501] {
            let input = random_real(len, 2);
            let spectrum = backend.forward_real(&input).unwrap();
            assert_eq!(spectrum.len(), len / 2 + 1);
            let restored = backend.inverse_real(&spectrum, len).unwrap();
            assert!(
                real_rms(&input, &restored) < 1e-9,
                "round trip drifted for length {len}"
            );
        }
    }

    #[test]
    fn direct_strategy_matches_planned() {
        let planned = FftBackend::new(FftStrategy::Planned);
        let direct = FftBackend::new(FftStrategy::Direct);

        let complex_input = random_complex(1000, 3);
        assert!(
            complex_rms(
                &planned.forward(&complex_input).unwrap(),
                &direct.forward(&complex_input).unwrap(),
            ) < 1e-10
        );
        assert!(
            complex_rms(
                &planned.inverse(&complex_input).unwrap(),
                &direct.inverse(&complex_input).unwrap(),
            ) < 1e-10
        );

        let real_input = random_real(1000, 4);
        assert!(
            complex_rms(
                &planned.forward_real(&real_input).unwrap(),
                &direct.forward_real(&real_input).unwrap(),
            ) < 1e-10
        );

        let half_spectrum = random_complex(501, 5);
        assert!(
            real_rms(
                &planned.inverse_real(&half_spectrum, 1000).unwrap(),
                &direct.inverse_real(&half_spectrum, 1000).unwrap(),
            ) < 1e-10
        );
    }

    #[test]
    fn repeated_calls_reuse_cached_plans() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let input = random_complex(256, 6);

        let first = backend.forward(&input).unwrap();
        assert_eq!(backend.cached_plan_count(), 1);
        let second = backend.forward(&input).unwrap();
        assert_eq!(backend.cached_plan_count(), 1);
        assert_eq!(first, second);

        backend.forward(&random_complex(128, 7)).unwrap();
        assert_eq!(backend.cached_plan_count(), 2);
    }

    #[test]
    fn each_operation_caches_independently() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let complex_input = random_complex(64, 8);
        let real_input = random_real(64, 9);

        backend.forward(&complex_input).unwrap();
        backend.inverse(&complex_input).unwrap();
        let spectrum = backend.forward_real(&real_input).unwrap();
        backend.inverse_real(&spectrum, 64).unwrap();
        assert_eq!(backend.cached_plan_count(), 4);
    }

    #[test]
    fn direct_strategy_caches_nothing() {
        let backend = FftBackend::new(FftStrategy::Direct);
        let input = random_complex(64, 10);
        backend.forward(&input).unwrap();
        backend.inverse(&input).unwrap();
        backend.forward_real(&random_real(64, 11)).unwrap();
        assert_eq!(backend.cached_plan_count(), 0);
    }

    #[test]
    fn zero_length_input_is_rejected() {
        for strategy in [FftStrategy::Planned, FftStrategy::Direct] {
            let backend = FftBackend::new(strategy);
            assert_eq!(backend.forward(&[]), Err(FftError::ZeroLength));
            assert_eq!(backend.inverse(&[]), Err(FftError::ZeroLength));
            assert_eq!(backend.forward_real(&[]), Err(FftError::ZeroLength));
            assert_eq!(
                backend.inverse_real(&[Complex64::new(1.0, 0.0)], 0),
                Err(FftError::ZeroLength)
            );
            assert_eq!(backend.cached_plan_count(), 0);
        }
    }

    #[test]
    fn inverse_real_requires_a_full_half_spectrum() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let spectrum = random_complex(100, 12);
        assert_eq!(
            backend.inverse_real(&spectrum, 1000),
            Err(FftError::SpectrumTooShort {
                needed: 501,
                got: 100
            })
        );
    }

    #[test]
    fn inverse_real_ignores_extra_trailing_bins() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let input = random_real(128, 13);
        let spectrum = backend.forward_real(&input).unwrap();

        let mut padded = spectrum.clone();
        padded.extend(random_complex(32, 14));

        let exact = backend.inverse_real(&spectrum, 128).unwrap();
        let truncated = backend.inverse_real(&padded, 128).unwrap();
        assert_eq!(exact, truncated);
    }

    #[test]
    fn forward_real_matches_half_of_complex_forward() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let input = random_real(240, 15);
        let complex_input: Vec<Complex64> =
            input.iter().map(|&x| Complex64::new(x, 0.0)).collect();

        let half = backend.forward_real(&input).unwrap();
        let full = backend.forward(&complex_input).unwrap();
        assert!(complex_rms(&half, &full[..half.len()]) < 1e-10);
    }

    #[test]
    fn single_tone_concentrates_in_its_bin() {
        let backend = FftBackend::new(FftStrategy::Planned);
        let len = 256;
        let tone: Vec<f64> = (0..len)
            .map(|i| (TAU * 8.0 * i as f64 / len as f64).cos())
            .collect();
        let spectrum = backend.forward_real(&tone).unwrap();
        for (k, bin) in spectrum.iter().enumerate() {
            if k == 8 {
                assert!((bin.norm() - len as f64 / 2.0).abs() < 1e-9);
            } else {
                assert!(bin.norm() < 1e-9, "leak into bin {k}: {}", bin.norm());
            }
        }
    }
}
