//! Seeded draws the simulator is built from.
//!
//! Every function takes the caller's generator as `&mut R`; nothing in this
//! module owns or hides an RNG, so a replicate's draw sequence is fixed by
//! its seed alone.

// Traits
use rand::Rng;
use rand_distr::Distribution;

// Structs
use rand_distr::{OpenClosed01, Uniform};

use crate::errors::DrawError;
use crate::numeric;

/// Largest integer exactly representable in an `f64` (2^53).
const MAX_EXACT_INTEGER: f64 = 9007199254740992.0;

/// Sample an index with probability proportional to its weight.
///
/// Weights must be non-negative and sum to something positive. A zero
/// weight is never selected. Ties are broken by index order.
///
/// # Correctedness
///
/// Bounds on the weights are checked only in debug mode using
/// `debug_assert`.
#[inline]
pub fn weighted_index<R>(weights: &[f64], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let total: f64 = weights.iter().sum();
    debug_assert!(total > 0.0, "weights must have a positive sum");
    let probs: Vec<f64> = weights.iter().map(|w| w / total).collect();
    prob_index(&probs, rng)
}

/// Sample an index from an explicit probability vector.
///
/// Draws `u ~ U[0, 1)` and scans the cumulative distribution, returning
/// the first index that takes `u` below zero.
#[inline]
pub fn prob_index<R>(probs: &[f64], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    debug_assert!(
        numeric::is_zero(1.0 - probs.iter().sum::<f64>()),
        "probabilities must sum to one"
    );
    let mut u: f64 = rng.gen();
    let mut last = 0;
    for (i, p) in probs.iter().enumerate() {
        u -= p;
        if u < 0.0 {
            return i;
        }
        last = i;
    }
    // Only reachable when u exhausts the vector through rounding.
    debug_assert!(numeric::is_zero(u));
    last
}

/// Sample an exponential wait by inversion: `-ln(U) / rate`, `U ~ U(0, 1]`.
///
/// `rate` must be positive; zero-rate clocks are filtered out by callers
/// before the race.
#[inline]
pub fn exponential<R>(rate: f64, rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    debug_assert!(rate > 0.0, "exponential rate must be positive");
    let u: f64 = OpenClosed01.sample(rng);
    -u.ln() / rate
}

/// Sample a Poisson count by multiplying uniforms until they fall below
/// `exp(-mean)`.
///
/// Means large enough for `exp(-mean)` to underflow are split into the
/// smallest number of parts whose logs stay representable; the draw is the
/// sum of one draw per part.
pub fn poisson_rv<R>(mean: f64, rng: &mut R) -> Result<u64, DrawError>
where
    R: Rng + ?Sized,
{
    debug_assert!(mean > 0.0, "Poisson mean must be positive");
    let ln_min = f64::MIN_POSITIVE.ln();
    let mut neg_mean = -mean;
    if neg_mean < ln_min {
        let mut n_divs: u64 = 1;
        while neg_mean < ln_min {
            n_divs += 1;
            neg_mean = -mean / n_divs as f64;
        }
        let mut n = 0;
        for _ in 0..n_divs {
            n += poisson_rv(-neg_mean, rng)?;
        }
        return Ok(n);
    }
    let limit = neg_mean.exp();
    let mut p = 1.0;
    let mut k: u64 = 0;
    while p >= limit {
        k += 1;
        let u: f64 = rng.gen();
        p *= u;
    }
    let n = k - 1;
    if n as f64 > MAX_EXACT_INTEGER {
        return Err(DrawError::PoissonOverflow { mean });
    }
    Ok(n)
}

/// Draw a seed in `[1, 2^31 - 1]`, safe to write down and reuse across
/// platforms and generators.
#[inline]
pub fn safe_seed<R>(rng: &mut R) -> u64
where
    R: Rng + ?Sized,
{
    Uniform::new_inclusive(1u64, (1u64 << 31) - 1).sample(rng)
}
