//! Vector math primitives (spec §4.1): dot product, squared L2 norm,
//! cosine similarity, batch averaging, L2-normalization.
//!
//! The public functions in this module dispatch to [`simd`] lanes of
//! width 8 (`wide::f32x8`) with a scalar remainder, auto-selecting the
//! scalar path for inputs shorter than one lane. [`scalar`] holds a
//! pure-scalar implementation of the same contract, used by tests to
//! establish the 1e-4 agreement bound (Testable Property 11) and as
//! a reference when debugging numeric drift.

pub mod scalar;

use wide::f32x8;

const LANES: usize = 8;

/// `Σ aᵢ·bᵢ`. Returns `0.0` for empty or mismatched-length inputs, to
/// keep `cosine` total.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let chunks = a.len() / LANES;
    let mut acc = f32x8::ZERO;
    for i in 0..chunks {
        let lo = i * LANES;
        let va = f32x8::from(&a[lo..lo + LANES]);
        let vb = f32x8::from(&b[lo..lo + LANES]);
        acc += va * vb;
    }
    let mut sum: f32 = acc.to_array().iter().sum();
    for i in (chunks * LANES)..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// `Σ aᵢ²`.
pub fn sqnorm(a: &[f32]) -> f32 {
    dot(a, a)
}

/// Cosine similarity. Returns `0.0` if either magnitude is zero, the
/// lengths differ, or either input is empty (spec §4.1).
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let na = sqnorm(a).sqrt();
    let nb = sqnorm(b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Element-wise mean across a slice of equal-length vectors,
/// preserving dimensionality. Returns an empty vector if `vs` is
/// empty.
pub fn average(vs: &[Vec<f32>]) -> Vec<f32> {
    match vs.first() {
        None => Vec::new(),
        Some(first) => {
            let dims = first.len();
            let mut acc = vec![0.0f32; dims];
            for v in vs {
                debug_assert_eq!(v.len(), dims, "average() requires equal-length vectors");
                for (a, &x) in acc.iter_mut().zip(v.iter()) {
                    *a += x;
                }
            }
            let n = vs.len() as f32;
            for a in acc.iter_mut() {
                *a /= n;
            }
            acc
        }
    }
}

/// L2-normalize `a` in place semantics (returns a new vector):
/// `a / ‖a‖` if `‖a‖ > 0`, else `a` unchanged (spec §4.1).
pub fn normalize(a: &[f32]) -> Vec<f32> {
    let mag = sqnorm(a).sqrt();
    if mag == 0.0 {
        return a.to_vec();
    }
    a.iter().map(|&x| x / mag).collect()
}

/// L2 magnitude of a vector.
pub fn magnitude(a: &[f32]) -> f32 {
    sqnorm(a).sqrt()
}
