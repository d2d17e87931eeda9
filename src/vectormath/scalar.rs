//! Pure-scalar reference implementation of the vector-math contract
//! (spec §4.1). Used by tests to bound SIMD/scalar disagreement and
//! as a fallback for platforms or lengths where lane-width SIMD
//! doesn't pay off.

/// `Σ aᵢ·bᵢ`, scalar loop.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// `Σ aᵢ²`, scalar loop.
pub fn sqnorm(a: &[f32]) -> f32 {
    dot(a, a)
}

/// Cosine similarity, scalar loop. Same edge-case semantics as
/// [`super::cosine`].
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
