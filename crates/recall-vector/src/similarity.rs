use recall_core::{Error, Result};

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, accumulated in f64.
///
/// Lengths must match and both norms must be finite and non-zero; neither is
/// coerced.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch { expected: a.len(), got: b.len() });
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if !(na.is_finite() && nb.is_finite()) {
        return Err(Error::DegenerateVector("vector has non-finite components".to_string()));
    }
    if na == 0.0 || nb == 0.0 {
        return Err(Error::DegenerateVector(format!(
            "zero-norm vector of length {} has no direction",
            a.len()
        )));
    }
    Ok(dot / (na.sqrt() * nb.sqrt()))
}

pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}
