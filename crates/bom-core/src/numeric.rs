//! Guards for catalog numbers.

use crate::BomError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, BomError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BomError::NonFinite { what, value: v })
    }
}

/// Costs and weights must be finite and `>= 0`.
pub fn ensure_non_negative(v: f64, what: &'static str) -> Result<f64, BomError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(BomError::Negative { what, value: v });
    }
    Ok(v)
}
