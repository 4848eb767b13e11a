// Traits
use num_traits::Float;

/// Absolute tolerance used by default for float comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Is `x` within [`DEFAULT_TOLERANCE`] of zero?
#[inline]
pub fn is_zero(x: f64) -> bool {
    is_zero_within(x, DEFAULT_TOLERANCE)
}

/// Is `x` within `tol` of zero?
///
/// # Examples
///
/// ```
/// assert!(sdsdsim::numeric::is_zero_within(1e-11, 1e-10));
/// assert!(!sdsdsim::numeric::is_zero_within(1e-9, 1e-10));
/// ```
#[inline]
pub fn is_zero_within<F: Float>(x: F, tol: F) -> bool {
    x.abs() <= tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_tolerance() {
        assert!(is_zero_within(1.0, 1.0));
        assert!(is_zero_within(-1.0, 1.0));
        assert!(is_zero_within(1e-11, 1e-11));
        assert!(is_zero_within(-1e-11, 1e-11));
        assert!(is_zero_within(1e-11, 1e-10));
        assert!(is_zero_within(-1e-11, 1e-10));
    }

    #[test]
    fn outside_tolerance() {
        assert!(!is_zero_within(1.000000000000001, 1.0));
        assert!(!is_zero_within(-1.000000000000001, 1.0));
        assert!(!is_zero_within(1.1e-11, 1e-11));
        assert!(!is_zero_within(-1.1e-11, 1e-11));
        assert!(!is_zero_within(1e-9, 1e-10));
        assert!(!is_zero_within(-1e-9, 1e-10));
    }

    #[test]
    fn default_tolerance() {
        assert!(is_zero(0.0));
        assert!(is_zero(1e-10));
        assert!(!is_zero(1e-9));
    }
}
