use crate::math::is_finite;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use num_traits::Zero;

/// Evaluates the Padé approximant of the truncated power series `c` at
/// `s = 1`.
///
/// For `L = c.len()` the approximant is `[L-1-M / M]` with
/// `M = (L-1)/2`, which is diagonal for odd `L`. The denominator
/// coefficients `b` (with `b0 = 1`) solve
///
/// ```txt
///     Σ_{j=1..M} b_j c_{L-M+r-j} = -c_{L-M+r},    r = 0..M-1
/// ```
///
/// and the numerator is `a_k = Σ_{j=0..min(k,M)} b_j c_{k-j}`.
///
/// If the denominator system is singular or the approximant is not
/// finite, the partial sum of the series is returned instead. Polynomial
/// series therefore evaluate exactly.
pub fn pade(c: &[Complex64]) -> Complex64 {
    let partial_sum = || c.iter().sum::<Complex64>();

    let len = c.len();
    if len < 3 {
        return partial_sum();
    }
    let m = (len - 1) / 2;
    let l = len - 1 - m;

    let coeff = |k: isize| -> Complex64 {
        if k < 0 {
            Complex64::zero()
        } else {
            c[k as usize]
        }
    };

    let a_mat = DMatrix::from_fn(m, m, |r, j| coeff((l + 1 + r) as isize - (j + 1) as isize));
    let rhs = DVector::from_fn(m, |r, _| -c[l + 1 + r]);

    let b_tail = match a_mat.lu().solve(&rhs) {
        Some(b) => b,
        None => {
            log::trace!("singular Padé denominator (L = {}), using partial sum", len);
            return partial_sum();
        }
    };

    let b: Vec<Complex64> = std::iter::once(Complex64::new(1.0, 0.0))
        .chain(b_tail.iter().copied())
        .collect();

    let a_sum: Complex64 = (0..=l)
        .map(|k| (0..=k.min(m)).map(|j| b[j] * c[k - j]).sum::<Complex64>())
        .sum();
    let b_sum: Complex64 = b.iter().sum();

    if b_sum.is_zero() {
        return partial_sum();
    }
    let value = a_sum / b_sum;
    if !is_finite(value) {
        return partial_sum();
    }
    value
}
