use num_complex::Complex64;

pub const J: Complex64 = Complex64 { re: 0.0, im: 1.0 };

#[macro_export]
macro_rules! cmplx {
    () => {
        num_complex::Complex64::new(0.0, 0.0)
    };
    ($arg1:expr) => {
        num_complex::Complex64::new($arg1, 0.0)
    };
    ($arg1:expr, $arg2:expr) => {
        num_complex::Complex64::new($arg1, $arg2)
    };
}

/// Returns `(|z|, arg(z))` with the angle in degrees.
pub fn polar_deg(z: Complex64) -> (f64, f64) {
    (z.norm(), z.arg().to_degrees())
}

/// True if both parts of `z` are finite.
pub(crate) fn is_finite(z: Complex64) -> bool {
    z.re.is_finite() && z.im.is_finite()
}
