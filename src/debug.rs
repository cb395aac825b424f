use crate::math::polar_deg;
use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

fn format_rect(z: &Complex64) -> String {
    format!(
        "{}{}j{}",
        dtoa(z.re, FLOAT_CONFIG),
        if z.im.is_sign_negative() { "-" } else { "+" },
        dtoa(z.im.abs(), FLOAT_CONFIG)
    )
}

/// Formats a coefficient column or voltage profile in rectangular form.
pub fn format_rect_vec(v: &[Complex64]) -> String {
    let a: Vec<String> = v.iter().map(format_rect).collect();
    format!("[{}]", a.join(", "))
}

fn format_polar(z: &Complex64) -> String {
    let (vm, va) = polar_deg(*z);
    format!(
        "{}\u{2220}{}\u{00B0}",
        dtoa(vm, FLOAT_CONFIG),
        dtoa(va, FLOAT_CONFIG)
    )
}

/// Formats a voltage profile as magnitude and angle in degrees.
pub fn format_polar_vec(v: &[Complex64]) -> String {
    let a: Vec<String> = v.iter().map(format_polar).collect();
    format!("[{}]", a.join(", "))
}
