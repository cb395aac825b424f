use crate::math::is_finite;
use crate::pade::pade;
use crate::series::{Embedding, Series};
use crate::traits::Factorization;
use num_complex::Complex64;

/// Outcome of the series loop of one classification cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    /// Consecutive Padé approximants agree for every bus.
    Converged {
        coefficients: usize,
        v: Vec<Complex64>,
    },
    /// The coefficient limit was reached first, or the coefficients
    /// overflowed.
    Diverged { coefficients: usize },
}

/// Padé mismatch check across consecutive odd series lengths.
///
/// Magnitudes and angles (in radians) must each agree within `tol`.
/// Buses below `cursor` settled in an earlier check and are compared
/// against the value stored then. Buses from `cursor` onward are
/// compared against a fresh approximant of the shorter series.
#[derive(Debug, Clone)]
pub struct PadeCheck {
    tol: f64,
    first: bool,
    cursor: usize,
    profile: Vec<Complex64>,
}

impl PadeCheck {
    pub fn new(nb: usize, tol: f64) -> Self {
        Self {
            tol,
            first: true,
            cursor: 0,
            profile: vec![Complex64::default(); nb],
        }
    }

    pub fn reset(&mut self) {
        self.first = true;
        self.cursor = 0;
        self.profile.fill(Complex64::default());
    }

    /// Index of the first bus not yet known to have settled.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Evaluated profile from the last check.
    pub fn profile(&self) -> &[Complex64] {
        &self.profile
    }

    fn differs(&self, a: Complex64, b: Complex64) -> bool {
        if !is_finite(a) || !is_finite(b) {
            return true;
        }
        let (vm_a, va_a) = a.to_polar();
        let (vm_b, va_b) = b.to_polar();
        (vm_a - vm_b).abs() > self.tol || (va_a - va_b).abs() > self.tol
    }

    /// Evaluates approximants of the series of every bus and returns true
    /// if they have all settled. The series length must be odd.
    pub fn check(&mut self, series: &Series) -> bool {
        let len = series.len();
        let nb = self.profile.len();

        let start = if self.first {
            self.first = false;
            0
        } else {
            for i in 0..self.cursor {
                let prev = self.profile[i];
                self.profile[i] = pade(series.v(i));
                if self.differs(prev, self.profile[i]) {
                    self.cursor = i + 1;
                    return false;
                }
            }
            self.cursor
        };

        for i in start..nb {
            let v = series.v(i);
            let prev = pade(&v[..len - 2]);
            self.profile[i] = pade(v);
            if self.differs(prev, self.profile[i]) {
                self.cursor = i + 1;
                return false;
            }
        }
        true
    }
}

/// Extends the series order by order until the Padé check succeeds or
/// the series is full.
///
/// The check runs on odd lengths above three. A series whose
/// coefficients overflow is reported as diverged. `series` and `check` must
/// be reset by the caller at the start of every cycle.
pub fn helm_series(
    emb: &Embedding,
    lu: &dyn Factorization,
    series: &mut Series,
    check: &mut PadeCheck,
) -> Result<SeriesOutcome, String> {
    loop {
        let len = series.next_order(emb, lu)?;

        if !series.is_finite() {
            log::debug!("series overflowed at {} coefficients", len);
            return Ok(SeriesOutcome::Diverged { coefficients: len });
        }

        if len % 2 == 1 && len > 3 {
            if check.check(series) {
                log::debug!("series converged with {} coefficients", len);
                return Ok(SeriesOutcome::Converged {
                    coefficients: len,
                    v: check.profile().to_vec(),
                });
            }
            log::trace!("{} coefficients, bus {} not settled", len, check.cursor());
        }

        if series.is_full() {
            return Ok(SeriesOutcome::Diverged { coefficients: len });
        }
    }
}
