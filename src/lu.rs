use crate::traits::{Factorization, LinearSolver};
use rsparse::data::{Nmrc, Numeric, Sprs, Symb};
use rsparse::{lsolve, lu, sqr, usolve};
use sparsetools::csc::CSC;

/// Sparse LU decomposition with partial pivoting from the `rsparse` crate.
#[derive(Default)]
pub struct RSparseLU {}

/// LU factors of a square matrix, `P A Q = L U`.
pub struct RSparseFactors {
    n: usize,
    symbolic: Symb,
    numeric: Nmrc<f64>,
}

impl LinearSolver for RSparseLU {
    fn factor(&self, a_mat: &CSC<usize, f64>) -> Result<Box<dyn Factorization>, String> {
        let n = a_mat.cols();
        if a_mat.rows() != n {
            return Err(format!(
                "matrix must be square ({}x{})",
                a_mat.rows(),
                a_mat.cols()
            ));
        }

        let a = Sprs {
            m: n,
            n,
            p: a_mat.colptr().iter().map(|&p| p as isize).collect(),
            i: a_mat.rowidx().to_vec(),
            x: a_mat.values().to_vec(),
            nzmax: a_mat.values().len(),
        };

        let mut symbolic = sqr(&a, 1, false);
        let numeric = lu(&a, &mut symbolic, 1.0)
            .map_err(|err| format!("LU factorization failed: {:?}", err))?;

        // diagonal of each column of U is stored last
        for k in 0..n {
            let (p0, p1) = (numeric.u.p[k], numeric.u.p[k + 1]);
            let pivot = if p1 > p0 {
                numeric.u.x[p1 as usize - 1]
            } else {
                0.0
            };
            if pivot == 0.0 || !pivot.is_finite() {
                return Err(format!("matrix is singular (zero pivot in column {})", k));
            }
        }

        Ok(Box::new(RSparseFactors {
            n,
            symbolic,
            numeric,
        }))
    }
}

impl Factorization for RSparseFactors {
    fn solve(&self, b: &mut [f64]) -> Result<(), String> {
        if b.len() != self.n {
            return Err(format!(
                "rhs length {} does not match matrix order {}",
                b.len(),
                self.n
            ));
        }
        let mut x = vec![0.0; self.n];

        ipvec(&self.numeric.pinv, b, &mut x); // x = P*b
        lsolve(&self.numeric.l, &mut x); // x = L\x
        usolve(&self.numeric.u, &mut x); // x = U\x
        ipvec(&self.symbolic.q, &x, b); // b = Q*x

        Ok(())
    }
}

fn ipvec<T: Numeric<T>>(p: &Option<Vec<isize>>, b: &[T], x: &mut [T]) {
    match p {
        Some(p) => {
            for k in 0..b.len() {
                x[p[k] as usize] = b[k];
            }
        }
        None => x.copy_from_slice(b),
    }
}
