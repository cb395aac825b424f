use sparsetools::csc::CSC;

/// Factorizes a square sparse matrix once so the factors can be reused
/// for many right-hand sides.
pub trait LinearSolver {
    fn factor(&self, a_mat: &CSC<usize, f64>) -> Result<Box<dyn Factorization>, String>;
}

/// Factors of a matrix produced by a [`LinearSolver`].
pub trait Factorization {
    /// Overwrites `b` with the solution `x` of `A x = b`.
    fn solve(&self, b: &mut [f64]) -> Result<(), String>;
}
