use rayon::prelude::*;
use crate::error::{Error, Result};
use crate::grid::Grid;




#[derive(Clone, Debug, PartialEq, serde::Serialize)]

/**
 * An interior cell that does not satisfy the stencil equation. The
 * difference is signed: cell value minus the average of its neighbors.
 */
pub struct Failure {
    pub row: usize,
    pub col: usize,
    pub difference: f64,
}




#[derive(Clone, Debug, PartialEq, serde::Serialize)]

/**
 * Per-cell pass/fail report of a relaxed grid.
 */
pub struct Verification {
    pub n: usize,
    pub successful: bool,
    /// Row-major pass matrix.
    pub passed: Vec<bool>,
    pub failures: Vec<Failure>,
}

impl Verification {
    pub fn passed_at(&self, row: usize, col: usize) -> bool {
        self.passed[row * self.n + col]
    }
}




/**
 * Check a relaxed grid against its seed, independently of the engine's own
 * convergence test. Interior cells pass if they are within `precision` of
 * the average of their four neighbors; border cells pass if they are equal
 * to the seed. The check is successful only if every cell passes. Neither
 * grid is modified. The two grids must have the same dimension.
 */
pub fn verify(seed: &Grid, result: &Grid, precision: f64) -> Result<Verification> {
    if seed.dim() != result.dim() {
        return Err(Error::DimensionMismatch { seed: seed.dim(), result: result.dim() });
    }

    let n = result.dim();
    let rows: Vec<(Vec<bool>, Vec<Failure>)> = (0..n)
        .into_par_iter()
        .map(|row| {
            let mut passed = Vec::with_capacity(n);
            let mut failures = Vec::new();

            for col in 0..n {
                if result.is_border(row, col) {
                    passed.push(result.get(row, col) == seed.get(row, col));
                } else {
                    let difference = result.get(row, col) - result.neighbor_average(row, col);
                    let ok = difference.abs() <= precision;

                    if !ok {
                        failures.push(Failure { row, col, difference });
                    }
                    passed.push(ok);
                }
            }
            (passed, failures)
        })
        .collect();

    let mut passed = Vec::with_capacity(n * n);
    let mut failures = Vec::new();

    for (p, f) in rows {
        passed.extend(p);
        failures.extend(f);
    }

    Ok(Verification {
        n,
        successful: passed.iter().all(|&ok| ok),
        passed,
        failures,
    })
}
