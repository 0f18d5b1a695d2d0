use core::ops::Range;
use crate::buffer::{BufferPair, Roles};
use crate::flags::ConvergenceFlag;




/**
 * Relax the given columns of the interior: each cell of the target buffer
 * becomes the average of its four neighbors in the source buffer. Border
 * columns and rows are never written, even if they fall inside `columns`.
 * The convergence flag is downgraded if any cell moves by more than
 * `precision`. Returns the number of interior columns relaxed.
 */
pub fn relax_columns(
    buffers: &BufferPair,
    roles: Roles,
    columns: Range<usize>,
    precision: f64,
    flag: &ConvergenceFlag) -> usize
{
    let n = buffers.dim();
    let mut relaxed = 0;

    for col in columns.filter(|&col| col != 0 && col != n - 1) {
        let mut moved = false;

        for row in 1..n - 1 {
            let value = (
                buffers.read(roles, row + 1, col) +
                buffers.read(roles, row - 1, col) +
                buffers.read(roles, row, col + 1) +
                buffers.read(roles, row, col - 1)) / 4.0;

            let previous = buffers.read(roles, row, col);
            buffers.write(roles, row, col, value);

            if (value - previous).abs() > precision {
                moved = true;
            }
        }
        if moved {
            flag.downgrade();
        }
        relaxed += 1;
    }
    relaxed
}
