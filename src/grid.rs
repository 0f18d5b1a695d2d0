use std::convert::TryFrom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "GridData")]

/**
 * A square array of real numbers, stored in row-major order. The outermost
 * rows and columns are the boundary condition of the relaxation problem:
 * they are read but never written by the engine. The dimension is fixed when
 * the grid is created.
 */
pub struct Grid {
    n: usize,
    data: Vec<f64>,
}




/**
 * Unchecked serialized form of a `Grid`; deserialization goes through
 * `Grid::from_vec`.
 */
#[derive(serde::Deserialize)]
struct GridData {
    n: usize,
    data: Vec<f64>,
}

impl TryFrom<GridData> for Grid {
    type Error = Error;

    fn try_from(raw: GridData) -> Result<Self> {
        Grid::from_vec(raw.n, raw.data)
    }
}




// ============================================================================
impl Grid {




    /**
     * Generate an `n x n` grid with values defined from a closure of the
     * `(row, col)` index.
     */
    pub fn from_function<F>(n: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> f64
    {
        Self::validate_dim(n)?;
        Ok(Self {
            n,
            data: (0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| f(i, j)).collect(),
        })
    }




    /**
     * Build a grid from a vector of rows. Every row must have as many
     * entries as there are rows.
     */
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();

        if let Some(row) = rows.iter().find(|row| row.len() != n) {
            return Err(Error::NotSquare { rows: n, cols: row.len() });
        }
        Self::validate_dim(n)?;

        Ok(Self {
            n,
            data: rows.into_iter().flatten().collect(),
        })
    }




    /**
     * Build a grid from row-major data of length `n * n`.
     */
    pub fn from_vec(n: usize, data: Vec<f64>) -> Result<Self> {
        Self::validate_dim(n)?;

        if data.len() != n * n {
            return Err(Error::NotSquare { rows: n, cols: data.len() / n });
        }
        Ok(Self { n, data })
    }




    /**
     * Generate a reproducible grid of whole numbers drawn uniformly from
     * `10..=48`.
     */
    pub fn random(n: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::validate_dim(n)?;
        Ok(Self {
            n,
            data: (0..n * n).map(|_| f64::from(rng.gen_range(10u8..49))).collect(),
        })
    }




    /**
     * Return the number of rows (equal to the number of columns).
     */
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }




    /**
     * Return an iterator over the rows of the grid, each as a slice.
     */
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks(self.n)
    }




    /**
     * Determine whether the given index lies on the boundary of the grid.
     */
    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.n - 1 || col == self.n - 1
    }




    /**
     * Return the average of the four neighbors of an interior cell.
     */
    pub fn neighbor_average(&self, row: usize, col: usize) -> f64 {
        (self.get(row + 1, col) + self.get(row - 1, col) + self.get(row, col + 1) + self.get(row, col - 1)) / 4.0
    }

    pub(crate) fn from_raw(n: usize, data: Vec<f64>) -> Self {
        Self { n, data }
    }

    fn validate_dim(n: usize) -> Result<()> {
        if n < 2 {
            Err(Error::GridTooSmall(n))
        } else {
            Ok(())
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Grid;
    use crate::error::Error;

    #[test]
    fn grid_from_function_is_row_major() {
        let grid = Grid::from_function(3, |i, j| (i * 10 + j) as f64).unwrap();
        assert_eq!(grid.dim(), 3);
        assert_eq!(grid.get(1, 2), 12.0);
        assert_eq!(grid.as_slice()[5], 12.0);
        assert_eq!(grid.rows().nth(2).unwrap(), &[20.0, 21.0, 22.0]);
    }

    #[test]
    fn ragged_or_tiny_grids_are_rejected() {
        assert!(matches!(Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]), Err(Error::NotSquare { rows: 2, cols: 1 })));
        assert!(matches!(Grid::from_rows(vec![vec![1.0]]), Err(Error::GridTooSmall(1))));
        assert!(matches!(Grid::from_vec(3, vec![0.0; 8]), Err(Error::NotSquare { .. })));
        assert!(matches!(Grid::random(0, 1), Err(Error::GridTooSmall(0))));
    }

    #[test]
    fn random_grid_is_reproducible_and_in_range() {
        let a = Grid::random(16, 42).unwrap();
        let b = Grid::random(16, 42).unwrap();
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|&x| x >= 10.0 && x <= 48.0 && x.fract() == 0.0));
    }

    #[test]
    fn border_cells_are_identified() {
        let grid = Grid::from_function(4, |_, _| 0.0).unwrap();
        assert!(grid.is_border(0, 2));
        assert!(grid.is_border(2, 3));
        assert!(!grid.is_border(1, 2));
        assert!(!grid.is_border(2, 1));
    }

    #[test]
    fn neighbor_average_uses_the_plus_stencil() {
        let grid = Grid::from_function(3, |i, j| (i * 3 + j) as f64).unwrap();
        assert_eq!(grid.neighbor_average(1, 1), (7.0 + 1.0 + 5.0 + 3.0) / 4.0);
    }

    #[test]
    fn deserialization_validates_the_shape() {
        let good = Grid::random(4, 3).unwrap();
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&good, &mut bytes).unwrap();
        let decoded: Grid = ciborium::de::from_reader(&bytes[..]).unwrap();
        assert_eq!(decoded, good);

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&Grid::from_raw(6, vec![0.0; 34]), &mut bytes).unwrap();
        assert!(ciborium::de::from_reader::<Grid, _>(&bytes[..]).is_err());

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&Grid::from_raw(1, vec![0.0]), &mut bytes).unwrap();
        assert!(ciborium::de::from_reader::<Grid, _>(&bytes[..]).is_err());
    }
}
