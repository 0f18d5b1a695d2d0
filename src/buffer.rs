use std::sync::atomic::{AtomicU64, Ordering};
use crate::grid::Grid;




/**
 * One of the two grids in a buffer pair. Cells hold the bit pattern of an
 * `f64`, so that any worker may read or write any cell through a shared
 * reference. Workers write disjoint columns, and every phase of an iteration
 * is separated by a barrier rendezvous, so relaxed loads and stores are
 * enough: the barrier provides the happens-before edges.
 */
struct SharedGrid {
    data: Vec<AtomicU64>,
}

impl SharedGrid {
    fn from_grid(grid: &Grid) -> Self {
        Self {
            data: grid.as_slice().iter().map(|x| AtomicU64::new(x.to_bits())).collect(),
        }
    }
}




#[derive(Clone, Copy, Debug, PartialEq, Eq)]

/**
 * Tag identifying which buffer of a pair is currently the source (read
 * from) and which is the target (written to). Swapping the roles is a flip
 * of the tag; no cell data moves.
 */
pub struct Roles {
    source: usize,
}

impl Roles {
    /// Buffer 0 is the source on the first iteration.
    pub fn initial() -> Self {
        Self { source: 0 }
    }

    /// The roles after the given number of iterations (each swaps once).
    pub fn after(iterations: u64) -> Self {
        Self { source: (iterations % 2) as usize }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub fn target(&self) -> usize {
        1 - self.source
    }

    pub fn swap(&mut self) {
        self.source = 1 - self.source
    }
}




/**
 * Two equally shaped grids, both seeded with the same values. The pair is
 * shared by all workers; which grid is read and which is written is decided
 * by the `Roles` the caller passes in.
 */
pub struct BufferPair {
    n: usize,
    grids: [SharedGrid; 2],
}




// ============================================================================
impl BufferPair {

    pub fn new(seed: &Grid) -> Self {
        Self {
            n: seed.dim(),
            grids: [SharedGrid::from_grid(seed), SharedGrid::from_grid(seed)],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /**
     * Read a cell of the current source grid.
     */
    pub fn read(&self, roles: Roles, row: usize, col: usize) -> f64 {
        f64::from_bits(self.grids[roles.source()].data[row * self.n + col].load(Ordering::Relaxed))
    }

    /**
     * Write a cell of the current target grid.
     */
    pub fn write(&self, roles: Roles, row: usize, col: usize, value: f64) {
        self.grids[roles.target()].data[row * self.n + col].store(value.to_bits(), Ordering::Relaxed)
    }

    /**
     * Copy the current source grid out into an owned `Grid`. Must not be
     * called while workers are writing.
     */
    pub fn snapshot(&self, roles: Roles) -> Grid {
        let data = self.grids[roles.source()]
            .data
            .iter()
            .map(|x| f64::from_bits(x.load(Ordering::Relaxed)))
            .collect();
        Grid::from_raw(self.n, data)
    }
}
