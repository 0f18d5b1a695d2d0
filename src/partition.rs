use core::ops::Range;




#[derive(Clone, Debug, PartialEq, Eq)]

/**
 * Assignment of grid columns to `p` workers. Worker `i` statically owns the
 * columns `[w * i, w * (i + 1))` where `w = n / p`. The range may include the
 * border columns 0 and `n - 1`; those are skipped by the kernel rather than
 * excluded here. The `r = n - w * p - 1` interior columns left over by the
 * static split form a single block `[n - r - 1, n - 1)`, which is claimed by
 * exactly one worker per iteration.
 */
pub struct Partition {
    n: usize,
    p: usize,
    width: usize,
    leftover: usize,
}




// ============================================================================
impl Partition {




    /**
     * Create a partition of `n` columns over `p` workers. The caller must
     * ensure `1 <= p <= n`.
     */
    pub fn new(n: usize, p: usize) -> Self {
        assert!(p >= 1 && p <= n, "partition requires 1 <= p <= n (got n={} p={})", n, p);
        let width = n / p;
        Self {
            n,
            p,
            width,
            leftover: (n - width * p).saturating_sub(1),
        }
    }

    pub fn num_workers(&self) -> usize {
        self.p
    }

    /**
     * Return the number of columns in each worker's static range.
     */
    pub fn width(&self) -> usize {
        self.width
    }

    /**
     * Return the number of leftover interior columns, `r`.
     */
    pub fn leftover_len(&self) -> usize {
        self.leftover
    }




    /**
     * Return the static column range owned by the given worker.
     */
    pub fn columns(&self, worker: usize) -> Range<usize> {
        self.width * worker..self.width * (worker + 1)
    }




    /**
     * Return the columns of the worker's static range that are actually
     * relaxed: the static range with the border columns removed. May be
     * empty.
     */
    pub fn interior_columns(&self, worker: usize) -> Range<usize> {
        let Range { start, end } = self.columns(worker);
        let start = start.max(1);
        let end = end.min(self.n - 1);
        start..end.max(start)
    }




    /**
     * Return the leftover column block, if the static split leaves any
     * interior columns unassigned.
     */
    pub fn leftover(&self) -> Option<Range<usize>> {
        if self.leftover > 0 {
            Some(self.n - self.leftover - 1..self.n - 1)
        } else {
            None
        }
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Partition;

    /// Every interior column is covered exactly once by the static ranges
    /// together with the leftover block.
    fn assert_exact_cover(n: usize, p: usize) {
        let partition = Partition::new(n, p);
        let mut count = vec![0; n];

        for worker in 0..p {
            for col in partition.interior_columns(worker) {
                count[col] += 1;
            }
        }
        for col in partition.leftover().unwrap_or(0..0) {
            count[col] += 1;
        }
        assert_eq!(count[0], 0, "n={} p={}", n, p);
        assert_eq!(count[n - 1], 0, "n={} p={}", n, p);
        assert!(count[1..n - 1].iter().all(|&c| c == 1), "n={} p={} count={:?}", n, p, count);
    }

    #[test]
    fn even_split_has_no_leftover() {
        let partition = Partition::new(8, 4);
        assert_eq!(partition.width(), 2);
        assert_eq!(partition.leftover_len(), 0);
        assert_eq!(partition.leftover(), None);
        assert_eq!(partition.columns(3), 6..8);
        assert_eq!(partition.interior_columns(3), 6..7);
        assert_eq!(partition.interior_columns(0), 1..2);
    }

    #[test]
    fn uneven_split_leaves_a_leftover_block() {
        let partition = Partition::new(5, 3);
        assert_eq!(partition.width(), 1);
        assert_eq!(partition.leftover_len(), 1);
        assert_eq!(partition.leftover(), Some(3..4));
        assert_eq!(partition.interior_columns(0), 1..1);
        assert_eq!(partition.interior_columns(2), 2..3);

        let partition = Partition::new(100, 8);
        assert_eq!(partition.leftover(), Some(96..99));
    }

    #[test]
    fn one_column_per_worker_when_p_equals_n() {
        let partition = Partition::new(6, 6);
        assert_eq!(partition.leftover(), None);
        assert!(partition.interior_columns(0).is_empty());
        assert!(partition.interior_columns(5).is_empty());
        assert_eq!(partition.interior_columns(3), 3..4);
    }

    #[test]
    fn smallest_grid_has_nothing_to_relax() {
        let partition = Partition::new(2, 1);
        assert!(partition.interior_columns(0).is_empty());
        assert_eq!(partition.leftover(), None);
    }

    #[test]
    fn static_and_leftover_columns_cover_the_interior_exactly() {
        for n in 2..40 {
            for p in 1..=n {
                assert_exact_cover(n, p);
            }
        }
    }

    #[test]
    #[should_panic]
    fn more_workers_than_columns_is_rejected() {
        Partition::new(3, 4);
    }
}
