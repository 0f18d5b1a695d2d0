use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;




/**
 * Process-wide convergence flag for one relaxation run. Every worker resets
 * it to "converged" at the top of an iteration, and any worker that sees a
 * cell change by more than the precision downgrades it. Within an iteration
 * the flag only ever moves from true to false, so concurrent writers can
 * only agree; ordering with respect to the reads is supplied by the barrier
 * rendezvous, and relaxed atomics suffice.
 */
#[derive(Debug)]
pub struct ConvergenceFlag {
    converged: AtomicBool,
}

impl ConvergenceFlag {
    /// Starts out converged, so the first rendezvous has nothing stale to
    /// wait on.
    pub fn new() -> Self {
        Self { converged: AtomicBool::new(true) }
    }

    pub fn reset(&self) {
        self.converged.store(true, Ordering::Relaxed)
    }

    pub fn downgrade(&self) {
        self.converged.store(false, Ordering::Relaxed)
    }

    pub fn is_converged(&self) -> bool {
        self.converged.load(Ordering::Relaxed)
    }
}

impl Default for ConvergenceFlag {
    fn default() -> Self {
        Self::new()
    }
}




/**
 * Counter deciding which worker relaxes the leftover column block in a given
 * iteration. It is reset to 1 at the top of every iteration; each worker
 * then takes one ticket, and only the worker that draws the 1 wins.
 */
#[derive(Debug)]
pub struct LeftoverClaim {
    counter: Mutex<i64>,
}

impl LeftoverClaim {
    pub fn new() -> Self {
        Self { counter: Mutex::new(1) }
    }

    pub fn reset(&self) {
        *self.lock() = 1
    }




    /**
     * Decrement the counter under the lock and return the value it held
     * before. Exactly one caller per reset sees a positive value; see
     * `LeftoverClaim::claimed`.
     */
    pub fn try_claim(&self) -> i64 {
        let mut counter = self.lock();
        let ticket = *counter;
        *counter -= 1;
        ticket
    }

    pub fn claimed(ticket: i64) -> bool {
        ticket > 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, i64> {
        // The critical section cannot leave the counter half-written, so a
        // poisoned guard is still consistent.
        self.counter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LeftoverClaim {
    fn default() -> Self {
        Self::new()
    }
}
