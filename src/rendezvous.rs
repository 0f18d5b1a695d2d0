use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;
use log::trace;




#[derive(Clone, Copy, Debug, PartialEq, Eq)]

/**
 * The three rendezvous points of one relaxation iteration, in the order the
 * workers reach them.
 *
 * - `Prelude`: every worker has finished reading the previous iteration's
 *   convergence flag, so it is safe to reset it.
 * - `Reset`: every worker has reset the flag and the leftover claim, so it
 *   is safe to start relaxing (and downgrading the flag).
 * - `Postlude`: every worker has written its columns and swapped its buffer
 *   roles, so the flag is final for the iteration.
 */
pub enum Phase {
    Prelude,
    Reset,
    Postlude,
}

impl fmt::Display for Phase {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prelude => write!(fmt, "prelude"),
            Phase::Reset => write!(fmt, "reset"),
            Phase::Postlude => write!(fmt, "postlude"),
        }
    }
}




#[derive(Clone, Copy, Debug, PartialEq, Eq)]

/**
 * Returned from `Rendezvous::wait` once a participant has given up on the
 * rendezvous; the remaining participants can no longer all meet.
 */
pub struct Abandoned;




struct BarrierState {
    arrived: usize,
    generation: u64,
    abandoned: bool,
}




/**
 * A reusable barrier with a fixed number of participants, used by all the
 * workers of a run for each of the three phases of every iteration. Unlike
 * `std::sync::Barrier`, it can be abandoned: a participant that panics
 * releases everyone blocked in it, instead of leaving them waiting for an
 * arrival that will never happen.
 */
pub struct Rendezvous {
    state: Mutex<BarrierState>,
    changed: Condvar,
    participants: usize,
}

impl Rendezvous {

    pub fn new(participants: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState { arrived: 0, generation: 0, abandoned: false }),
            changed: Condvar::new(),
            participants,
        }
    }

    pub fn participants(&self) -> usize {
        self.participants
    }




    /**
     * Block until all participants have reached this phase. Returns
     * `Ok(true)` on exactly one of the participants (the leader of this
     * rendezvous), and `Err(Abandoned)` on every participant once the
     * rendezvous has been abandoned.
     */
    pub fn wait(&self, phase: Phase) -> Result<bool, Abandoned> {
        let mut state = self.lock();

        if state.abandoned {
            return Err(Abandoned);
        }

        let generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.participants {
            state.arrived = 0;
            state.generation += 1;
            drop(state);
            self.changed.notify_all();
            trace!("all {} workers passed {}", self.participants, phase);
            return Ok(true);
        }

        while state.generation == generation && !state.abandoned {
            state = self.changed.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        if state.generation == generation {
            Err(Abandoned)
        } else {
            Ok(false)
        }
    }




    /**
     * Release every participant blocked in this rendezvous, now and in the
     * future, with `Err(Abandoned)`.
     */
    pub fn abandon(&self) {
        self.lock().abandoned = true;
        self.changed.notify_all();
    }




    /**
     * Return a guard that abandons the rendezvous if it is dropped while the
     * current thread is panicking.
     */
    pub fn abandon_on_panic(&self) -> AbandonOnPanic<'_> {
        AbandonOnPanic { rendezvous: self }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}




pub struct AbandonOnPanic<'a> {
    rendezvous: &'a Rendezvous,
}

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.rendezvous.abandon();
        }
    }
}




#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Aborted,
}




/**
 * One-shot gate that holds spawned workers back until the driver knows the
 * whole pool exists. If any spawn fails, the gate is aborted and the workers
 * already running exit without entering the rendezvous, which could
 * otherwise never fill.
 */
pub struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl StartGate {

    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Closed),
            changed: Condvar::new(),
        }
    }

    pub fn open(&self) {
        self.set(GateState::Open)
    }

    pub fn abort(&self) {
        self.set(GateState::Aborted)
    }




    /**
     * Block until the gate is opened or aborted. Returns `true` if the
     * caller should proceed.
     */
    pub fn pass(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        while *state == GateState::Closed {
            state = self.changed.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *state == GateState::Open
    }

    fn set(&self, new_state: GateState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = new_state;
        self.changed.notify_all();
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use super::{Abandoned, Phase, Rendezvous, StartGate};

    #[test]
    fn exactly_one_leader_per_rendezvous() {
        let rendezvous = Arc::new(Rendezvous::new(4));
        let leaders = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rendezvous = rendezvous.clone();
                let leaders = leaders.clone();
                thread::spawn(move || {
                    for phase in [Phase::Prelude, Phase::Reset, Phase::Postlude].iter() {
                        if rendezvous.wait(*phase).unwrap() {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(leaders.load(Ordering::SeqCst), 3);
        assert_eq!(rendezvous.participants(), 4);
    }

    #[test]
    fn no_worker_passes_a_phase_early() {
        let num_threads = 6;
        let rendezvous = Arc::new(Rendezvous::new(num_threads));
        let arrived = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let rendezvous = rendezvous.clone();
                let arrived = arrived.clone();
                thread::spawn(move || {
                    for round in 1..=20 {
                        arrived.fetch_add(1, Ordering::SeqCst);
                        rendezvous.wait(Phase::Reset).unwrap();
                        assert!(arrived.load(Ordering::SeqCst) >= round * num_threads);
                        rendezvous.wait(Phase::Postlude).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn panicking_participant_releases_its_peers() {
        let rendezvous = Arc::new(Rendezvous::new(3));

        let peers: Vec<_> = (0..2)
            .map(|_| {
                let rendezvous = rendezvous.clone();
                thread::spawn(move || {
                    rendezvous.wait(Phase::Prelude)?;
                    rendezvous.wait(Phase::Reset)
                })
            })
            .collect();

        let failing = {
            let rendezvous = rendezvous.clone();
            thread::spawn(move || {
                let _guard = rendezvous.abandon_on_panic();
                rendezvous.wait(Phase::Prelude).unwrap();
                panic!("worker failed between phases");
            })
        };

        assert!(failing.join().is_err());
        for peer in peers {
            assert_eq!(peer.join().unwrap(), Err(Abandoned));
        }
        assert_eq!(rendezvous.wait(Phase::Postlude), Err(Abandoned));
    }

    #[test]
    fn guard_does_nothing_on_normal_exit() {
        let rendezvous = Rendezvous::new(1);
        drop(rendezvous.abandon_on_panic());
        assert_eq!(rendezvous.wait(Phase::Prelude), Ok(true));
    }

    #[test]
    fn gate_releases_waiters_when_opened_or_aborted() {
        for &open in [true, false].iter() {
            let gate = Arc::new(StartGate::new());
            let handles: Vec<_> = (0..3)
                .map(|_| {
                    let gate = gate.clone();
                    thread::spawn(move || gate.pass())
                })
                .collect();

            if open {
                gate.open()
            } else {
                gate.abort()
            }
            for handle in handles {
                assert_eq!(handle.join().unwrap(), open);
            }
        }
    }

    #[test]
    fn phases_have_readable_names() {
        assert_eq!(Phase::Prelude.to_string(), "prelude");
        assert_eq!(Phase::Postlude.to_string(), "postlude");
    }
}
