//! Relaxation is a multi-threaded solver for the steady state of a discrete
//! Laplace problem on a square grid: every interior cell converges to the
//! average of its four neighbors, with the border cells held fixed as the
//! boundary condition. It uses pure Jacobi iteration over a pair of buffers
//! whose roles alternate each iteration. A fixed pool of worker threads, each
//! statically owning a block of columns (with one leftover block claimed
//! by a single worker per iteration), steps in lockstep through a three-phase
//! barrier rendezvous until an iteration passes in which no cell moves by
//! more than the requested precision.

pub mod buffer;
pub mod engine;
pub mod error;
pub mod flags;
pub mod grid;
pub mod kernel;
pub mod partition;
pub mod rendezvous;
pub mod verify;

pub use engine::{run, Config, Engine, Outcome, WorkerReport};
pub use error::{Error, Result};
pub use grid::Grid;
pub use verify::{verify, Verification};
