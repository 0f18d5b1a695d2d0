use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]

/**
 * Error to represent an invalid relaxation problem, or a failure to bring up
 * the worker threads that solve it.
 */
pub enum Error {
    GridTooSmall(usize),
    NotSquare { rows: usize, cols: usize },
    NoWorkers,
    InvalidPrecision(f64),
    Spawn { worker: usize, source: io::Error },
    WorkerPanicked(usize),
    DimensionMismatch { seed: usize, result: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match self {
            GridTooSmall(n) => write!(fmt, "grid dimension must be at least 2, got {}", n),
            NotSquare { rows, cols } => write!(fmt, "grid must be square, got {} rows of {} columns", rows, cols),
            NoWorkers => write!(fmt, "at least one worker thread is required"),
            InvalidPrecision(e) => write!(fmt, "precision must be finite and non-negative, got {}", e),
            Spawn { worker, source } => write!(fmt, "failed to spawn worker {}: {}", worker, source),
            WorkerPanicked(worker) => write!(fmt, "worker {} panicked", worker),
            DimensionMismatch { seed, result } => write!(fmt, "seed grid is {0}x{0} but result grid is {1}x{1}", seed, result),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}
