use std::io;
use std::ops::Range;
use std::sync::Arc;
use std::thread;
use log::{debug, error, info, warn};
use crate::buffer::{BufferPair, Roles};
use crate::error::{Error, Result};
use crate::flags::{ConvergenceFlag, LeftoverClaim};
use crate::grid::Grid;
use crate::kernel::relax_columns;
use crate::partition::Partition;
use crate::rendezvous::{Phase, Rendezvous, StartGate};




#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]

/**
 * Parameters of a relaxation run. The defaults are 8 workers and a
 * precision of 0.01, without pinning workers to cores.
 */
pub struct Config {
    pub workers: usize,
    pub precision: f64,
    pub pin_workers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 8,
            precision: 0.01,
            pin_workers: false,
        }
    }
}

impl Config {
    pub fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }

    pub fn with_precision(self, precision: f64) -> Self {
        Self { precision, ..self }
    }

    pub fn with_pinned_workers(self, pin_workers: bool) -> Self {
        Self { pin_workers, ..self }
    }
}




#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]

/**
 * What a single worker did over the course of a run.
 */
pub struct WorkerReport {
    pub id: usize,
    pub columns: Range<usize>,
    pub iterations: u64,
    /// Number of iterations in which this worker relaxed the leftover block.
    pub claims: u64,
    /// Interior columns relaxed, summed over all iterations.
    pub columns_processed: u64,
}




#[derive(Clone, Debug, serde::Serialize)]

/**
 * The result of a relaxation run: the final grid (the source buffer after
 * the last swap), and the number of iterations the workers went through.
 */
pub struct Outcome {
    pub grid: Grid,
    pub iterations: u64,
    pub workers: usize,
    pub reports: Vec<WorkerReport>,
}




type Job = Box<dyn FnOnce() -> Option<WorkerReport> + Send + 'static>;




/**
 * State shared by all the workers of a run.
 */
struct Shared {
    buffers: BufferPair,
    partition: Partition,
    precision: f64,
    convergence: ConvergenceFlag,
    claim: LeftoverClaim,
    rendezvous: Rendezvous,
    gate: StartGate,
}

impl Shared {
    fn new(seed: &Grid, partition: Partition, precision: f64) -> Self {
        Self {
            buffers: BufferPair::new(seed),
            rendezvous: Rendezvous::new(partition.num_workers()),
            partition,
            precision,
            convergence: ConvergenceFlag::new(),
            claim: LeftoverClaim::new(),
            gate: StartGate::new(),
        }
    }
}




/**
 * Multi-threaded Jacobi relaxation engine. A fixed pool of worker threads is
 * spawned for each run, stepping in lockstep through a three-phase
 * rendezvous until an iteration completes in which no cell moved by more
 * than the precision. There is no iteration cap: a problem that never
 * settles keeps the workers running.
 */
pub struct Engine {
    config: Config,
}




// ============================================================================
impl Engine {

    pub fn new(config: Config) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::NoWorkers);
        }
        if !config.precision.is_finite() || config.precision < 0.0 {
            return Err(Error::InvalidPrecision(config.precision));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }




    /**
     * Return the number of workers that will actually run on an `n x n`
     * grid: there is no use for more workers than columns.
     */
    pub fn effective_workers(&self, n: usize) -> usize {
        self.config.workers.min(n)
    }




    /**
     * Relax the seed grid to its steady state. Blocks until all workers have
     * agreed on convergence and exited.
     */
    pub fn run(&self, seed: &Grid) -> Result<Outcome> {
        self.run_with_spawner(seed, |_, builder, job| builder.spawn(job))
    }




    /**
     * Like `run`, but each worker thread is started through the given
     * spawner, which is passed the worker id, a configured thread builder,
     * and the job the thread must run.
     */
    fn run_with_spawner<S>(&self, seed: &Grid, mut spawner: S) -> Result<Outcome>
    where
        S: FnMut(usize, thread::Builder, Job) -> io::Result<thread::JoinHandle<Option<WorkerReport>>>
    {
        let n = seed.dim();
        let p = self.effective_workers(n);

        if seed.as_slice().len() != n * n {
            return Err(Error::NotSquare { rows: n, cols: seed.as_slice().len() / n });
        }
        if p < self.config.workers {
            warn!("{} workers requested for {} columns, using {}", self.config.workers, n, p);
        }

        let partition = Partition::new(n, p);

        info!(
            "relaxing {}x{} grid with {} workers ({} columns each, {} leftover), precision {}",
            n, n, p, partition.width(), partition.leftover_len(), self.config.precision);

        let shared = Arc::new(Shared::new(seed, partition, self.config.precision));

        let cores = if self.config.pin_workers {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut handles = Vec::with_capacity(p);

        for id in 0..p {
            let worker_shared = shared.clone();
            let core_id = if cores.is_empty() { None } else { cores.get(id % cores.len()).cloned() };
            let builder = thread::Builder::new().name(format!("relax-worker-{}", id));

            let job: Job = Box::new(move || {
                if let Some(core_id) = core_id {
                    core_affinity::set_for_current(core_id);
                }
                worker_main(id, &worker_shared)
            });

            match spawner(id, builder, job) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    error!("failed to spawn worker {} of {}: {}", id, p, source);
                    shared.gate.abort();
                    join_all(handles)?;
                    return Err(Error::Spawn { worker: id, source });
                }
            }
        }

        debug!("all {} workers spawned", p);
        shared.gate.open();

        let reports: Vec<WorkerReport> = join_all(handles)?.into_iter().flatten().collect();
        let iterations = reports.first().map_or(0, |report| report.iterations);
        let grid = shared.buffers.snapshot(Roles::after(iterations));

        info!("converged after {} iterations", iterations);

        Ok(Outcome {
            grid,
            iterations,
            workers: p,
            reports,
        })
    }
}




/**
 * Relax the seed grid with `workers` threads (clamped to the grid dimension)
 * until no cell moves by more than `precision` in an iteration.
 */
pub fn run(seed: &Grid, workers: usize, precision: f64) -> Result<Outcome> {
    Engine::new(Config::default().with_workers(workers).with_precision(precision))?.run(seed)
}




// ============================================================================
fn join_all(handles: Vec<thread::JoinHandle<Option<WorkerReport>>>) -> Result<Vec<Option<WorkerReport>>> {
    let mut reports = Vec::with_capacity(handles.len());
    let mut panicked = None;

    for (id, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(_) => {
                error!("worker {} panicked", id);
                panicked = panicked.or(Some(id));
            }
        }
    }
    match panicked {
        Some(id) => Err(Error::WorkerPanicked(id)),
        None => Ok(reports),
    }
}




/**
 * Entry point of a worker thread. A panic anywhere in the worker abandons
 * the rendezvous, so the other workers return instead of waiting for it.
 */
fn worker_main(id: usize, shared: &Shared) -> Option<WorkerReport> {
    let _guard = shared.rendezvous.abandon_on_panic();
    work(id, shared)
}




/**
 * The worker loop. Returns `None` if the start gate was aborted before the
 * first iteration, or if another worker abandoned the rendezvous.
 */
fn work(id: usize, shared: &Shared) -> Option<WorkerReport> {
    if !shared.gate.pass() {
        debug!("worker {} exiting: start aborted", id);
        return None;
    }

    let columns = shared.partition.interior_columns(id);
    let leftover = shared.partition.leftover();
    let mut roles = Roles::initial();
    let mut iterations = 0;
    let mut claims = 0;
    let mut columns_processed = 0;

    debug!("worker {} started on columns {:?}", id, shared.partition.columns(id));

    loop {
        shared.rendezvous.wait(Phase::Prelude).ok()?;
        shared.convergence.reset();
        shared.claim.reset();
        shared.rendezvous.wait(Phase::Reset).ok()?;

        columns_processed += relax_columns(
            &shared.buffers,
            roles,
            columns.clone(),
            shared.precision,
            &shared.convergence) as u64;

        if let Some(leftover) = &leftover {
            if LeftoverClaim::claimed(shared.claim.try_claim()) {
                columns_processed += relax_columns(
                    &shared.buffers,
                    roles,
                    leftover.clone(),
                    shared.precision,
                    &shared.convergence) as u64;
                claims += 1;
            }
        }

        roles.swap();
        iterations += 1;
        shared.rendezvous.wait(Phase::Postlude).ok()?;

        if shared.convergence.is_converged() {
            break;
        }
    }

    debug!("worker {} finished after {} iterations ({} leftover claims)", id, iterations, claims);

    Some(WorkerReport {
        id,
        columns: shared.partition.columns(id),
        iterations,
        claims,
        columns_processed,
    })
}
