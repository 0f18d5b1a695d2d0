use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use relaxation::{verify, Config, Engine, Grid, Outcome};




#[derive(Debug, Parser)]
#[clap(version = "1.0", author = "J. Zrake <jzrake@clemson.edu>")]

/**
 * Relax a random square grid to the steady state of the Laplace equation.
 */
struct Opts {
    /// Grid dimension (number of rows and columns)
    #[clap(short = 'n', long, default_value = "100")]
    size: usize,

    /// Number of worker threads (at most one per column is used)
    #[clap(short = 'p', long, default_value = "8")]
    workers: usize,

    /// Largest change of any cell for an iteration to count as converged
    #[clap(short = 'e', long, default_value = "0.01")]
    precision: f64,

    /// Seed for the random initial grid
    #[clap(long, default_value = "0")]
    seed: u64,

    /// Print the relaxed grid
    #[clap(long)]
    print: bool,

    /// Check the relaxed grid against the stencil equation and report
    #[clap(long)]
    succ: bool,

    /// Like --succ, and also print the pass/fail matrix
    #[clap(long)]
    err: bool,

    /// Pin each worker thread to a CPU core
    #[clap(long)]
    pin: bool,

    /// Write the outcome to this file as CBOR
    #[clap(short = 'o', long)]
    output: Option<String>,

    /// Log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}




// ============================================================================
fn main() {
    let opts = Opts::parse();

    SimpleLogger::new()
        .with_level(if opts.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .init()
        .unwrap();

    if let Err(e) = run(&opts) {
        error!("{}", e);
        std::process::exit(1);
    }
}




// ============================================================================
fn run(opts: &Opts) -> Result<(), Box<dyn std::error::Error>> {
    info!("{:?}", opts);

    let seed = Grid::random(opts.size, opts.seed)?;
    let config = Config::default()
        .with_workers(opts.workers)
        .with_precision(opts.precision)
        .with_pinned_workers(opts.pin);
    let engine = Engine::new(config)?;

    let start = std::time::Instant::now();
    let outcome = engine.run(&seed)?;
    info!("time taken {:.3}ms", start.elapsed().as_secs_f64() * 1e3);

    if opts.print {
        print_grid(&outcome.grid);
    }

    if opts.succ || opts.err {
        report(&seed, &outcome, opts.precision, opts.err)?;
    }

    if let Some(path) = &opts.output {
        let file = std::fs::File::create(path)?;
        let mut buffer = std::io::BufWriter::new(file);
        ciborium::ser::into_writer(&outcome, &mut buffer)?;
        info!("wrote {}", path);
    }
    Ok(())
}

fn print_grid(grid: &Grid) {
    for row in grid.rows() {
        let line: Vec<_> = row.iter().map(|x| format!("{:.6}", x)).collect();
        println!("{}", line.join(" "));
    }
}

fn report(seed: &Grid, outcome: &Outcome, precision: f64, matrix: bool) -> relaxation::Result<()> {
    let check = verify(seed, &outcome.grid, precision)?;

    for failure in &check.failures {
        println!("failed at [{}][{}] with difference {:.6}", failure.row, failure.col, failure.difference);
    }
    println!("success: {}", check.successful as u8);

    if matrix {
        for row in check.passed.chunks(check.n) {
            let line: Vec<_> = row.iter().map(|&ok| if ok { "1" } else { "0" }).collect();
            println!("{}", line.join(" "));
        }
    }
    Ok(())
}
