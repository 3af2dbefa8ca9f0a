use clap::Parser;
use ndarray::Array1;

use esopt_es::{EsConfigBuilder, EsDriver, EsVariant, FnObjective, OptimizationMode, run_recorded_es};
use esopt_testfunctions::by_name;

/// CLI arguments for running the ES optimizer on a benchmark function
#[derive(Parser)]
#[command(name = "run_es")]
#[command(about = "Run the evolution-strategy optimizer on a benchmark test function")]
struct Args {
    /// Test function to optimize (sphere, quadratic, rosenbrock, rastrigin, ackley, griewank)
    #[arg(short, long, default_value = "sphere")]
    function: String,

    /// Problem dimension
    #[arg(short, long, default_value = "5")]
    dim: usize,

    /// Algorithm variant (maes or lmmaes)
    #[arg(short, long, default_value = "maes")]
    variant: String,

    /// Optimization mode (minimize or maximize)
    #[arg(short, long, default_value = "minimize")]
    mode: String,

    /// Population size
    #[arg(short, long, default_value = "16")]
    population: usize,

    /// Evaluation batch size
    #[arg(short, long, default_value = "1")]
    batch: usize,

    /// Iteration budget
    #[arg(short = 'i', long, default_value = "500")]
    max_iteration: i64,

    /// Stopping threshold on the best score
    #[arg(short, long, default_value = "1e-10")]
    target: f64,

    /// Initial step size
    #[arg(short = 's', long, default_value = "1.0")]
    step: f64,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the best score after each iteration
    #[arg(long)]
    disp: bool,

    /// Record per-iteration progress as CSV into this directory
    #[arg(short, long)]
    record_dir: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let func = by_name(&args.function)
        .ok_or_else(|| format!("unknown test function: {}", args.function))?;
    let variant: EsVariant = args.variant.parse()?;
    let mode: OptimizationMode = args.mode.parse()?;

    let mut builder = EsConfigBuilder::new()
        .population_size(args.population)
        .evaluation_batch_size(args.batch)
        .initial_step_size(args.step)
        .mode(mode)
        .max_iteration(args.max_iteration)
        .target_value(args.target)
        .variant(variant)
        .disp(args.disp);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let config = builder.build();

    let report = match args.record_dir {
        Some(dir) => {
            let (report, csv_path) =
                run_recorded_es(&args.function, func, args.dim, config, &dir)?;
            eprintln!("recorded {} iterations to {}", report.nit, csv_path);
            report
        }
        None => {
            let mut driver = EsDriver::new(config);
            driver.run(
                FnObjective::new(args.dim, func),
                None,
                Some(Array1::zeros(args.dim)),
            )?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} ({}d, {}): f = {:.6e} after {} iterations ({})",
            args.function,
            args.dim,
            variant,
            report.fun,
            report.nit,
            if report.converged {
                "converged"
            } else {
                "budget exhausted"
            }
        );
        println!("x = {:?}", report.x.to_vec());
    }
    Ok(())
}
