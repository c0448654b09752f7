use lentil::common::*;
use lentil::simulate::*;

use clap::Parser;
use matrix_util::common_io::mkdir;

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// number of observations
    #[arg(long, short = 'n', default_value_t = 1000)]
    obs: usize,

    /// number of levels of each covariate (comma-separated)
    #[arg(long, short = 'l', value_delimiter(','), default_value = "2,3")]
    levels: Vec<usize>,

    /// factors without covariate signal
    #[arg(long, default_value_t = 2)]
    noise_factors: usize,

    /// shift of a planted factor within its level
    #[arg(long, default_value_t = 3.0)]
    effect: f32,

    /// fraction of `NA` labels
    #[arg(long, default_value_t = 0.0)]
    na_fraction: f32,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Simulate factor scores with planted covariate associations
pub fn run_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let sim = generate_planted_scores(&SimArgs {
        obs: args.obs,
        levels: args.levels,
        noise_factors: args.noise_factors,
        effect: args.effect,
        na_fraction: args.na_fraction,
        rseed: args.rseed,
    })?;

    mkdir(&args.out)?;

    let score_file = format!("{}.scores.tsv.gz", args.out);
    let planted_file = format!("{}.planted.tsv", args.out);

    sim.to_file(&score_file)?;
    sim.planted_to_file(&planted_file)?;

    info!("wrote {} and {}", score_file, planted_file);
    Ok(())
}
