mod cli_common;
mod run_compare;
mod run_fcat;
mod run_metrics;
mod run_sim;

use crate::run_compare::*;
use crate::run_fcat::*;
use crate::run_metrics::*;
use crate::run_sim::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about, term_width = 80)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Associate factors of one method with covariate levels
    Fcat(FcatArgs),

    /// Compare the factor-covariate matching of several methods
    Compare(CompareArgs),

    /// Bimodality, specificity, effect size, and homogeneity of factors
    Metrics(MetricsArgs),

    /// Simulate factor scores with planted covariate associations
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Fcat(args) => {
            run_fcat(args.clone())?;
        }
        Commands::Compare(args) => {
            run_compare(args.clone())?;
        }
        Commands::Metrics(args) => {
            run_metrics(args.clone())?;
        }
        Commands::Simulate(args) => {
            run_simulate(args.clone())?;
        }
    }

    Ok(())
}
