use crate::cli_common::*;

use lentil::common::*;
use lentil::factor_metrics::compute_fist;
use lentil::input::{read_numeric_column, read_score_table};
use lentil::pipeline::{run_method, MethodInput};

use clap::Parser;
use matrix_util::common_io::mkdir;

#[derive(Parser, Debug, Clone)]
pub struct MetricsArgs {
    /// score table: observation ids in the first column, then
    /// factor (and possibly covariate) columns
    score_file: Box<str>,

    /// covariate columns (comma-separated)
    #[arg(long, short = 'c', value_delimiter(','), required = true)]
    covariates: Vec<Box<str>>,

    /// separate table of covariates keyed by observation id
    #[arg(long, short = 'm')]
    meta: Option<Box<str>>,

    /// per-observation library size column (of `--meta` if given);
    /// adds the correlation of each factor with it
    #[arg(long)]
    libsize_column: Option<Box<str>>,

    #[command(flatten)]
    factors: FactorOptions,

    #[command(flatten)]
    fcat: FcatOptions,

    /// also write the table of the factors matched with any
    /// covariate level
    #[arg(long, default_value_t = false)]
    matched: bool,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// maximum number of threads
    #[arg(long)]
    threads: Option<usize>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Factor interpretability score table
pub fn run_metrics(args: MetricsArgs) -> anyhow::Result<()> {
    setup(args.verbose, args.threads)?;

    let (scores, covariates) = read_score_table(
        &args.score_file,
        &args.factors.selector(),
        &args.covariates,
        args.meta.as_deref(),
    )?;

    let libsize = match args.libsize_column.as_deref() {
        Some(name) => {
            let file = args.meta.as_deref().unwrap_or(&args.score_file);
            Some(read_numeric_column(file, name, scores.obs())?)
        }
        None => None,
    };

    let config = args.fcat.config();
    let fist = compute_fist(&scores, &covariates, libsize.as_deref(), &config)?;

    mkdir(&args.out)?;
    fist.to_files(&args.out)?;

    if args.matched {
        let input = MethodInput {
            method: args.score_file.clone(),
            scores,
            covariates,
            run_time: None,
        };
        let res = run_method(&input, &config)?;
        let matched = res.matched_factors.matched_indices();
        info!("{} matched factors", matched.len());
        fist.select_factors(&matched)
            .to_files(&format!("{}.matched", args.out))?;
    }

    info!("output: {}.fist*.tsv", args.out);
    Ok(())
}
