use crate::cli_common::*;

use lentil::common::*;
use lentil::pipeline::{outcome_of, run_method, MethodInput};
use lentil::summary::ComparisonTable;
use lentil::input::read_score_table;

use clap::Parser;
use matrix_util::common_io::{basename, mkdir};

#[derive(Parser, Debug, Clone)]
pub struct FcatArgs {
    /// score table: observation ids in the first column, then
    /// factor (and possibly covariate) columns; `.tsv`, `.csv`, or
    /// gzipped
    score_file: Box<str>,

    /// covariate columns (comma-separated)
    #[arg(long, short = 'c', value_delimiter(','), required = true)]
    covariates: Vec<Box<str>>,

    /// separate table of covariates keyed by observation id
    #[arg(long, short = 'm')]
    meta: Option<Box<str>>,

    #[command(flatten)]
    factors: FactorOptions,

    #[command(flatten)]
    fcat: FcatOptions,

    /// method name in the summary; the score file's name by default
    #[arg(long)]
    method: Option<Box<str>>,

    /// run time of the method in seconds
    #[arg(long)]
    run_time: Option<f64>,

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

/// Associate the factors of one method with covariate levels
pub fn run_fcat(args: FcatArgs) -> anyhow::Result<()> {
    setup(args.verbose, args.threads)?;

    let (scores, covariates) = read_score_table(
        &args.score_file,
        &args.factors.selector(),
        &args.covariates,
        args.meta.as_deref(),
    )?;

    let method = match args.method {
        Some(m) => m,
        None => basename(&args.score_file)?,
    };

    let input = MethodInput {
        method: method.clone(),
        scores,
        covariates,
        run_time: args.run_time,
    };

    let res = run_method(&input, &args.fcat.config());

    mkdir(&args.out)?;

    if let Ok(res) = res.as_ref() {
        res.to_files(&args.out)?;
        res.matched_fcat()
            .to_file(&format!("{}.fcat_matched.tsv", args.out))?;
    }

    let nlevels = res.as_ref().map(|r| r.fcat.num_levels()).unwrap_or(0);
    let table = ComparisonTable::new(vec![(method, outcome_of(&res))], nlevels);
    table.to_tsv(&format!("{}.summary.tsv", args.out))?;

    let res = res?;
    info!(
        "{} of {} factors matched; output: {}.*",
        res.matched_factors.matched_indices().len(),
        res.fcat.num_factors(),
        args.out
    );
    Ok(())
}
