use crate::cli_common::*;

use lentil::common::*;
use lentil::input::{read_manifest, read_score_table, ManifestEntry};
use lentil::pipeline::*;
use lentil::summary::{ComparisonTable, MethodOutcome};

use clap::Parser;
use matrix_util::common_io::mkdir;

#[derive(Parser, Debug, Clone)]
pub struct CompareArgs {
    /// tab-separated manifest; each line: `method score_file
    /// run_time|NA [prefix:F|columns:F1,F2]`
    manifest: Box<str>,

    /// covariate columns (comma-separated)
    #[arg(long, short = 'c', value_delimiter(','), required = true)]
    covariates: Vec<Box<str>>,

    /// separate table of covariates keyed by observation id
    #[arg(long, short = 'm')]
    meta: Option<Box<str>>,

    /// factor columns of manifest lines without a selector
    #[command(flatten)]
    factors: FactorOptions,

    #[command(flatten)]
    fcat: FcatOptions,

    /// skip the per-method tables
    #[arg(long, default_value_t = false)]
    summary_only: bool,

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

fn load_method(entry: &ManifestEntry, args: &CompareArgs) -> anyhow::Result<MethodInput> {
    let (scores, covariates) = read_score_table(
        &entry.score_file,
        &entry.factors,
        &args.covariates,
        args.meta.as_deref(),
    )?;
    Ok(MethodInput {
        method: entry.method.clone(),
        scores,
        covariates,
        run_time: entry.run_time,
    })
}

/// Compare several methods on the same covariates
pub fn run_compare(args: CompareArgs) -> anyhow::Result<()> {
    setup(args.verbose, args.threads)?;

    let entries = read_manifest(&args.manifest, &args.factors.selector())?;

    let mut inputs = vec![];
    let mut read_errors = vec![];

    for entry in entries.iter() {
        match load_method(entry, &args) {
            Ok(input) => inputs.push(input),
            Err(err) => {
                warn!("couldn't read {}: {}", entry.method, err);
                read_errors.push((entry.method.clone(), err.to_string()));
            }
        }
    }

    let comparison = run_comparison(&inputs, &args.fcat.config())?;

    mkdir(&args.out)?;

    if !args.summary_only {
        for (method, res) in comparison.results.iter() {
            if let Ok(res) = res {
                res.to_files(&format!("{}.{}", args.out, method))?;
            }
        }
    }

    // back in the manifest order
    let rows = entries
        .iter()
        .map(|entry| {
            let outcome = match comparison.get(&entry.method) {
                Some(res) => outcome_of(res),
                None => MethodOutcome::Failed {
                    error: read_errors
                        .iter()
                        .find(|(m, _)| m == &entry.method)
                        .map(|(_, e)| e.clone())
                        .unwrap_or_else(|| "not loaded".into()),
                },
            };
            (entry.method.clone(), outcome)
        })
        .collect();

    let nlevels = count_unique_covariate_levels(
        comparison
            .results
            .iter()
            .filter_map(|(_, res)| res.as_ref().ok()),
    );
    let table = ComparisonTable::new(rows, nlevels);

    table.to_tsv(&format!("{}.summary.tsv", args.out))?;
    table.to_json(&format!("{}.summary.json", args.out))?;

    info!(
        "{} methods, {} failed, {} distinct covariate levels; output: {}.*",
        table.rows().len(),
        table.num_failed(),
        table.num_unique_covariate_levels(),
        args.out
    );
    Ok(())
}
