//! Score, threshold, binarize, and summarize one method at a time,
//! and compare many methods side by side.

use crate::common::*;
use crate::covariate::CovariateVector;
use crate::fcat::{compute_fcat_all, Fcat, FcatConfig};
use crate::matching::*;
use crate::otsu::{OtsuThreshold, OTSU_NUM_BINS};
use crate::score_matrix::ScoreMatrix;
use crate::summary::*;

use dashmap::DashMap as HashMap;
use rayon::prelude::*;
use std::collections::HashSet;

/// Scores of one method with the covariates aligned to its
/// observations
#[derive(Clone, Debug)]
pub struct MethodInput {
    pub method: Box<str>,
    pub scores: ScoreMatrix,
    pub covariates: Vec<CovariateVector>,
    /// seconds, if known
    pub run_time: Option<f64>,
}

/// Everything derived from one method's scores
#[derive(Clone, Debug)]
pub struct MethodResult {
    pub method: Box<str>,
    pub fcat: Fcat,
    pub otsu: OtsuThreshold,
    pub matched_factors: MatchedFactorDist,
    pub percent_matched_factors: f32,
    pub matched_covariates: MatchedCovariateDist,
    pub percent_matched_covariates: f32,
    pub summary: MethodSummary,
}

impl MethodResult {
    pub fn threshold(&self) -> f32 {
        self.otsu.threshold
    }

    pub fn report(&self) -> MethodReport {
        MethodReport {
            summary: self.summary.clone(),
            threshold: self.otsu.threshold,
            percent_matched_factors: self.percent_matched_factors,
            percent_matched_covariates: self.percent_matched_covariates,
            num_factors: self.fcat.num_factors(),
            num_covariate_levels: self.fcat.num_levels(),
        }
    }

    /// FCAT restricted to the factors matched with any level
    pub fn matched_fcat(&self) -> Fcat {
        self.fcat
            .select_factors(&self.matched_factors.matched_indices())
    }

    /// Write `{hdr}.fcat.tsv`, `{hdr}.threshold.tsv`,
    /// `{hdr}.matched_factors.tsv`, and `{hdr}.matched_covariates.tsv`
    pub fn to_files(&self, hdr: &str) -> anyhow::Result<()> {
        self.fcat.to_file(&format!("{}.fcat.tsv", hdr))?;
        self.otsu.to_file(&format!("{}.threshold.tsv", hdr))?;
        self.matched_factors
            .to_file(&format!("{}.matched_factors.tsv", hdr))?;
        self.matched_covariates
            .to_file(&format!("{}.matched_covariates.tsv", hdr))?;
        Ok(())
    }
}

/// load -> score -> threshold -> binarize -> summarize
pub fn run_method(input: &MethodInput, config: &FcatConfig) -> Result<MethodResult> {
    let fcat = compute_fcat_all(&input.scores, &input.covariates, config)?;

    let otsu = OtsuThreshold::estimate(&fcat.flatten(), OTSU_NUM_BINS)?;
    let threshold = otsu.threshold;

    let (matched_factors, percent_matched_factors) = get_percent_matched_factors(&fcat, threshold);
    let (matched_covariates, percent_matched_covariates) =
        get_percent_matched_covariates(&fcat, threshold);

    let summary = summarize(&matched_factors, &matched_covariates, input.run_time);

    info!(
        "{}: {} levels x {} factors, threshold {:.4}, {} missing, {} entangled, {} split",
        input.method,
        fcat.num_levels(),
        fcat.num_factors(),
        threshold,
        summary.missing_factor,
        summary.entangled_covariate,
        summary.split_factor
    );

    Ok(MethodResult {
        method: input.method.clone(),
        fcat,
        otsu,
        matched_factors,
        percent_matched_factors,
        matched_covariates,
        percent_matched_covariates,
        summary,
    })
}

/// Outcomes of several methods in the order they were given
pub struct Comparison {
    pub results: Vec<(Box<str>, Result<MethodResult>)>,
}

impl Comparison {
    pub fn get(&self, method: &str) -> Option<&Result<MethodResult>> {
        self.results
            .iter()
            .find(|(m, _)| m.as_ref() == method)
            .map(|(_, r)| r)
    }

    pub fn to_table(&self) -> ComparisonTable {
        let rows = self
            .results
            .iter()
            .map(|(m, r)| (m.clone(), outcome_of(r)))
            .collect();
        let nlevels = count_unique_covariate_levels(
            self.results.iter().filter_map(|(_, r)| r.as_ref().ok()),
        );
        ComparisonTable::new(rows, nlevels)
    }
}

pub fn outcome_of(result: &Result<MethodResult>) -> MethodOutcome {
    match result {
        Ok(res) => MethodOutcome::Done(res.report()),
        Err(err) => MethodOutcome::Failed {
            error: err.to_string(),
        },
    }
}

/// distinct (covariate, level) pairs over these results
pub fn count_unique_covariate_levels<'a>(
    results: impl Iterator<Item = &'a MethodResult>,
) -> usize {
    results
        .flat_map(|res| {
            let fcat = &res.fcat;
            fcat.covariates().iter().zip(fcat.levels().iter())
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Method names must be unique
pub fn check_method_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(LentilError::Configuration("empty method name".into()));
        }
        if !seen.insert(name) {
            return Err(LentilError::Configuration(format!(
                "method `{}` appears more than once",
                name
            )));
        }
    }
    Ok(())
}

/// Run every method in parallel. A method that fails is reported as
/// such and doesn't stop the others.
pub fn run_comparison(inputs: &[MethodInput], config: &FcatConfig) -> Result<Comparison> {
    check_method_names(inputs.iter().map(|x| x.method.as_ref()))?;

    info!("comparing {} methods", inputs.len());

    let done: HashMap<Box<str>, Result<MethodResult>> = HashMap::default();

    inputs.par_iter().for_each(|input| {
        let res = run_method(input, config);
        if let Err(err) = res.as_ref() {
            warn!("{} failed: {}", input.method, err);
        }
        done.insert(input.method.clone(), res);
    });

    let results = inputs
        .iter()
        .map(|input| {
            let (method, res) = done.remove(&input.method).ok_or_else(|| {
                LentilError::Configuration(format!("no result for `{}`", input.method))
            })?;
            Ok((method, res))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Comparison { results })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_by_two() -> MethodInput {
        #[rustfmt::skip]
        let mat = Mat::from_row_slice(4, 2, &[
            1., 0.,
            1., 0.,
            0., 1.,
            0., 1.,
        ]);
        MethodInput {
            method: "toy".into(),
            scores: ScoreMatrix::from_mat(mat).unwrap(),
            covariates: vec![CovariateVector::from_strs("cov", &["A", "A", "B", "B"])],
            run_time: Some(2.0),
        }
    }

    #[test]
    fn single_method_is_clean() -> Result<()> {
        let res = run_method(&four_by_two(), &FcatConfig::default())?;
        assert_eq!(res.matched_factors.counts, vec![1, 1]);
        assert_eq!(res.matched_covariates.counts, vec![1, 1]);
        assert_eq!(
            res.summary,
            MethodSummary {
                missing_factor: 0,
                entangled_covariate: 0,
                split_factor: 0,
                run_time: Some(2.0),
            }
        );
        assert_eq!(res.matched_fcat().num_factors(), 2);
        Ok(())
    }

    #[test]
    fn failures_are_isolated_and_ordered() -> Result<()> {
        let good = four_by_two();
        let mut bad = four_by_two();
        bad.method = "short".into();
        bad.covariates = vec![CovariateVector::from_strs("cov", &["A", "B"])];
        let mut other = four_by_two();
        other.method = "again".into();

        let cmp = run_comparison(&[bad, good, other], &FcatConfig::default())?;
        let names: Vec<&str> = cmp.results.iter().map(|(m, _)| m.as_ref()).collect();
        assert_eq!(names, vec!["short", "toy", "again"]);

        assert!(matches!(
            cmp.get("short"),
            Some(Err(LentilError::ShapeMismatch { .. }))
        ));
        assert!(cmp.get("toy").unwrap().is_ok());

        let table = cmp.to_table();
        assert_eq!(table.num_failed(), 1);
        assert_eq!(table.num_unique_covariate_levels(), 2);
        Ok(())
    }

    #[test]
    fn duplicate_methods_are_rejected() {
        let res = run_comparison(&[four_by_two(), four_by_two()], &FcatConfig::default());
        assert!(matches!(res, Err(LentilError::Configuration(_))));
    }
}
