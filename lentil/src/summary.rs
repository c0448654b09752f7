use crate::matching::{MatchedCovariateDist, MatchedFactorDist};
use matrix_util::common_io::{open_buf_writer, write_lines};
use serde::Serialize;
use std::io::Write;

/// Match quality of one method
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodSummary {
    /// covariate levels that no factor explains
    pub missing_factor: usize,
    /// covariate levels spread over more than one factor
    pub entangled_covariate: usize,
    /// factors matched to more than one covariate level
    pub split_factor: usize,
    /// wall-clock seconds reported by the caller
    pub run_time: Option<f64>,
}

pub fn summarize(
    matched_factor_dist: &MatchedFactorDist,
    matched_covariate_dist: &MatchedCovariateDist,
    run_time: Option<f64>,
) -> MethodSummary {
    let cov = &matched_covariate_dist.counts;
    MethodSummary {
        missing_factor: cov.iter().filter(|&&n| n == 0).count(),
        entangled_covariate: cov.iter().filter(|&&n| n > 1).count(),
        split_factor: matched_factor_dist.counts.iter().filter(|&&n| n > 1).count(),
        run_time,
    }
}

/// One row of the comparison table for a method that went through
#[derive(Clone, Debug, Serialize)]
pub struct MethodReport {
    #[serde(flatten)]
    pub summary: MethodSummary,
    pub threshold: f32,
    pub percent_matched_factors: f32,
    pub percent_matched_covariates: f32,
    pub num_factors: usize,
    pub num_covariate_levels: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MethodOutcome {
    Done(MethodReport),
    Failed { error: String },
}

#[derive(Serialize)]
struct JsonRow<'a> {
    method: &'a str,
    result: &'a MethodOutcome,
}

/// Methods x {missing_factor, entangled_covariate, split_factor,
/// run_time, ...} in the order the methods were given
#[derive(Clone, Debug, Default)]
pub struct ComparisonTable {
    rows: Vec<(Box<str>, MethodOutcome)>,
    num_unique_covariate_levels: usize,
}

const NA: &str = "NA";

fn or_na<T: ToString>(x: Option<T>) -> String {
    x.map(|v| v.to_string()).unwrap_or_else(|| NA.to_string())
}

impl ComparisonTable {
    pub fn new(rows: Vec<(Box<str>, MethodOutcome)>, num_unique_covariate_levels: usize) -> Self {
        Self {
            rows,
            num_unique_covariate_levels,
        }
    }

    pub fn rows(&self) -> &[(Box<str>, MethodOutcome)] {
        &self.rows
    }

    pub fn get(&self, method: &str) -> Option<&MethodOutcome> {
        self.rows
            .iter()
            .find(|(m, _)| m.as_ref() == method)
            .map(|(_, x)| x)
    }

    /// distinct (covariate, level) pairs over all the methods
    pub fn num_unique_covariate_levels(&self) -> usize {
        self.num_unique_covariate_levels
    }

    pub fn num_failed(&self) -> usize {
        self.rows
            .iter()
            .filter(|(_, x)| matches!(x, MethodOutcome::Failed { .. }))
            .count()
    }

    pub fn to_lines(&self) -> Vec<Box<str>> {
        let header = [
            "method",
            "missing_factor",
            "entangled_covariate",
            "split_factor",
            "run_time",
            "threshold",
            "percent_matched_factors",
            "percent_matched_covariates",
            "num_factors",
            "num_covariate_levels",
            "error",
        ]
        .join("\t");

        let mut lines: Vec<Box<str>> = vec![header.into()];

        for (method, outcome) in self.rows.iter() {
            let fields: Vec<String> = match outcome {
                MethodOutcome::Done(r) => vec![
                    method.to_string(),
                    r.summary.missing_factor.to_string(),
                    r.summary.entangled_covariate.to_string(),
                    r.summary.split_factor.to_string(),
                    or_na(r.summary.run_time),
                    r.threshold.to_string(),
                    r.percent_matched_factors.to_string(),
                    r.percent_matched_covariates.to_string(),
                    r.num_factors.to_string(),
                    r.num_covariate_levels.to_string(),
                    NA.to_string(),
                ],
                MethodOutcome::Failed { error } => std::iter::once(method.to_string())
                    .chain(std::iter::repeat_n(NA.to_string(), 9))
                    // keep the table rectangular
                    .chain(std::iter::once(error.replace(['\t', '\n'], " ")))
                    .collect(),
            };
            lines.push(fields.join("\t").into());
        }
        lines
    }

    pub fn to_tsv(&self, file: &str) -> anyhow::Result<()> {
        write_lines(&self.to_lines(), file)
    }

    pub fn to_json(&self, file: &str) -> anyhow::Result<()> {
        let rows: Vec<JsonRow> = self
            .rows
            .iter()
            .map(|(method, outcome)| JsonRow {
                method: method.as_ref(),
                result: outcome,
            })
            .collect();

        let json = serde_json::json!({
            "num_unique_covariate_levels": self.num_unique_covariate_levels,
            "methods": rows,
        });

        let mut buf = open_buf_writer(file)?;
        serde_json::to_writer_pretty(&mut buf, &json)?;
        writeln!(buf)?;
        buf.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dists(
        factor_counts: Vec<usize>,
        level_counts: Vec<usize>,
    ) -> (MatchedFactorDist, MatchedCovariateDist) {
        let nf = factor_counts.len();
        let nl = level_counts.len();
        (
            MatchedFactorDist {
                factors: (0..nf).map(|j| format!("F{}", j + 1).into()).collect(),
                counts: factor_counts,
            },
            MatchedCovariateDist {
                covariates: vec!["cov".into(); nl],
                levels: (0..nl).map(|i| format!("L{}", i).into()).collect(),
                counts: level_counts,
            },
        )
    }

    #[test]
    fn counts_partition_the_levels() {
        let (mfd, mcd) = dists(vec![0, 2, 1, 3], vec![0, 1, 2, 0, 3, 1]);
        let s = summarize(&mfd, &mcd, Some(1.5));

        assert_eq!(s.missing_factor, 2);
        assert_eq!(s.entangled_covariate, 2);
        assert_eq!(s.split_factor, 2);
        assert_eq!(s.run_time, Some(1.5));

        let single = mcd.counts.iter().filter(|&&n| n == 1).count();
        assert_eq!(
            s.missing_factor + single + s.entangled_covariate,
            mcd.counts.len()
        );
    }

    #[test]
    fn failed_rows_are_marked() {
        let (mfd, mcd) = dists(vec![1, 1], vec![1, 1]);
        let report = MethodReport {
            summary: summarize(&mfd, &mcd, None),
            threshold: 0.5,
            percent_matched_factors: 1.0,
            percent_matched_covariates: 1.0,
            num_factors: 2,
            num_covariate_levels: 2,
        };
        let table = ComparisonTable::new(
            vec![
                ("pca".into(), MethodOutcome::Done(report)),
                (
                    "scvi".into(),
                    MethodOutcome::Failed {
                        error: "no factor column selected".into(),
                    },
                ),
            ],
            2,
        );

        let lines = table.to_lines();
        assert_eq!(lines.len(), 3);
        let ncol = lines[0].split('\t').count();
        assert!(lines.iter().all(|l| l.split('\t').count() == ncol));
        assert!(lines[1].starts_with("pca\t0\t0\t0\tNA"));
        assert!(lines[2].starts_with("scvi\tNA\tNA"));
        assert!(lines[2].ends_with("no factor column selected"));
        assert_eq!(table.num_failed(), 1);
    }
}
