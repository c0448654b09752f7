use crate::fcat::Fcat;
use matrix_util::common_io::write_lines;
use serde::Serialize;

/// Number of covariate levels matched to each factor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchedFactorDist {
    pub factors: Vec<Box<str>>,
    pub counts: Vec<usize>,
}

/// Number of factors matched to each covariate level
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchedCovariateDist {
    pub covariates: Vec<Box<str>>,
    pub levels: Vec<Box<str>>,
    pub counts: Vec<usize>,
}

/// `score >= threshold`
pub fn binarize(fcat: &Fcat, threshold: f32) -> nalgebra::DMatrix<bool> {
    fcat.mat().map(|x| x >= threshold)
}

fn fraction_positive(counts: &[usize]) -> f32 {
    if counts.is_empty() {
        return 0.;
    }
    counts.iter().filter(|&&n| n > 0).count() as f32 / counts.len() as f32
}

/// Column sums of the binarized table and the fraction of factors
/// matched to at least one level
pub fn get_percent_matched_factors(fcat: &Fcat, threshold: f32) -> (MatchedFactorDist, f32) {
    let matched = binarize(fcat, threshold);
    let counts: Vec<usize> = matched
        .column_iter()
        .map(|col| col.iter().filter(|&&b| b).count())
        .collect();
    let percent = fraction_positive(&counts);

    (
        MatchedFactorDist {
            factors: fcat.factors().to_vec(),
            counts,
        },
        percent,
    )
}

/// Row sums of the binarized table and the fraction of levels
/// matched to at least one factor
pub fn get_percent_matched_covariates(fcat: &Fcat, threshold: f32) -> (MatchedCovariateDist, f32) {
    let matched = binarize(fcat, threshold);
    let counts: Vec<usize> = matched
        .row_iter()
        .map(|row| row.iter().filter(|&&b| b).count())
        .collect();
    let percent = fraction_positive(&counts);

    (
        MatchedCovariateDist {
            covariates: fcat.covariates().to_vec(),
            levels: fcat.levels().to_vec(),
            counts,
        },
        percent,
    )
}

impl MatchedFactorDist {
    /// factors matched with any level
    pub fn matched_indices(&self) -> Vec<usize> {
        (0..self.counts.len())
            .filter(|&j| self.counts[j] > 0)
            .collect()
    }

    pub fn to_file(&self, file: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = std::iter::once(Box::from("factor\tmatched"))
            .chain(
                self.factors
                    .iter()
                    .zip(self.counts.iter())
                    .map(|(f, n)| format!("{}\t{}", f, n).into_boxed_str()),
            )
            .collect();
        write_lines(&lines, file)
    }
}

impl MatchedCovariateDist {
    pub fn to_file(&self, file: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = std::iter::once(Box::from("covariate\tlevel\tmatched"))
            .chain(
                self.covariates
                    .iter()
                    .zip(self.levels.iter())
                    .zip(self.counts.iter())
                    .map(|((c, l), n)| format!("{}\t{}\t{}", c, l, n).into_boxed_str()),
            )
            .collect();
        write_lines(&lines, file)
    }
}
