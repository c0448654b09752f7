//! Factor-covariate association tables (FCAT).
//!
//! Each row of an FCAT is one level of one covariate, each column one
//! factor. An entry is the average of the scaled factor scores over
//! the observations of that level.

use crate::common::*;
use crate::covariate::CovariateVector;
use crate::score_matrix::ScoreMatrix;

use matrix_util::dmatrix_util::concatenate_vertical;
use matrix_util::traits::{IoOps, MatOps};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How factor columns are scaled before averaging within levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// zero mean, unit variance
    Standard,
    /// onto `[0, 1]`
    MinMax,
}

impl FromStr for ScaleMode {
    type Err = LentilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ScaleMode::Standard),
            "minmax" => Ok(ScaleMode::MinMax),
            _ => Err(LentilError::Configuration(format!(
                "unsupported scale mode `{}` (standard, minmax)",
                s
            ))),
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Standard => write!(f, "standard"),
            ScaleMode::MinMax => write!(f, "minmax"),
        }
    }
}

/// How scaled scores are aggregated within a covariate level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanMode {
    Arithmetic,
}

impl FromStr for MeanMode {
    type Err = LentilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "arithmetic" | "arithmatic" => Ok(MeanMode::Arithmetic),
            _ => Err(LentilError::Configuration(format!(
                "unsupported mean mode `{}` (arithmetic)",
                s
            ))),
        }
    }
}

impl fmt::Display for MeanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeanMode::Arithmetic => write!(f, "arithmetic"),
        }
    }
}

/// How the sign of a level average enters the association score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    /// clip at zero; only levels above the factor's mean associate
    Positive,
    /// take the absolute value so negatively loading factors associate
    Absolute,
    /// keep the sign
    Signed,
}

impl SignMode {
    pub fn apply(&self, avg: f32) -> f32 {
        match self {
            SignMode::Positive => avg.max(0.),
            SignMode::Absolute => avg.abs(),
            SignMode::Signed => avg,
        }
    }
}

impl FromStr for SignMode {
    type Err = LentilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(SignMode::Positive),
            "absolute" => Ok(SignMode::Absolute),
            "signed" => Ok(SignMode::Signed),
            _ => Err(LentilError::Configuration(format!(
                "unsupported sign mode `{}` (positive, absolute, signed)",
                s
            ))),
        }
    }
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignMode::Positive => write!(f, "positive"),
            SignMode::Absolute => write!(f, "absolute"),
            SignMode::Signed => write!(f, "signed"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FcatConfig {
    pub scale: ScaleMode,
    pub mean: MeanMode,
    pub sign: SignMode,
}

impl Default for FcatConfig {
    fn default() -> Self {
        Self {
            scale: ScaleMode::Standard,
            mean: MeanMode::Arithmetic,
            sign: SignMode::Positive,
        }
    }
}

/// Scale each factor column of the scores
pub fn scale_scores(scores: &ScoreMatrix, scale: ScaleMode) -> Mat {
    match scale {
        ScaleMode::Standard => scores.mat().scale_columns(),
        ScaleMode::MinMax => scores.mat().minmax_columns(),
    }
}

/// Factor-covariate association table: covariate levels x factors
#[derive(Clone, Debug)]
pub struct Fcat {
    covariates: Vec<Box<str>>,
    levels: Vec<Box<str>>,
    factors: Vec<Box<str>>,
    mat: Mat,
    config: FcatConfig,
}

impl Fcat {
    /// per-row covariate names
    pub fn covariates(&self) -> &[Box<str>] {
        &self.covariates
    }

    /// per-row level names
    pub fn levels(&self) -> &[Box<str>] {
        &self.levels
    }

    pub fn factors(&self) -> &[Box<str>] {
        &self.factors
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn config(&self) -> &FcatConfig {
        &self.config
    }

    pub fn num_levels(&self) -> usize {
        self.mat.nrows()
    }

    pub fn num_factors(&self) -> usize {
        self.mat.ncols()
    }

    /// score of the row whose level name is `level` (first match)
    pub fn get(&self, level: &str, factor: &str) -> Option<f32> {
        let i = self.levels.iter().position(|x| x.as_ref() == level)?;
        let j = self.factors.iter().position(|x| x.as_ref() == factor)?;
        Some(self.mat[(i, j)])
    }

    /// `covariate:level` for every row
    pub fn row_names(&self) -> Vec<Box<str>> {
        self.covariates
            .iter()
            .zip(self.levels.iter())
            .map(|(c, l)| format!("{}:{}", c, l).into_boxed_str())
            .collect()
    }

    /// Stack tables of several covariates computed on the same factors
    pub fn concat(tables: &[Fcat]) -> Result<Fcat> {
        let first = tables
            .first()
            .ok_or(LentilError::EmptyTable("nothing to concatenate".into()))?;

        for other in tables.iter().skip(1) {
            if other.factors != first.factors {
                return Err(LentilError::Configuration(
                    "association tables with different factors can't be stacked".into(),
                ));
            }
            if other.config != first.config {
                return Err(LentilError::Configuration(
                    "association tables computed with different scale/mean modes can't be pooled"
                        .into(),
                ));
            }
        }

        let mats: Vec<Mat> = tables.iter().map(|x| x.mat.clone()).collect();
        let mat = concatenate_vertical(&mats)
            .map_err(|e| LentilError::Configuration(e.to_string()))?;

        Ok(Fcat {
            covariates: tables.iter().flat_map(|x| x.covariates.clone()).collect(),
            levels: tables.iter().flat_map(|x| x.levels.clone()).collect(),
            factors: first.factors.clone(),
            mat,
            config: first.config,
        })
    }

    /// Keep rows satisfying the predicate on (covariate, level)
    pub fn filter_rows<F>(&self, keep: F) -> Fcat
    where
        F: Fn(&str, &str) -> bool,
    {
        let rows: Vec<usize> = (0..self.num_levels())
            .filter(|&i| keep(&self.covariates[i], &self.levels[i]))
            .collect();

        Fcat {
            covariates: rows.iter().map(|&i| self.covariates[i].clone()).collect(),
            levels: rows.iter().map(|&i| self.levels[i].clone()).collect(),
            factors: self.factors.clone(),
            mat: self.mat.select_rows(rows.iter()),
            config: self.config,
        }
    }

    /// Remove the rows of unknown (`NA`) levels
    pub fn drop_na(&self) -> Fcat {
        self.filter_rows(|_, level| !is_missing_label(level))
    }

    /// Subset to these factor columns
    pub fn select_factors(&self, columns: &[usize]) -> Fcat {
        Fcat {
            covariates: self.covariates.clone(),
            levels: self.levels.clone(),
            factors: columns.iter().map(|&j| self.factors[j].clone()).collect(),
            mat: self.mat.select_columns(columns.iter()),
            config: self.config,
        }
    }

    /// All the scores in row-major order
    pub fn flatten(&self) -> Vec<f32> {
        self.mat
            .row_iter()
            .flat_map(|row| row.iter().copied().collect::<Vec<_>>())
            .collect()
    }

    /// Write as a delimited table with `covariate:level` row names
    pub fn to_file(&self, file: &str) -> anyhow::Result<()> {
        let delim = if file.ends_with(".csv") || file.ends_with(".csv.gz") {
            ","
        } else {
            "\t"
        };
        self.mat
            .write_names_delim(file, delim, &self.row_names(), &self.factors, "covariate:level")
    }
}

/// Association of every factor with every level of one covariate.
///
/// * `scores` - observations x factors
/// * `covariate` - one label per observation
/// * `scale` - column scaling applied before averaging
/// * `mean` - aggregation within each level
pub fn compute_fcat(
    scores: &ScoreMatrix,
    covariate: &CovariateVector,
    scale: ScaleMode,
    mean: MeanMode,
) -> Result<Fcat> {
    let config = FcatConfig {
        scale,
        mean,
        ..FcatConfig::default()
    };
    compute_fcat_with(scores, covariate, &config)
}

/// Same as [`compute_fcat`] with the full configuration
pub fn compute_fcat_with(
    scores: &ScoreMatrix,
    covariate: &CovariateVector,
    config: &FcatConfig,
) -> Result<Fcat> {
    // check alignment before touching the scores
    let level_indices = covariate.level_indices(scores.num_obs())?;
    let scaled = scale_scores(scores, config.scale);
    Ok(aggregate_levels(&scaled, scores, covariate, &level_indices, config))
}

/// Association tables for several covariates, stacked, with the `NA`
/// rows dropped. Scores are scaled once and shared across covariates.
pub fn compute_fcat_all(
    scores: &ScoreMatrix,
    covariates: &[CovariateVector],
    config: &FcatConfig,
) -> Result<Fcat> {
    if covariates.is_empty() {
        return Err(LentilError::Configuration("no covariate given".into()));
    }

    let level_indices = covariates
        .iter()
        .map(|cov| cov.level_indices(scores.num_obs()))
        .collect::<Result<Vec<_>>>()?;

    let scaled = scale_scores(scores, config.scale);

    let tables: Vec<Fcat> = covariates
        .iter()
        .zip(level_indices.iter())
        .map(|(cov, idx)| aggregate_levels(&scaled, scores, cov, idx, config))
        .collect();

    let fcat = Fcat::concat(&tables)?.drop_na();

    if fcat.num_levels() == 0 {
        return Err(LentilError::EmptyTable(
            "every covariate level is NA".into(),
        ));
    }
    Ok(fcat)
}

fn aggregate_levels(
    scaled: &Mat,
    scores: &ScoreMatrix,
    covariate: &CovariateVector,
    level_indices: &[(Box<str>, Vec<usize>)],
    config: &FcatConfig,
) -> Fcat {
    let nlevels = level_indices.len();
    let nfactors = scaled.ncols();
    let mut mat = Mat::zeros(nlevels, nfactors);

    for (i, (_, cells)) in level_indices.iter().enumerate() {
        let denom = cells.len() as f32;
        for j in 0..nfactors {
            let x_j = scaled.column(j);
            let avg = match config.mean {
                MeanMode::Arithmetic => cells.iter().map(|&c| x_j[c]).sum::<f32>() / denom,
            };
            mat[(i, j)] = config.sign.apply(avg);
        }
    }

    Fcat {
        covariates: vec![Box::from(covariate.name()); nlevels],
        levels: level_indices.iter().map(|(l, _)| l.clone()).collect(),
        factors: scores.factors().to_vec(),
        mat,
        config: *config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn toy_scores() -> ScoreMatrix {
        let mat = Mat::from_row_slice(4, 2, &[1., 0., 1., 0., 0., 1., 0., 1.]);
        ScoreMatrix::from_mat(mat).unwrap()
    }

    #[test]
    fn one_row_per_level_one_column_per_factor() -> Result<()> {
        let scores = toy_scores();
        let cov = CovariateVector::from_strs("cond", &["A", "A", "B", "B"]);
        let fcat = compute_fcat(&scores, &cov, ScaleMode::Standard, MeanMode::Arithmetic)?;

        assert_eq!(fcat.num_levels(), 2);
        assert_eq!(fcat.num_factors(), 2);

        assert_abs_diff_eq!(fcat.get("A", "F1").unwrap(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fcat.get("A", "F2").unwrap(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fcat.get("B", "F1").unwrap(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fcat.get("B", "F2").unwrap(), 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn sign_modes() -> Result<()> {
        let scores = toy_scores();
        let cov = CovariateVector::from_strs("cond", &["A", "A", "B", "NA"]);

        let with_sign = |sign| {
            let config = FcatConfig {
                sign,
                ..FcatConfig::default()
            };
            compute_fcat_with(&scores, &cov, &config)
        };

        let positive = with_sign(SignMode::Positive)?;
        assert_eq!(positive.num_levels(), 3);
        assert!(positive.mat().iter().all(|&x| x >= 0.0));

        let absolute = with_sign(SignMode::Absolute)?;
        assert!(absolute.mat().iter().all(|&x| x >= 0.0));

        let signed = with_sign(SignMode::Signed)?;
        assert!(signed.mat().iter().any(|&x| x < 0.0));
        assert_abs_diff_eq!(absolute.mat(), &signed.mat().abs(), epsilon = 1e-6);
        assert_abs_diff_eq!(
            positive.mat(),
            &signed.mat().map(|x| x.max(0.)),
            epsilon = 1e-6
        );

        assert_eq!("Absolute".parse::<SignMode>(), Ok(SignMode::Absolute));
        assert!("negative".parse::<SignMode>().is_err());
        Ok(())
    }

    #[test]
    fn stacking_drops_na_rows() -> Result<()> {
        let scores = toy_scores();
        let covs = vec![
            CovariateVector::from_strs("cond", &["A", "A", "B", "B"]),
            CovariateVector::from_strs("batch", &["b1", "NA", "b2", "NA"]),
        ];
        let fcat = compute_fcat_all(&scores, &covs, &FcatConfig::default())?;

        assert_eq!(fcat.num_levels(), 4);
        assert!(fcat.levels().iter().all(|x| x.as_ref() != "NA"));
        assert_eq!(fcat.covariates()[3].as_ref(), "batch");
        assert_eq!(fcat.flatten().len(), 8);
        Ok(())
    }

    #[test]
    fn misaligned_covariate() {
        let scores = toy_scores();
        let cov = CovariateVector::from_strs("cond", &["A", "B", "B"]);
        let ret = compute_fcat(&scores, &cov, ScaleMode::Standard, MeanMode::Arithmetic);
        assert!(matches!(ret, Err(LentilError::ShapeMismatch { .. })));
    }

    #[test]
    fn unsupported_modes() {
        assert!(matches!(
            "geometric".parse::<MeanMode>(),
            Err(LentilError::Configuration(_))
        ));
        assert!(matches!(
            "rank".parse::<ScaleMode>(),
            Err(LentilError::Configuration(_))
        ));
        assert_eq!("arithmatic".parse::<MeanMode>(), Ok(MeanMode::Arithmetic));
    }

    #[test]
    fn pooling_different_modes_is_rejected() -> Result<()> {
        let scores = toy_scores();
        let cov = CovariateVector::from_strs("cond", &["A", "A", "B", "B"]);
        let std = compute_fcat(&scores, &cov, ScaleMode::Standard, MeanMode::Arithmetic)?;
        let mm = compute_fcat(&scores, &cov, ScaleMode::MinMax, MeanMode::Arithmetic)?;
        assert!(matches!(
            Fcat::concat(&[std, mm]),
            Err(LentilError::Configuration(_))
        ));
        Ok(())
    }
}
