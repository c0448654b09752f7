//! Label-free and label-dependent interpretability metrics of factors
//! and the factor interpretability score table (FIST) that collects
//! them.

use crate::common::*;
use crate::covariate::CovariateVector;
use crate::fcat::{compute_fcat_all, Fcat, FcatConfig};
use crate::otsu::{OtsuThreshold, OTSU_NUM_BINS};
use crate::score_matrix::ScoreMatrix;

use matrix_util::traits::{ColumnStatOps, IoOps, MatOps};

const EM_MAX_ITER: usize = 200;
const EM_TOL: f64 = 1e-8;
const MIN_VARIANCE: f64 = 1e-12;

/// Two Gaussians with a shared variance
#[derive(Clone, Debug)]
pub struct TwoGaussianFit {
    /// weight of the upper component
    pub weight: f64,
    pub mu_low: f64,
    pub mu_high: f64,
    pub sigma: f64,
    pub iterations: usize,
}

impl TwoGaussianFit {
    /// `sqrt(w (1 - w)) |mu_high - mu_low| / sigma`
    pub fn bimodality_index(&self) -> f64 {
        (self.weight * (1. - self.weight)).sqrt() * (self.mu_high - self.mu_low).abs() / self.sigma
    }
}

/// Fit a two-component mixture by EM, starting from the split at the
/// Otsu threshold. Returns `None` for constant input.
pub fn fit_two_gaussians(xx: &[f32]) -> Result<Option<TwoGaussianFit>> {
    let otsu = OtsuThreshold::estimate(xx, OTSU_NUM_BINS)?;
    if otsu.degenerate {
        return Ok(None);
    }

    let xx: Vec<f64> = xx.iter().map(|&x| x as f64).collect();
    let nn = xx.len() as f64;
    let t = otsu.threshold as f64;

    let mut resp: Vec<f64> = xx.iter().map(|&x| if x >= t { 1. } else { 0. }).collect();

    let mut fit = TwoGaussianFit {
        weight: 0.5,
        mu_low: 0.,
        mu_high: 0.,
        sigma: 1.,
        iterations: 0,
    };

    let mut llik_old = f64::NEG_INFINITY;

    for iter in 0..EM_MAX_ITER {
        // M-step
        let n_high: f64 = resp.iter().sum();
        let n_low = nn - n_high;

        if n_high < 1e-8 || n_low < 1e-8 {
            fit.weight = if n_high < 1e-8 { 0. } else { 1. };
            fit.iterations = iter;
            return Ok(Some(fit));
        }

        fit.weight = n_high / nn;
        fit.mu_high = xx.iter().zip(&resp).map(|(x, r)| r * x).sum::<f64>() / n_high;
        fit.mu_low = xx.iter().zip(&resp).map(|(x, r)| (1. - r) * x).sum::<f64>() / n_low;

        let var = xx
            .iter()
            .zip(&resp)
            .map(|(x, r)| r * (x - fit.mu_high).powi(2) + (1. - r) * (x - fit.mu_low).powi(2))
            .sum::<f64>()
            / nn;
        fit.sigma = var.max(MIN_VARIANCE).sqrt();

        // E-step
        let s2 = fit.sigma * fit.sigma;
        let log_norm = -0.5 * (2. * std::f64::consts::PI * s2).ln();
        let (ln_w1, ln_w0) = (fit.weight.ln(), (1. - fit.weight).ln());

        let mut llik = 0.;
        for (x, r) in xx.iter().zip(resp.iter_mut()) {
            let l1 = ln_w1 - (x - fit.mu_high).powi(2) / (2. * s2);
            let l0 = ln_w0 - (x - fit.mu_low).powi(2) / (2. * s2);
            let m = l0.max(l1);
            let lse = m + ((l0 - m).exp() + (l1 - m).exp()).ln();
            *r = (l1 - lse).exp();
            llik += lse + log_norm;
        }

        fit.iterations = iter + 1;
        if (llik - llik_old).abs() < EM_TOL * (1. + llik.abs()) {
            break;
        }
        llik_old = llik;
    }

    Ok(Some(fit))
}

/// Bimodality index of every factor; constant factors get zero
pub fn bimodality_index(scores: &ScoreMatrix) -> Result<Vec<f32>> {
    scores
        .mat()
        .column_iter()
        .map(|x_j| -> Result<f32> {
            let xx: Vec<f32> = x_j.iter().copied().collect();
            Ok(fit_two_gaussians(&xx)?
                .map(|fit| fit.bimodality_index() as f32)
                .unwrap_or(0.))
        })
        .collect()
}

/// Population variance of every raw factor
pub fn factor_variance(scores: &ScoreMatrix) -> Vec<f32> {
    scores.mat().column_variances().iter().copied().collect()
}

/// Simpson index `sum_l p_l^2` of every factor over covariate levels
/// with `p_l = |a_l| / sum |a|`. A factor concentrated on one level
/// scores 1, an even spread over `L` levels `1/L`, all zeros 0.
pub fn simpson_diversity_index(fcat: &Fcat) -> Vec<f32> {
    fcat.mat()
        .column_iter()
        .map(|a_j| {
            let tot: f32 = a_j.iter().map(|x| x.abs()).sum();
            if tot > 0. {
                a_j.iter().map(|x| (x.abs() / tot).powi(2)).sum()
            } else {
                0.
            }
        })
        .collect()
}

/// Within-level variance relative to the total variance, averaged
/// arithmetically over the non-`NA` levels of a covariate. Small
/// values mean each level occupies a narrow range of the factor.
pub fn average_scaled_variance(
    scores: &ScoreMatrix,
    covariate: &CovariateVector,
) -> Result<Vec<f32>> {
    let level_indices: Vec<(Box<str>, Vec<usize>)> = covariate
        .level_indices(scores.num_obs())?
        .into_iter()
        .filter(|(level, _)| !is_missing_label(level))
        .collect();

    if level_indices.is_empty() {
        return Err(LentilError::EmptyTable(format!(
            "covariate `{}` has only NA labels",
            covariate.name()
        )));
    }

    let total = scores.mat().column_variances();

    let ret = scores
        .mat()
        .column_iter()
        .enumerate()
        .map(|(j, x_j)| {
            if total[j] <= 0. {
                return 1.;
            }
            let asv = level_indices
                .iter()
                .map(|(_, cells)| {
                    let nn = cells.len() as f32;
                    let mu = cells.iter().map(|&i| x_j[i]).sum::<f32>() / nn;
                    cells.iter().map(|&i| (x_j[i] - mu).powi(2)).sum::<f32>() / nn
                })
                .sum::<f32>()
                / level_indices.len() as f32;
            asv / total[j]
        })
        .collect();

    Ok(ret)
}

/// Pearson correlation of every factor with per-observation library
/// size. Constant factors, or a constant library size, give zero.
pub fn factor_libsize_correlation(scores: &ScoreMatrix, libsize: &[f32]) -> Result<Vec<f32>> {
    let nobs = scores.num_obs();
    if libsize.len() != nobs {
        return Err(LentilError::ShapeMismatch {
            covariate: "library size".into(),
            expected: nobs,
            actual: libsize.len(),
        });
    }

    let nn = nobs as f64;
    let mu_y = libsize.iter().map(|&y| y as f64).sum::<f64>() / nn;
    let ss_y: f64 = libsize.iter().map(|&y| (y as f64 - mu_y).powi(2)).sum();

    let ret = scores
        .mat()
        .column_iter()
        .map(|x_j| {
            let mu_x = x_j.iter().map(|&x| x as f64).sum::<f64>() / nn;
            let (mut sxy, mut ss_x) = (0_f64, 0_f64);
            for (&x, &y) in x_j.iter().zip(libsize.iter()) {
                let dx = x as f64 - mu_x;
                sxy += dx * (y as f64 - mu_y);
                ss_x += dx * dx;
            }
            if ss_x > 0. && ss_y > 0. {
                (sxy / (ss_x * ss_y).sqrt()) as f32
            } else {
                0.
            }
        })
        .collect();

    Ok(ret)
}

/// Factor interpretability score table: factors x metrics, raw and
/// min-max scaled within each metric
#[derive(Clone, Debug)]
pub struct Fist {
    pub factors: Vec<Box<str>>,
    pub metrics: Vec<Box<str>>,
    pub raw: Mat,
    pub scaled: Mat,
}

impl Fist {
    pub fn new(factors: Vec<Box<str>>, columns: Vec<(Box<str>, Vec<f32>)>) -> Result<Self> {
        if let Some((name, _)) = columns.iter().find(|(_, v)| v.len() != factors.len()) {
            return Err(LentilError::Configuration(format!(
                "metric `{}` doesn't cover all {} factors",
                name,
                factors.len()
            )));
        }

        let mut raw = Mat::zeros(factors.len(), columns.len());
        for (k, (_, v)) in columns.iter().enumerate() {
            raw.column_mut(k).copy_from_slice(v);
        }

        let scaled = raw.minmax_columns();

        Ok(Self {
            factors,
            metrics: columns.into_iter().map(|(name, _)| name).collect(),
            raw,
            scaled,
        })
    }

    /// Subset to these factors. The scaling is kept from the full
    /// table.
    pub fn select_factors(&self, rows: &[usize]) -> Fist {
        Fist {
            factors: rows.iter().map(|&i| self.factors[i].clone()).collect(),
            metrics: self.metrics.clone(),
            raw: self.raw.select_rows(rows.iter()),
            scaled: self.scaled.select_rows(rows.iter()),
        }
    }

    /// `{hdr}.fist.tsv` and `{hdr}.fist_scaled.tsv`
    pub fn to_files(&self, hdr: &str) -> anyhow::Result<()> {
        self.raw.write_names_delim(
            &format!("{}.fist.tsv", hdr),
            "\t",
            &self.factors,
            &self.metrics,
            "factor",
        )?;
        self.scaled.write_names_delim(
            &format!("{}.fist_scaled.tsv", hdr),
            "\t",
            &self.factors,
            &self.metrics,
            "factor",
        )
    }
}

/// Bimodality, specificity, effect size, and homogeneity with
/// respect to each covariate, for every factor. With `libsize`, the
/// correlation with library size is appended.
pub fn compute_fist(
    scores: &ScoreMatrix,
    covariates: &[CovariateVector],
    libsize: Option<&[f32]>,
    config: &FcatConfig,
) -> Result<Fist> {
    let fcat = compute_fcat_all(scores, covariates, config)?;

    let mut columns: Vec<(Box<str>, Vec<f32>)> = vec![
        ("bimodality".into(), bimodality_index(scores)?),
        ("specificity".into(), simpson_diversity_index(&fcat)),
        ("effect_size".into(), factor_variance(scores)),
    ];

    for cov in covariates {
        let homogeneity = average_scaled_variance(scores, cov)?
            .into_iter()
            .map(|asv| (1. - asv).clamp(0., 1.))
            .collect();
        columns.push((format!("homogeneity_{}", cov.name()).into(), homogeneity));
    }

    if let Some(libsize) = libsize {
        columns.push((
            "libsize_correlation".into(),
            factor_libsize_correlation(scores, libsize)?,
        ));
    }

    info!(
        "computed {} metrics for {} factors",
        columns.len(),
        scores.num_factors()
    );

    Fist::new(scores.factors().to_vec(), columns)
}
