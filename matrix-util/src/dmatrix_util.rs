pub use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::traits::{ColumnStatOps, MatOps};

/// Sample d,n matrix from U(0,1)
pub fn runif(dd: usize, nn: usize) -> DMatrix<f32> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| rng.random::<f32>())
        .collect();

    DMatrix::<f32>::from_vec(dd, nn, rvec)
}

/// Sample d,n matrix from N(0,1)
pub fn rnorm(dd: usize, nn: usize) -> DMatrix<f32> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| rng.sample(StandardNormal))
        .collect();

    DMatrix::<f32>::from_vec(dd, nn, rvec)
}

/// Stack matrices vertically; all of them must have the same number
/// of columns
pub fn concatenate_vertical(mats: &[DMatrix<f32>]) -> anyhow::Result<DMatrix<f32>> {
    let ncols = match mats.first() {
        Some(m) => m.ncols(),
        None => return Ok(DMatrix::<f32>::zeros(0, 0)),
    };

    if mats.iter().any(|m| m.ncols() != ncols) {
        return Err(anyhow::anyhow!("column numbers don't match"));
    }

    let nrows = mats.iter().map(|m| m.nrows()).sum();
    let mut ret = DMatrix::<f32>::zeros(nrows, ncols);
    let mut lb = 0;
    for m in mats {
        ret.rows_mut(lb, m.nrows()).copy_from(m);
        lb += m.nrows();
    }
    Ok(ret)
}

impl MatOps for DMatrix<f32> {
    type Mat = Self;
    type Scalar = f32;

    fn scale_columns_inplace(&mut self) {
        let nn = self.nrows().max(1) as f32;
        for mut xx_j in self.column_iter_mut() {
            let mu = xx_j.sum() / nn;
            let var = xx_j.iter().map(|&x| (x - mu) * (x - mu)).sum::<f32>() / nn;
            let sig = var.sqrt();
            if sig > 0_f32 {
                xx_j.apply(|x| *x = (*x - mu) / sig);
            } else {
                xx_j.apply(|x| *x -= mu);
            }
        }
    }

    fn scale_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.scale_columns_inplace();
        ret
    }

    fn minmax_columns_inplace(&mut self) {
        for mut xx_j in self.column_iter_mut() {
            if xx_j.is_empty() {
                continue;
            }
            let lb = xx_j.min();
            let ub = xx_j.max();
            if ub > lb {
                xx_j.apply(|x| *x = (*x - lb) / (ub - lb));
            } else {
                xx_j.fill(0_f32);
            }
        }
    }

    fn minmax_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.minmax_columns_inplace();
        ret
    }
}

impl ColumnStatOps for DMatrix<f32> {
    type DVec = DVector<f32>;

    fn column_means(&self) -> Self::DVec {
        let nn = self.nrows().max(1) as f32;
        DVector::from_iterator(self.ncols(), self.column_iter().map(|x_j| x_j.sum() / nn))
    }

    fn column_variances(&self) -> Self::DVec {
        let nn = self.nrows().max(1) as f32;
        DVector::from_iterator(
            self.ncols(),
            self.column_iter().map(|x_j| {
                let mu = x_j.sum() / nn;
                x_j.iter().map(|&x| (x - mu) * (x - mu)).sum::<f32>() / nn
            }),
        )
    }
}
