pub use log::{info, warn};

pub use crate::error::{LentilError, Result};

pub type Mat = nalgebra::DMatrix<f32>;
pub type DVec = nalgebra::DVector<f32>;

/// Label of observations without a known covariate level
pub const MISSING_LABEL: &str = "NA";

pub fn is_missing_label(label: &str) -> bool {
    label == MISSING_LABEL
}
