pub mod common;
pub mod covariate;
pub mod error;
pub mod factor_metrics;
pub mod fcat;
pub mod input;
pub mod matching;
pub mod otsu;
pub mod pipeline;
pub mod score_matrix;
pub mod simulate;
pub mod summary;

pub use covariate::CovariateVector;
pub use error::{LentilError, Result};
pub use fcat::{compute_fcat, Fcat, FcatConfig, MeanMode, ScaleMode, SignMode};
pub use matching::{get_percent_matched_covariates, get_percent_matched_factors};
pub use otsu::get_otsu_threshold;
pub use pipeline::{run_comparison, run_method, MethodInput, MethodResult};
pub use score_matrix::{FactorColumns, ScoreMatrix};
pub use summary::{summarize, MethodSummary};
