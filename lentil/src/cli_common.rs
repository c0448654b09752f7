use lentil::common::*;
use lentil::fcat::{FcatConfig, MeanMode, ScaleMode, SignMode};
use lentil::score_matrix::FactorColumns;

use clap::Args;
use rayon::ThreadPoolBuilder;

/// How association scores are formed
#[derive(Args, Debug, Clone)]
pub struct FcatOptions {
    /// column scaling before averaging within levels: `standard`
    /// or `minmax`
    #[arg(long, default_value = "standard")]
    pub scale: ScaleMode,

    /// aggregation within each covariate level
    #[arg(long, default_value = "arithmetic")]
    pub mean: MeanMode,

    /// sign of level averages: `positive` clips at zero, `absolute`
    /// counts negatively loading factors, `signed` keeps the sign
    #[arg(long, default_value = "positive")]
    pub sign: SignMode,
}

impl FcatOptions {
    pub fn config(&self) -> FcatConfig {
        FcatConfig {
            scale: self.scale,
            mean: self.mean,
            sign: self.sign,
        }
    }
}

/// Which columns of a score table are factors
#[derive(Args, Debug, Clone)]
pub struct FactorOptions {
    /// factor columns are this prefix followed by digits
    #[arg(long, default_value = "F", conflicts_with = "factor_columns")]
    pub factor_prefix: Box<str>,

    /// factor columns by name (comma-separated)
    #[arg(long, value_delimiter(','))]
    pub factor_columns: Option<Vec<Box<str>>>,
}

impl FactorOptions {
    pub fn selector(&self) -> FactorColumns {
        match &self.factor_columns {
            Some(cols) => FactorColumns::Explicit(cols.clone()),
            None => FactorColumns::Prefix(self.factor_prefix.clone()),
        }
    }
}

/// Logging and the rayon pool; call once per run
pub fn setup(verbose: bool, max_threads: Option<usize>) -> anyhow::Result<()> {
    if verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let max_threads = max_threads
        .map(|n| n.clamp(1, num_cpus::get()))
        .unwrap_or_else(num_cpus::get);

    ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;

    info!("will use {} threads", rayon::current_num_threads());
    Ok(())
}
