use crate::common::*;
use crate::covariate::CovariateVector;
use crate::score_matrix::ScoreMatrix;

use matrix_util::common_io::write_lines;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub struct SimArgs {
    pub obs: usize,
    /// number of levels of each covariate
    pub levels: Vec<usize>,
    /// factors without any covariate signal
    pub noise_factors: usize,
    /// shift of the planted factor within its level
    pub effect: f32,
    /// fraction of labels replaced by `NA`
    pub na_fraction: f32,
    pub rseed: u64,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            obs: 500,
            levels: vec![2, 3],
            noise_factors: 2,
            effect: 3.0,
            na_fraction: 0.0,
            rseed: 42,
        }
    }
}

pub struct SimOut {
    pub scores: ScoreMatrix,
    pub covariates: Vec<CovariateVector>,
    /// (covariate, level, factor) of every planted association
    pub planted: Vec<(Box<str>, Box<str>, Box<str>)>,
}

/// Generate factor scores in which each level of each covariate
/// shifts its own factor
///
/// ```text
/// X(i,k) = effect * 1[ C(i) = level(k) ] + N(0, 1)
/// ```
///
/// Noise factors follow `N(0, 1)` only.
pub fn generate_planted_scores(args: &SimArgs) -> anyhow::Result<SimOut> {
    if args.obs == 0 {
        return Err(anyhow::anyhow!("need at least one observation"));
    }
    if let Some(&nl) = args.levels.iter().find(|&&nl| nl == 0 || nl > args.obs) {
        return Err(anyhow::anyhow!(
            "can't spread {} observations over {} levels",
            args.obs,
            nl
        ));
    }
    if !(0.0..1.0).contains(&args.na_fraction) {
        return Err(anyhow::anyhow!(
            "NA fraction {} not in [0, 1)",
            args.na_fraction
        ));
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(args.rseed);
    let normal = Normal::new(0_f32, 1_f32).map_err(|e| anyhow::anyhow!("{}", e))?;

    let nn = args.obs;
    let kk = args.levels.iter().sum::<usize>() + args.noise_factors;

    let mut mat = Mat::from_fn(nn, kk, |_, _| normal.sample(&mut rng));

    let mut covariates = Vec::with_capacity(args.levels.len());
    let mut planted = vec![];
    let mut k = 0;

    for (c, &nlevels) in args.levels.iter().enumerate() {
        let cov_name = format!("cov{}", c + 1);

        // balanced, then shuffled
        let mut membership: Vec<usize> = (0..nn).map(|i| i % nlevels).collect();
        membership.shuffle(&mut rng);

        for (i, &m) in membership.iter().enumerate() {
            mat[(i, k + m)] += args.effect;
        }

        for l in 0..nlevels {
            planted.push((
                cov_name.clone().into_boxed_str(),
                format!("L{}", l + 1).into_boxed_str(),
                format!("F{}", k + 1).into_boxed_str(),
            ));
            k += 1;
        }

        let labels: Vec<Box<str>> = membership
            .iter()
            .map(|&m| {
                if rng.random::<f32>() < args.na_fraction {
                    MISSING_LABEL.into()
                } else {
                    format!("L{}", m + 1).into_boxed_str()
                }
            })
            .collect();

        covariates.push(CovariateVector::new(&cov_name, labels));
    }

    let obs = (0..nn).map(|i| format!("obs{}", i + 1).into_boxed_str()).collect();
    let factors = (0..kk).map(|k| format!("F{}", k + 1).into_boxed_str()).collect();

    info!(
        "simulated {} observations x {} factors ({} planted)",
        nn,
        kk,
        planted.len()
    );

    Ok(SimOut {
        scores: ScoreMatrix::new(obs, factors, mat)?,
        covariates,
        planted,
    })
}

impl SimOut {
    /// One table: observation id, factor scores, covariate labels
    pub fn to_file(&self, file: &str) -> anyhow::Result<()> {
        let delim = if file.ends_with(".csv") || file.ends_with(".csv.gz") {
            ","
        } else {
            "\t"
        };

        let header: Vec<&str> = std::iter::once("obs")
            .chain(self.scores.factors().iter().map(|x| x.as_ref()))
            .chain(self.covariates.iter().map(|c| c.name()))
            .collect();

        let mat = self.scores.mat();
        let mut lines: Vec<Box<str>> = vec![header.join(delim).into()];

        for (i, obs) in self.scores.obs().iter().enumerate() {
            let fields: Vec<String> = std::iter::once(obs.to_string())
                .chain(mat.row(i).iter().map(|x| x.to_string()))
                .chain(self.covariates.iter().map(|c| c.labels()[i].to_string()))
                .collect();
            lines.push(fields.join(delim).into());
        }

        write_lines(&lines, file)
    }

    /// `covariate level factor` of the planted associations
    pub fn planted_to_file(&self, file: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = std::iter::once(Box::from("covariate\tlevel\tfactor"))
            .chain(
                self.planted
                    .iter()
                    .map(|(c, l, f)| format!("{}\t{}\t{}", c, l, f).into_boxed_str()),
            )
            .collect();
        write_lines(&lines, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_and_balanced() -> anyhow::Result<()> {
        let args = SimArgs::default();
        let a = generate_planted_scores(&args)?;
        let b = generate_planted_scores(&args)?;

        assert_eq!(a.scores.mat(), b.scores.mat());
        assert_eq!(a.scores.num_factors(), 2 + 3 + 2);
        assert_eq!(a.planted.len(), 5);
        assert_eq!(a.covariates[1].levels().len(), 3);
        assert_eq!(a.covariates[0].num_missing(), 0);
        Ok(())
    }

    #[test]
    fn missing_labels() -> anyhow::Result<()> {
        let args = SimArgs {
            na_fraction: 0.2,
            ..SimArgs::default()
        };
        let sim = generate_planted_scores(&args)?;
        let nmiss = sim.covariates[0].num_missing();
        assert!(nmiss > 50 && nmiss < 150, "{}", nmiss);
        Ok(())
    }

    #[test]
    fn bad_arguments() {
        let args = SimArgs {
            levels: vec![0],
            ..SimArgs::default()
        };
        assert!(generate_planted_scores(&args).is_err());
    }
}
