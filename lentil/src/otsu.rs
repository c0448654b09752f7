use crate::common::*;
use matrix_util::common_io::write_lines;

/// Number of histogram bins for Otsu's method
pub const OTSU_NUM_BINS: usize = 256;

/// Otsu threshold together with the histogram it was chosen from
#[derive(Clone, Debug)]
pub struct OtsuThreshold {
    pub threshold: f32,
    /// the input was constant and the threshold is that constant
    pub degenerate: bool,
    /// `nbins + 1` bin edges
    pub bin_edges: Vec<f32>,
    pub bin_counts: Vec<usize>,
}

impl OtsuThreshold {
    /// Choose the bin boundary that maximizes the between-class
    /// variance `w0 * w1 * (mu0 - mu1)^2` of the two classes below
    /// and above it. The first maximum wins ties.
    ///
    /// * `values` - finite values
    /// * `nbins` - number of equal-width bins over `[min, max]`
    pub fn estimate(values: &[f32], nbins: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(LentilError::EmptyTable(
                "no score to threshold".into(),
            ));
        }
        if nbins < 2 {
            return Err(LentilError::Configuration(format!(
                "Otsu's method needs at least 2 bins, got {}",
                nbins
            )));
        }
        if values.iter().any(|x| !x.is_finite()) {
            return Err(LentilError::Configuration(
                "can't threshold non-finite scores".into(),
            ));
        }

        let lb = values.iter().copied().fold(f32::INFINITY, f32::min);
        let ub = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        if ub <= lb {
            warn!("constant score distribution; threshold = {}", lb);
            return Ok(Self {
                threshold: lb,
                degenerate: true,
                bin_edges: vec![lb, ub],
                bin_counts: vec![values.len()],
            });
        }

        let width = (ub - lb) / nbins as f32;
        let bin_edges: Vec<f32> = (0..=nbins)
            .map(|k| if k == nbins { ub } else { lb + k as f32 * width })
            .collect();

        // bin `b` holds `edges[b] <= x < edges[b+1]`, so a value equal
        // to the returned edge always falls in the upper class
        let bin_of = |x: f32| -> usize {
            let mut b = (((x - lb) / width).floor() as usize).min(nbins - 1);
            while b > 0 && x < bin_edges[b] {
                b -= 1;
            }
            while b + 1 < nbins && x >= bin_edges[b + 1] {
                b += 1;
            }
            b
        };

        let mut counts = vec![0_usize; nbins];
        let mut sums = vec![0_f64; nbins];
        for &x in values {
            let b = bin_of(x);
            counts[b] += 1;
            sums[b] += x as f64;
        }

        let ntot = values.len() as f64;
        let stot: f64 = sums.iter().sum();

        let mut best = (f64::NEG_INFINITY, 0_usize);
        let (mut n0, mut s0) = (0_f64, 0_f64);

        // boundary between bin k and bin k+1
        for k in 0..(nbins - 1) {
            n0 += counts[k] as f64;
            s0 += sums[k];
            let n1 = ntot - n0;
            if n0 <= 0. || n1 <= 0. {
                continue;
            }
            let mu0 = s0 / n0;
            let mu1 = (stot - s0) / n1;
            let between = (n0 / ntot) * (n1 / ntot) * (mu0 - mu1).powi(2);
            if between > best.0 {
                best = (between, k);
            }
        }

        let threshold = bin_edges[best.1 + 1].clamp(lb, ub);

        Ok(Self {
            threshold,
            degenerate: false,
            bin_edges,
            bin_counts: counts,
        })
    }

    /// `lb ub count` per bin, then the threshold on a comment line
    pub fn to_file(&self, file: &str) -> anyhow::Result<()> {
        let mut lines: Vec<Box<str>> = vec![
            format!("#threshold\t{}", self.threshold).into(),
            "lb\tub\tcount".into(),
        ];
        for (k, n) in self.bin_counts.iter().enumerate() {
            lines.push(format!("{}\t{}\t{}", self.bin_edges[k], self.bin_edges[k + 1], n).into());
        }
        write_lines(&lines, file)
    }
}

/// Otsu threshold of flattened association scores with
/// [`OTSU_NUM_BINS`] bins. A constant input returns that constant.
pub fn get_otsu_threshold(values: &[f32]) -> Result<f32> {
    Ok(OtsuThreshold::estimate(values, OTSU_NUM_BINS)?.threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_two_clusters() -> Result<()> {
        let mut scores = vec![0.1_f32; 80];
        scores.extend(vec![0.9_f32; 20]);
        let t = get_otsu_threshold(&scores)?;
        assert!(t > 0.1 && t <= 0.9, "threshold = {}", t);
        assert_eq!(scores.iter().filter(|&&x| x >= t).count(), 20);
        Ok(())
    }

    #[test]
    fn threshold_within_range() -> Result<()> {
        let scores: Vec<f32> = (0..1000)
            .map(|i| ((i as f32) * 0.37).sin() * 3.0 + (i % 7) as f32)
            .collect();
        let lb = scores.iter().copied().fold(f32::INFINITY, f32::min);
        let ub = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let otsu = OtsuThreshold::estimate(&scores, OTSU_NUM_BINS)?;
        assert!(!otsu.degenerate);
        assert!(otsu.threshold >= lb && otsu.threshold <= ub);
        assert_eq!(otsu.bin_counts.iter().sum::<usize>(), scores.len());
        assert_eq!(otsu.bin_edges.len(), OTSU_NUM_BINS + 1);
        Ok(())
    }

    #[test]
    fn constant_input_returns_the_constant() -> Result<()> {
        let otsu = OtsuThreshold::estimate(&[0.25; 12], OTSU_NUM_BINS)?;
        assert!(otsu.degenerate);
        assert_eq!(otsu.threshold, 0.25);
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let scores: Vec<f32> = (0..500).map(|i| ((i * 7919) % 101) as f32 / 10.0).collect();
        assert_eq!(get_otsu_threshold(&scores)?, get_otsu_threshold(&scores)?);
        Ok(())
    }

    #[test]
    fn values_on_the_threshold_are_in_the_upper_class() -> Result<()> {
        let (lb, ub) = (-1.0_f32, 0.3_f32);
        let width = (ub - lb) / OTSU_NUM_BINS as f32;

        for k in 1..OTSU_NUM_BINS {
            let edge = lb + k as f32 * width;
            let mut scores = vec![lb; 10];
            scores.push(edge);
            scores.extend(vec![ub; 10]);

            let otsu = OtsuThreshold::estimate(&scores, OTSU_NUM_BINS)?;
            let n_above = scores.iter().filter(|&&x| x >= otsu.threshold).count();
            let n_upper: usize = otsu
                .bin_edges
                .iter()
                .zip(otsu.bin_counts.iter())
                .filter(|&(&e, _)| e >= otsu.threshold)
                .map(|(_, &n)| n)
                .sum();
            assert_eq!(n_above, n_upper, "edge {} at bin {}", edge, k);
        }
        Ok(())
    }

    #[test]
    fn empty_or_non_finite_input() {
        assert!(get_otsu_threshold(&[]).is_err());
        assert!(get_otsu_threshold(&[0.0, f32::NAN]).is_err());
    }
}
