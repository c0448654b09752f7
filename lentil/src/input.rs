//! Score tables, covariate labels, and method manifests from files

use crate::common::*;
use crate::covariate::CovariateVector;
use crate::score_matrix::{FactorColumns, ScoreMatrix};

use matrix_util::common_io::{detect_delimiter, peek_header, read_lines_of_words_delim};
use matrix_util::membership::{Membership, MembershipColumn};
use matrix_util::traits::{IoOps, MatWithNames};
use std::path::Path;

/// Read factor scores and covariate labels.
///
/// * `score_file` - observations x columns with a header line; the
///   first column holds observation ids
/// * `factors` - which columns are factors
/// * `covariate_names` - covariate columns of `meta_file`, or of
///   `score_file` itself when no `meta_file` is given
/// * `meta_file` - observation ids in the first column; ids missing
///   here are labelled `NA`
pub fn read_score_table(
    score_file: &str,
    factors: &FactorColumns,
    covariate_names: &[Box<str>],
    meta_file: Option<&str>,
) -> anyhow::Result<(ScoreMatrix, Vec<CovariateVector>)> {
    let delim = detect_delimiter(score_file);
    let header = peek_header(score_file, delim.clone())?;
    let factor_names = factors.resolve(&header)?;

    let MatWithNames {
        rows: obs,
        cols,
        mat,
    } = Mat::read_names_delim(score_file, delim, Some(factor_names.as_slice()))?;

    info!(
        "read {} observations x {} factors from {}",
        obs.len(),
        cols.len(),
        score_file
    );

    let scores = ScoreMatrix::new(obs, cols, mat)?;

    let label_file = meta_file.unwrap_or(score_file);
    let covariates = covariate_names
        .iter()
        .map(|name| read_covariate(label_file, name, scores.obs()))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok((scores, covariates))
}

/// Labels of one covariate column, aligned to `obs`
pub fn read_covariate(
    label_file: &str,
    name: &str,
    obs: &[Box<str>],
) -> anyhow::Result<CovariateVector> {
    let membership = Membership::from_file_with_header(
        label_file,
        &MembershipColumn::Index(0),
        &MembershipColumn::Name(name.into()),
    )?;

    let (labels, stats) = membership.align_keys(obs, MISSING_LABEL);

    if stats.matched == 0 {
        return Err(anyhow::anyhow!(
            "no observation id found in {} for covariate `{}`",
            label_file,
            name
        ));
    }
    if stats.unmatched > 0 {
        warn!(
            "{} of {} observations have no `{}` label in {}",
            stats.unmatched,
            stats.total(),
            name,
            label_file
        );
    }

    let labels = labels
        .into_iter()
        .map(|x| if x.is_empty() { MISSING_LABEL.into() } else { x })
        .collect();

    Ok(CovariateVector::new(name, labels))
}

/// Numeric values of one column, aligned to `obs`. Every observation
/// needs a finite value.
pub fn read_numeric_column(
    file: &str,
    name: &str,
    obs: &[Box<str>],
) -> anyhow::Result<Vec<f32>> {
    let membership = Membership::from_file_with_header(
        file,
        &MembershipColumn::Index(0),
        &MembershipColumn::Name(name.into()),
    )?;

    let (values, stats) = membership.align_keys(obs, MISSING_LABEL);

    if stats.unmatched > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} observations have no `{}` value in {}",
            stats.unmatched,
            stats.total(),
            name,
            file
        ));
    }

    values
        .iter()
        .zip(obs.iter())
        .map(|(x, id)| match x.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(anyhow::anyhow!(
                "`{}` of {} is not a finite number: `{}`",
                name,
                id,
                x
            )),
        })
        .collect()
}

/// One method of a comparison run
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestEntry {
    pub method: Box<str>,
    pub score_file: Box<str>,
    pub run_time: Option<f64>,
    pub factors: FactorColumns,
}

/// Parse a tab-separated manifest:
///
/// ```text
/// method  score_file  run_time|NA  prefix:F|columns:F1,F2
/// ```
///
/// The factor selector may be left out to fall back on `default_factors`.
/// Relative score files are relative to the manifest's directory. A
/// first line starting with `method` is taken as a header.
pub fn read_manifest(
    manifest_file: &str,
    default_factors: &FactorColumns,
) -> anyhow::Result<Vec<ManifestEntry>> {
    let lines = read_lines_of_words_delim(manifest_file, "\t", -1)?.lines;
    let base_dir = Path::new(manifest_file).parent();

    let mut ret = Vec::with_capacity(lines.len());

    for (i, words) in lines.iter().enumerate() {
        if i == 0 && words.first().map(|x| x.as_ref()) == Some("method") {
            continue;
        }

        if words.len() < 3 || words.len() > 4 {
            return Err(anyhow::anyhow!(
                "line {} of {} has {} fields; expected `method score_file run_time [factors]`",
                i + 1,
                manifest_file,
                words.len()
            ));
        }

        let run_time = match words[2].as_ref() {
            x if is_missing_label(x) || x.is_empty() => None,
            x => Some(x.parse::<f64>().map_err(|e| {
                anyhow::anyhow!("bad run time `{}` for {}: {}", x, words[0], e)
            })?),
        };

        let factors = match words.get(3) {
            Some(x) if !x.is_empty() => x.parse::<FactorColumns>()?,
            _ => default_factors.clone(),
        };

        let score_file = match base_dir {
            Some(dir) if Path::new(words[1].as_ref()).is_relative() => dir
                .join(words[1].as_ref())
                .to_string_lossy()
                .into_owned()
                .into_boxed_str(),
            _ => words[1].clone(),
        };

        ret.push(ManifestEntry {
            method: words[0].clone(),
            score_file,
            run_time,
            factors,
        });
    }

    crate::pipeline::check_method_names(ret.iter().map(|x| x.method.as_ref()))?;

    info!("{} methods in {}", ret.len(), manifest_file);
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_util::common_io::{write_lines, create_temp_dir_file};

    fn write(file: &str, lines: &[&str]) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = lines.iter().map(|&x| x.into()).collect();
        write_lines(&lines, file)
    }

    #[test]
    fn scores_and_inline_covariates() -> anyhow::Result<()> {
        let file = create_temp_dir_file(".tsv.gz")?;
        let file = file.to_str().unwrap();
        write(
            file,
            &[
                "cell\tF1\tF2\tstim\tnot_a_factor",
                "c1\t1\t0\tctrl\t7",
                "c2\t1\t0\tctrl\t7",
                "c3\t0\t1\tstim\t7",
                "c4\t0\t1\t\t7",
            ],
        )?;

        let (scores, covs) =
            read_score_table(file, &FactorColumns::Prefix("F".into()), &["stim".into()], None)?;

        assert_eq!(scores.factors(), &[Box::from("F1"), Box::from("F2")]);
        assert_eq!(scores.num_obs(), 4);
        assert_eq!(covs[0].labels()[3].as_ref(), "NA");
        assert_eq!(covs[0].num_missing(), 1);
        Ok(())
    }

    #[test]
    fn covariates_from_meta() -> anyhow::Result<()> {
        let score_file = create_temp_dir_file(".csv")?;
        let meta_file = create_temp_dir_file(".tsv")?;
        let score_file = score_file.to_str().unwrap();
        let meta_file = meta_file.to_str().unwrap();

        write(score_file, &["F1,F2", "c1,1,0", "c2,0,1", "c3,0,1"])?;
        write(meta_file, &["cell\ttype", "c2\tT", "c1\tB"])?;

        let (_, covs) = read_score_table(
            score_file,
            &FactorColumns::Explicit(vec!["F2".into(), "F1".into()]),
            &["type".into()],
            Some(meta_file),
        )?;
        let labels: Vec<&str> = covs[0].labels().iter().map(|x| x.as_ref()).collect();
        assert_eq!(labels, vec!["B", "T", "NA"]);
        Ok(())
    }

    #[test]
    fn library_size_column() -> anyhow::Result<()> {
        let file = create_temp_dir_file(".tsv")?;
        let file = file.to_str().unwrap();
        write(file, &["cell\tnCount", "c2\t200", "c1\t100", "c3\tNA"])?;

        let obs: Vec<Box<str>> = vec!["c1".into(), "c2".into()];
        assert_eq!(read_numeric_column(file, "nCount", &obs)?, vec![100., 200.]);

        let obs: Vec<Box<str>> = vec!["c1".into(), "c3".into()];
        assert!(read_numeric_column(file, "nCount", &obs).is_err());

        let obs: Vec<Box<str>> = vec!["c1".into(), "c4".into()];
        assert!(read_numeric_column(file, "nCount", &obs).is_err());
        Ok(())
    }

    #[test]
    fn manifest_lines() -> anyhow::Result<()> {
        let file = create_temp_dir_file(".tsv")?;
        let file = file.to_str().unwrap();
        write(
            file,
            &[
                "method\tfile\trun_time\tfactors",
                "pca\tpca.tsv\t12.5\tprefix:PC",
                "nmf\t/tmp/nmf.tsv\tNA",
            ],
        )?;

        let entries = read_manifest(file, &FactorColumns::Prefix("F".into()))?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].run_time, Some(12.5));
        assert_eq!(entries[0].factors, FactorColumns::Prefix("PC".into()));
        assert!(entries[0].score_file.ends_with("pca.tsv"));
        assert_eq!(entries[1].run_time, None);
        assert_eq!(entries[1].score_file.as_ref(), "/tmp/nmf.tsv");

        write(file, &["pca\ta.tsv\tNA", "pca\tb.tsv\tNA"])?;
        assert!(read_manifest(file, &FactorColumns::Prefix("F".into())).is_err());
        Ok(())
    }
}
