use crate::common::*;
use std::collections::HashSet;
use std::str::FromStr;

/// How factor columns are picked out of a score table header
#[derive(Clone, Debug, PartialEq)]
pub enum FactorColumns {
    /// exactly these columns, in this order
    Explicit(Vec<Box<str>>),
    /// columns named by the prefix followed by digits, e.g., `F1`,
    /// `F2`, ... for `F`, or `Pattern1`, ... for `Pattern`
    Prefix(Box<str>),
}

impl FactorColumns {
    /// Resolve into an explicit list of column names found in `header`
    pub fn resolve(&self, header: &[Box<str>]) -> Result<Vec<Box<str>>> {
        let available: HashSet<&str> = header.iter().map(|x| x.as_ref()).collect();

        let ret: Vec<Box<str>> = match self {
            FactorColumns::Explicit(names) => {
                if let Some(x) = names.iter().find(|x| !available.contains(x.as_ref())) {
                    return Err(LentilError::InvalidFactorColumns(format!(
                        "`{}` is not in the header",
                        x
                    )));
                }
                names.clone()
            }
            FactorColumns::Prefix(prefix) => header
                .iter()
                .filter(|x| is_prefixed_index(x, prefix))
                .cloned()
                .collect(),
        };

        validate_factor_names(&ret)?;
        Ok(ret)
    }
}

fn is_prefixed_index(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Reject empty or ambiguous (duplicated) factor identifiers
pub fn validate_factor_names(names: &[Box<str>]) -> Result<()> {
    if names.is_empty() {
        return Err(LentilError::InvalidFactorColumns(
            "no factor column selected".into(),
        ));
    }

    if let Some(x) = names.iter().find(|x| x.trim().is_empty()) {
        return Err(LentilError::InvalidFactorColumns(format!(
            "blank factor name `{}`",
            x
        )));
    }

    let mut seen = HashSet::with_capacity(names.len());
    for x in names {
        if !seen.insert(x.as_ref()) {
            return Err(LentilError::InvalidFactorColumns(format!(
                "`{}` appears more than once",
                x
            )));
        }
    }
    Ok(())
}

/// `prefix:F` or `columns:F1,F2,F3`
impl FromStr for FactorColumns {
    type Err = LentilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some(("prefix", p)) if !p.is_empty() => Ok(FactorColumns::Prefix(p.into())),
            Some(("columns", cols)) => Ok(FactorColumns::Explicit(
                cols.split(',')
                    .map(|x| x.trim())
                    .filter(|x| !x.is_empty())
                    .map(Box::from)
                    .collect(),
            )),
            _ => Err(LentilError::Configuration(format!(
                "factor selector `{}` should look like `prefix:F` or `columns:F1,F2`",
                s
            ))),
        }
    }
}

/// Factor scores of one method: observations (rows) x factors
/// (columns). Validated on construction and immutable afterwards.
#[derive(Clone, Debug)]
pub struct ScoreMatrix {
    obs: Vec<Box<str>>,
    factors: Vec<Box<str>>,
    mat: Mat,
}

impl ScoreMatrix {
    pub fn new(obs: Vec<Box<str>>, factors: Vec<Box<str>>, mat: Mat) -> Result<Self> {
        validate_factor_names(&factors)?;

        if mat.ncols() != factors.len() {
            return Err(LentilError::InvalidFactorColumns(format!(
                "{} factor names for {} columns",
                factors.len(),
                mat.ncols()
            )));
        }

        if mat.nrows() == 0 {
            return Err(LentilError::EmptyTable("score matrix has no rows".into()));
        }

        if obs.len() != mat.nrows() {
            return Err(LentilError::Configuration(format!(
                "{} observation names for {} rows",
                obs.len(),
                mat.nrows()
            )));
        }

        for (j, x_j) in mat.column_iter().enumerate() {
            if let Some(i) = x_j.iter().position(|x| !x.is_finite()) {
                return Err(LentilError::NonFiniteScore {
                    row: i,
                    factor: factors[j].to_string(),
                });
            }
        }

        Ok(Self { obs, factors, mat })
    }

    /// Name factors `F1, F2, ...` and observations by their row index
    pub fn from_mat(mat: Mat) -> Result<Self> {
        let obs = (0..mat.nrows()).map(|i| i.to_string().into()).collect();
        let factors = (1..=mat.ncols()).map(|k| format!("F{}", k).into()).collect();
        Self::new(obs, factors, mat)
    }

    pub fn obs(&self) -> &[Box<str>] {
        &self.obs
    }

    pub fn factors(&self) -> &[Box<str>] {
        &self.factors
    }

    pub fn mat(&self) -> &Mat {
        &self.mat
    }

    pub fn num_obs(&self) -> usize {
        self.mat.nrows()
    }

    pub fn num_factors(&self) -> usize {
        self.mat.ncols()
    }

    /// Multiply every score by a constant
    pub fn scaled_by(&self, a: f32) -> Result<Self> {
        Self::new(self.obs.clone(), self.factors.clone(), &self.mat * a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Box<str>> {
        names.iter().map(|&x| Box::from(x)).collect()
    }

    #[test]
    fn prefix_selects_indexed_columns_only() -> Result<()> {
        let hdr = header(&["", "F1", "F2", "F10", "Fx", "sample", "FACS", "W1"]);
        let cols = FactorColumns::Prefix("F".into()).resolve(&hdr)?;
        assert_eq!(cols, header(&["F1", "F2", "F10"]));

        let cols = "prefix:W".parse::<FactorColumns>()?.resolve(&hdr)?;
        assert_eq!(cols, header(&["W1"]));
        Ok(())
    }

    #[test]
    fn reject_empty_missing_and_duplicated_columns() {
        let hdr = header(&["cell", "F1", "F2", "sample"]);

        let empty = FactorColumns::Prefix("Pattern".into()).resolve(&hdr);
        assert!(matches!(empty, Err(LentilError::InvalidFactorColumns(_))));

        let missing = FactorColumns::Explicit(header(&["F1", "F3"])).resolve(&hdr);
        assert!(matches!(missing, Err(LentilError::InvalidFactorColumns(_))));

        let dup = FactorColumns::Explicit(header(&["F1", "F1"])).resolve(&hdr);
        assert!(matches!(dup, Err(LentilError::InvalidFactorColumns(_))));
    }

    #[test]
    fn parse_selector() {
        assert_eq!(
            "columns:F1, F2".parse::<FactorColumns>(),
            Ok(FactorColumns::Explicit(header(&["F1", "F2"])))
        );
        assert!(matches!(
            "F".parse::<FactorColumns>(),
            Err(LentilError::Configuration(_))
        ));
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let mut mat = Mat::zeros(3, 2);
        mat[(2, 1)] = f32::NAN;
        let ret = ScoreMatrix::from_mat(mat);
        assert_eq!(
            ret.err(),
            Some(LentilError::NonFiniteScore {
                row: 2,
                factor: "F2".into()
            })
        );
    }
}
