use crate::common::*;
use matrix_util::utils::{partition_by_membership, sorted_unique};
use std::collections::HashSet;

/// Categorical labels of one covariate, aligned with the rows of a
/// score matrix. `NA` marks observations of unknown level.
#[derive(Clone, Debug)]
pub struct CovariateVector {
    name: Box<str>,
    labels: Vec<Box<str>>,
    levels: Vec<Box<str>>,
}

impl CovariateVector {
    /// Levels are the sorted distinct labels
    pub fn new(name: &str, labels: Vec<Box<str>>) -> Self {
        let levels = sorted_unique(&labels);
        Self {
            name: name.into(),
            labels,
            levels,
        }
    }

    /// Declare the levels explicitly, e.g., all the categories of a
    /// study design, some of which may have no observations. Every
    /// non-missing label must be one of the declared levels; `NA` is
    /// appended when present in the labels.
    pub fn with_levels(name: &str, labels: Vec<Box<str>>, levels: Vec<Box<str>>) -> Result<Self> {
        let mut declared = HashSet::with_capacity(levels.len());
        for x in levels.iter() {
            if !declared.insert(x.as_ref()) {
                return Err(LentilError::Configuration(format!(
                    "level `{}` of covariate `{}` declared twice",
                    x, name
                )));
            }
        }

        if let Some(x) = labels
            .iter()
            .find(|x| !is_missing_label(x) && !declared.contains(x.as_ref()))
        {
            return Err(LentilError::Configuration(format!(
                "label `{}` is not a declared level of covariate `{}`",
                x, name
            )));
        }

        let na_declared = declared.contains(MISSING_LABEL);
        let mut levels = levels;
        if !na_declared && labels.iter().any(|x| is_missing_label(x)) {
            levels.push(MISSING_LABEL.into());
        }

        Ok(Self {
            name: name.into(),
            labels,
            levels,
        })
    }

    pub fn from_strs(name: &str, labels: &[&str]) -> Self {
        Self::new(name, labels.iter().map(|&x| Box::from(x)).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[Box<str>] {
        &self.labels
    }

    pub fn levels(&self) -> &[Box<str>] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_missing(&self) -> usize {
        self.labels.iter().filter(|x| is_missing_label(x)).count()
    }

    /// Observation indexes of every level, in level order
    ///
    /// * `nobs` - the number of rows this covariate must align with
    pub fn level_indices(&self, nobs: usize) -> Result<Vec<(Box<str>, Vec<usize>)>> {
        if self.labels.len() != nobs {
            return Err(LentilError::ShapeMismatch {
                covariate: self.name.to_string(),
                expected: nobs,
                actual: self.labels.len(),
            });
        }

        let mut groups = partition_by_membership(&self.labels);

        self.levels
            .iter()
            .map(|level| match groups.remove(level) {
                Some(idx) if !idx.is_empty() => Ok((level.clone(), idx)),
                _ => Err(LentilError::EmptyLevel {
                    covariate: self.name.to_string(),
                    level: level.to_string(),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_sorted_and_distinct() -> Result<()> {
        let cov = CovariateVector::from_strs("stim", &["stim", "ctrl", "NA", "stim"]);
        assert_eq!(
            cov.levels(),
            &[Box::from("NA"), Box::from("ctrl"), Box::from("stim")]
        );
        assert_eq!(cov.num_missing(), 1);

        let idx = cov.level_indices(4)?;
        assert_eq!(idx[2].1, vec![0, 3]);
        Ok(())
    }

    #[test]
    fn length_mismatch() {
        let cov = CovariateVector::from_strs("sample", &["a", "b"]);
        assert_eq!(
            cov.level_indices(3).err(),
            Some(LentilError::ShapeMismatch {
                covariate: "sample".into(),
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn declared_level_without_observation() -> Result<()> {
        let labels = vec![Box::from("a"), Box::from("a"), Box::from("NA")];
        let levels = vec![Box::from("a"), Box::from("b")];
        let cov = CovariateVector::with_levels("cell_type", labels, levels)?;

        assert_eq!(cov.levels().len(), 3);
        assert!(matches!(
            cov.level_indices(3),
            Err(LentilError::EmptyLevel { ref level, .. }) if level == "b"
        ));
        Ok(())
    }

    #[test]
    fn undeclared_label() {
        let labels = vec![Box::from("a"), Box::from("c")];
        let levels = vec![Box::from("a"), Box::from("b")];
        assert!(matches!(
            CovariateVector::with_levels("x", labels, levels),
            Err(LentilError::Configuration(_))
        ));
    }
}
