//! Membership maps from observation keys to categorical labels.
//!
//! A membership file is a delimited table (TSV/CSV, optionally
//! gzipped). Keys and labels are taken from columns chosen either by
//! index or by header name.

use crate::common_io::{detect_delimiter, read_lines_of_words_delim, ReadLinesOut};
use fnv::FnvHashMap as HashMap;
use log::info;

/// A membership mapping from keys to groups/categories
#[derive(Clone)]
pub struct Membership {
    map: HashMap<Box<str>, Box<str>>,
}

/// Statistics about membership matching
#[derive(Debug, Default, Clone)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
}

impl MatchStats {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

/// Which column of a membership file to take
#[derive(Clone, Debug)]
pub enum MembershipColumn {
    Index(usize),
    Name(Box<str>),
}

impl MembershipColumn {
    fn resolve(&self, header: &[Box<str>], file_path: &str) -> anyhow::Result<usize> {
        match self {
            MembershipColumn::Index(j) => Ok(*j),
            MembershipColumn::Name(name) => header
                .iter()
                .position(|x| x.as_ref() == name.as_ref())
                .ok_or(anyhow::anyhow!("no column `{}` in {}", name, file_path)),
        }
    }
}

impl Membership {
    /// Load membership from a file with a header line, picking the
    /// key and value columns by index or name. A header that omits
    /// the name of the first (key) column is accepted.
    pub fn from_file_with_header(
        file_path: &str,
        key_col: &MembershipColumn,
        value_col: &MembershipColumn,
    ) -> anyhow::Result<Self> {
        let ReadLinesOut { lines, header } =
            read_lines_of_words_delim(file_path, detect_delimiter(file_path), 0)?;

        let ncol_data = lines.first().map(|x| x.len()).unwrap_or(header.len());
        let header: Vec<Box<str>> = if header.len() + 1 == ncol_data {
            std::iter::once(Box::from("")).chain(header).collect()
        } else {
            header
        };

        let key_col = key_col.resolve(&header, file_path)?;
        let value_col = value_col.resolve(&header, file_path)?;
        Self::from_lines(file_path, lines, key_col, value_col)
    }

    fn from_lines(
        file_path: &str,
        lines: Vec<Vec<Box<str>>>,
        key_col: usize,
        value_col: usize,
    ) -> anyhow::Result<Self> {
        if lines.is_empty() {
            anyhow::bail!("Membership file is empty: {}", file_path);
        }

        let max_col = key_col.max(value_col);
        if lines[0].len() <= max_col {
            anyhow::bail!(
                "Membership file has {} columns but requested column index {}",
                lines[0].len(),
                max_col
            );
        }

        let mut map = HashMap::default();

        for line in lines {
            if line.len() <= max_col {
                log::warn!("Skipping malformed line with {} columns", line.len());
                continue;
            }
            map.insert(line[key_col].clone(), line[value_col].clone());
        }

        info!("Loaded {} entries from {}", map.len(), file_path);

        Ok(Self { map })
    }

    /// Assign a label to every query key in order; unmatched keys
    /// receive `missing`.
    pub fn align_keys(&self, query_keys: &[Box<str>], missing: &str) -> (Vec<Box<str>>, MatchStats) {
        use indicatif::ParallelProgressIterator;
        use rayon::prelude::*;

        let matches: Vec<Option<Box<str>>> = query_keys
            .par_iter()
            .progress_count(query_keys.len() as u64)
            .map(|key| self.map.get(key).cloned())
            .collect();

        let mut stats = MatchStats::default();
        let labels = matches
            .into_iter()
            .map(|m| match m {
                Some(value) => {
                    stats.matched += 1;
                    value
                }
                None => {
                    stats.unmatched += 1;
                    Box::from(missing)
                }
            })
            .collect();

        (labels, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_align_keys() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "cell\tgroup").unwrap();
        writeln!(file, "AAACCT\tgroup_A").unwrap();
        writeln!(file, "BBBCCT\tgroup_B").unwrap();
        writeln!(file, "CCCCCT\tgroup_A").unwrap();
        file.flush().unwrap();

        let membership = Membership::from_file_with_header(
            file.path().to_str().unwrap(),
            &MembershipColumn::Index(0),
            &MembershipColumn::Index(1),
        )
        .unwrap();

        let queries: Vec<Box<str>> = vec!["CCCCCT".into(), "AAACCT-1".into(), "BBBCCT".into()];
        let (labels, stats) = membership.align_keys(&queries, "NA");

        assert_eq!(stats.matched, 2);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(
            labels,
            vec![Box::from("group_A"), Box::from("NA"), Box::from("group_B")]
        );
    }

    #[test]
    fn test_header_by_name() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, ",sample,cell_line").unwrap();
        writeln!(file, "c1,s1,H1975").unwrap();
        writeln!(file, "c2,s2,H2228").unwrap();
        file.flush().unwrap();

        let membership = Membership::from_file_with_header(
            file.path().to_str().unwrap(),
            &MembershipColumn::Index(0),
            &MembershipColumn::Name("cell_line".into()),
        )
        .unwrap();

        let queries: Vec<Box<str>> = vec!["c2".into(), "c1".into()];
        let (labels, _) = membership.align_keys(&queries, "NA");
        assert_eq!(labels, vec![Box::from("H2228"), Box::from("H1975")]);
        assert!(Membership::from_file_with_header(
            file.path().to_str().unwrap(),
            &MembershipColumn::Index(0),
            &MembershipColumn::Name("batch".into()),
        )
        .is_err());
    }
}
