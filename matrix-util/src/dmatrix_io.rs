use crate::common_io::{read_lines_of_words_delim, write_lines, Delimiter, ReadLinesOut};
use crate::traits::*;
pub use nalgebra::{DMatrix, DVector};

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::str::FromStr;

fn parse_field<T>(word: &str, row: usize, col: usize, file: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: Debug,
{
    word.parse::<T>().map_err(|e| {
        anyhow::anyhow!(
            "failed to parse `{}` at row {}, column {} in {}: {:?}",
            word,
            row,
            col,
            file,
            e
        )
    })
}

impl<T> IoOps for DMatrix<T>
where
    T: nalgebra::Scalar + Send + FromStr + Display + Copy,
    <T as FromStr>::Err: Debug,
{
    type Scalar = T;
    type Mat = Self;

    fn read_names_delim(
        file_path: &str,
        delim: impl Into<Delimiter>,
        column_names: Option<&[Box<str>]>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>> {
        let ReadLinesOut { lines, header } = read_lines_of_words_delim(file_path, delim, 0)?;

        if header.is_empty() {
            return Err(anyhow::anyhow!("no header in {}", file_path));
        }

        // a header may or may not name the row-name column
        let ncol_data = lines.first().map(|x| x.len()).unwrap_or(header.len());
        let header: Vec<Box<str>> = if header.len() + 1 == ncol_data {
            header
        } else {
            header.into_iter().skip(1).collect()
        };

        let name_to_index: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(j, x)| (x.as_ref(), j))
            .collect();

        let selected: Vec<usize> = match column_names {
            Some(names) => names
                .iter()
                .map(|x| {
                    name_to_index
                        .get(x.as_ref())
                        .copied()
                        .ok_or(anyhow::anyhow!("column `{}` not found in {}", x, file_path))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => (0..header.len()).collect(),
        };

        let cols: Vec<Box<str>> = selected.iter().map(|&j| header[j].clone()).collect();

        let mut rows = Vec::with_capacity(lines.len());
        let mut data = Vec::with_capacity(lines.len() * selected.len());

        for (i, words) in lines.iter().enumerate() {
            if words.len() != header.len() + 1 {
                return Err(anyhow::anyhow!(
                    "row {} has {} fields, expected {} in {}",
                    i,
                    words.len(),
                    header.len() + 1,
                    file_path
                ));
            }
            rows.push(words[0].clone());
            for &j in selected.iter() {
                data.push(parse_field::<T>(&words[j + 1], i, j + 1, file_path)?);
            }
        }

        let nrows = rows.len();
        let ncols = cols.len();
        Ok(MatWithNames {
            rows,
            cols,
            mat: DMatrix::<T>::from_row_iterator(nrows, ncols, data),
        })
    }

    fn read_file_delim(
        file_path: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat> {
        let hdr_line = match skip {
            Some(skip) => skip as i64,
            None => -1, // no skipping
        };

        let lines = read_lines_of_words_delim(file_path, delim, hdr_line)?.lines;

        if lines.is_empty() {
            return Err(anyhow::anyhow!("No data in file"));
        }

        let ncols = lines[0].len();
        let nrows = lines.len();

        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, words) in lines.iter().enumerate() {
            if words.len() != ncols {
                return Err(anyhow::anyhow!("ragged row {} in {}", i, file_path));
            }
            for (j, w) in words.iter().enumerate() {
                data.push(parse_field::<T>(w, i, j, file_path)?);
            }
        }

        Ok(DMatrix::<T>::from_row_iterator(nrows, ncols, data))
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self
            .row_iter()
            .map(|row| {
                row.iter()
                    .map(|x| format!("{}", *x))
                    .collect::<Vec<String>>()
                    .join(delim)
                    .into_boxed_str()
            })
            .collect();
        write_lines(&lines, file)?;
        Ok(())
    }

    fn write_names_delim(
        &self,
        file: &str,
        delim: &str,
        row_names: &[Box<str>],
        column_names: &[Box<str>],
        corner: &str,
    ) -> anyhow::Result<()> {
        if row_names.len() != self.nrows() || column_names.len() != self.ncols() {
            return Err(anyhow::anyhow!(
                "names ({} x {}) don't match the matrix ({} x {})",
                row_names.len(),
                column_names.len(),
                self.nrows(),
                self.ncols()
            ));
        }

        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows() + 1);

        let header = std::iter::once(corner.to_string())
            .chain(column_names.iter().map(|x| x.to_string()))
            .collect::<Vec<_>>()
            .join(delim);
        lines.push(header.into_boxed_str());

        for (name, row) in row_names.iter().zip(self.row_iter()) {
            let line = std::iter::once(name.to_string())
                .chain(row.iter().map(|x| format!("{}", *x)))
                .collect::<Vec<_>>()
                .join(delim);
            lines.push(line.into_boxed_str());
        }

        write_lines(&lines, file)
    }
}
