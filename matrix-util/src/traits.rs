use crate::common_io::Delimiter;

/// A matrix with row and column names
#[derive(Clone, Debug)]
pub struct MatWithNames<M> {
    pub rows: Vec<Box<str>>,
    pub cols: Vec<Box<str>>,
    pub mat: M,
}

/// Scale columns
pub trait MatOps {
    type Mat;
    type Scalar;

    /// Standardize each column to zero mean and unit variance
    /// (population variance). Constant columns are only centred.
    fn scale_columns_inplace(&mut self);
    fn scale_columns(&self) -> Self::Mat;

    /// Map each column onto `[0, 1]`. Constant columns become zero.
    fn minmax_columns_inplace(&mut self);
    fn minmax_columns(&self) -> Self::Mat;
}

/// Column-wise summary statistics
pub trait ColumnStatOps {
    type DVec;

    fn column_means(&self) -> Self::DVec;

    /// population variance (`ddof = 0`)
    fn column_variances(&self) -> Self::DVec;
}

/// Read and write matrices from and to files
pub trait IoOps {
    type Scalar;
    type Mat;

    /// Read a delimited table with a header line and row names in
    /// the first column.
    ///
    /// * `file` - file name--either gzipped or not
    /// * `delim` - field delimiter
    /// * `column_names` - if given, take these columns in this order;
    ///   otherwise, take all the columns after the row names
    fn read_names_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        column_names: Option<&[Box<str>]>,
    ) -> anyhow::Result<MatWithNames<Self::Mat>>;

    /// Read a delimited table without header or row names
    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat>;

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    /// Write with a header line and row names in the first column
    fn write_names_delim(
        &self,
        file: &str,
        delim: &str,
        row_names: &[Box<str>],
        column_names: &[Box<str>],
        corner: &str,
    ) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }
}
