use matrix_util::common_io::{create_temp_dir_file, remove_file, write_lines};
use matrix_util::dmatrix_util::runif;
use matrix_util::traits::IoOps;

#[test]
fn dmatrix_io_test() -> anyhow::Result<()> {
    let xx = runif(50, 20);

    let tsv_file = create_temp_dir_file("txt.gz")?;
    let tsv_file = tsv_file.to_str().unwrap();
    xx.to_tsv(tsv_file)?;

    let yy = nalgebra::DMatrix::<f32>::read_file_delim(tsv_file, "\t", None)?;

    approx::assert_abs_diff_eq!(xx, yy, epsilon = 1e-6);

    remove_file(tsv_file)?;
    Ok(())
}

#[test]
fn dmatrix_named_io_test() -> anyhow::Result<()> {
    let xx = runif(5, 3);
    let rows: Vec<Box<str>> = (0..5).map(|i| format!("cell{}", i).into()).collect();
    let cols: Vec<Box<str>> = vec!["F1".into(), "F2".into(), "F3".into()];

    let csv_file = create_temp_dir_file(".csv")?;
    let csv_file = csv_file.to_str().unwrap();
    xx.write_names_delim(csv_file, ",", &rows, &cols, "")?;

    let selected: Vec<Box<str>> = vec!["F3".into(), "F1".into()];
    let out = nalgebra::DMatrix::<f32>::read_names_delim(csv_file, ",", Some(selected.as_slice()))?;

    assert_eq!(out.rows, rows);
    assert_eq!(out.cols, selected);
    approx::assert_abs_diff_eq!(out.mat.column(0), xx.column(2), epsilon = 1e-6);
    approx::assert_abs_diff_eq!(out.mat.column(1), xx.column(0), epsilon = 1e-6);

    remove_file(csv_file)?;
    Ok(())
}

#[test]
fn unparsable_selected_column_is_an_error() -> anyhow::Result<()> {
    let tsv_file = create_temp_dir_file(".tsv")?;
    let tsv_file = tsv_file.to_str().unwrap();

    let lines: Vec<Box<str>> = vec![
        "cell\tF1\tsample".into(),
        "c1\t0.5\tS1".into(),
        "c2\tnope\tS2".into(),
    ];
    write_lines(&lines, tsv_file)?;

    let f1: Vec<Box<str>> = vec!["F1".into()];
    assert!(nalgebra::DMatrix::<f32>::read_names_delim(tsv_file, "\t", Some(f1.as_slice())).is_err());

    let missing: Vec<Box<str>> = vec!["F9".into()];
    assert!(nalgebra::DMatrix::<f32>::read_names_delim(tsv_file, "\t", Some(missing.as_slice())).is_err());

    remove_file(tsv_file)?;
    Ok(())
}
