use flate2::read::GzDecoder;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Field delimiter of a text table
#[derive(Clone, Debug)]
pub struct Delimiter(String);

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter(s.to_string())
    }
}

impl Delimiter {
    /// Split one line into owned fields
    pub fn split_line(&self, line: &str) -> Vec<Box<str>> {
        line.split(self.0.as_str()).map(|x| x.trim().into()).collect()
    }
}

/// Guess a delimiter from the file name: `.csv` and `.csv.gz` are
/// comma-separated, everything else is tab-separated
pub fn detect_delimiter(file_path: &str) -> Delimiter {
    if file_path.ends_with(".csv") || file_path.ends_with(".csv.gz") {
        Delimiter::from(",")
    } else {
        Delimiter::from("\t")
    }
}

///
/// Write every line into the output_file
///
/// * `lines` - vector of lines
/// * `output_file` - file name--either gzipped or not
///
pub fn write_lines(lines: &[Box<str>], output_file_path: &str) -> anyhow::Result<()> {
    write_types(lines, output_file_path)
}

///
/// Write every displayable item as a line into the output_file
///
/// * `lines` - items to write
/// * `output_file` - file name--either gzipped or not
///
pub fn write_types<T>(lines: &[T], output_file_path: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file_path)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            } else {
                return Err(anyhow::anyhow!("unexpected error: {}", e));
            }
        }
    }
    buf.flush()?;
    Ok(())
}

pub struct ReadLinesOut<T: Send> {
    pub lines: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

fn is_data_line(line: &str) -> bool {
    !(line.trim().is_empty() || line.starts_with('#') || line.starts_with('%'))
}

///
/// Read lines and parse each of them with `parse_fn`. Comment lines
/// (`#`, `%`) and blank lines are skipped.
///
/// * `input_file` - file name--either gzipped or not
/// * `hdr_line` - location of a header line among the data lines (-1 = no header line)
/// * `parse_header_fn` - function to parse the header line
/// * `parse_fn` - function to parse each data line
///
pub fn read_lines_of_words_generic<T>(
    input_file: &str,
    hdr_line: i64,
    parse_header_fn: impl Fn(&str) -> Vec<Box<str>> + Sync,
    parse_fn: impl Fn(&str) -> Vec<T> + Sync,
) -> anyhow::Result<ReadLinesOut<T>>
where
    T: Send,
{
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;

    let mut lines_raw: Vec<Box<str>> = vec![];
    for line in buf_reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if is_data_line(line) {
            lines_raw.push(line.into());
        }
    }

    let mut header = vec![];

    let body: &[Box<str>] = if hdr_line < 0 {
        &lines_raw
    } else {
        let n_skip = hdr_line as usize;
        if lines_raw.len() < (n_skip + 1) {
            return Err(anyhow::anyhow!("not enough lines in {}", input_file));
        }
        header.extend(parse_header_fn(&lines_raw[n_skip]));
        &lines_raw[(n_skip + 1)..]
    };

    // Parsing takes more time, so split them into parallel jobs
    let mut lines: Vec<(usize, Vec<T>)> = body
        .iter()
        .enumerate()
        .par_bridge()
        .map(|(i, s)| (i, parse_fn(s)))
        .collect();

    if lines.len() > 100_000 {
        lines.par_sort_by_key(|&(i, _)| i);
    } else {
        lines.sort_by_key(|&(i, _)| i);
    }

    let lines = lines.into_iter().map(|(_, x)| x).collect();
    Ok(ReadLinesOut { lines, header })
}

///
/// Read lines and split them into words by a delimiter. The header
/// line is split by the same delimiter.
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
/// * `hdr_line` - location of a header line (-1 = no header line)
///
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ReadLinesOut<Box<str>>> {
    let delim = delim.into();
    let parse_fn = |line: &str| -> Vec<Box<str>> { delim.split_line(line) };
    read_lines_of_words_generic(input_file, hdr_line, parse_fn, parse_fn)
}

///
/// Take the first non-comment line of a file as its header
///
/// * `input_file` - file name--either gzipped or not
/// * `delim` - delimiter
///
pub fn peek_header(input_file: &str, delim: impl Into<Delimiter>) -> anyhow::Result<Vec<Box<str>>> {
    let delim = delim.into();
    let buf_reader: Box<dyn BufRead> = open_buf_reader(input_file)?;
    for line in buf_reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if is_data_line(line) {
            return Ok(delim.split_line(line));
        }
    }
    Err(anyhow::anyhow!("no header line in {}", input_file))
}

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match ext {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn std::io::Write>> {
    // we can simply override with stdout
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(std::io::BufWriter::new(std::io::stdout())));
    }

    if output_file.eq_ignore_ascii_case("stderr") {
        return Ok(Box::new(std::io::BufWriter::new(std::io::stderr())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    match ext {
        Some("gz") => {
            let output_file = File::create(output_file)?;
            let encoder =
                flate2::write::GzEncoder::new(output_file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => {
            let output_file = File::create(output_file)?;
            Ok(Box::new(BufWriter::new(output_file)))
        }
    }
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

///
/// Take the basename of a file
/// * `file` - file name
///
pub fn basename(file: &str) -> anyhow::Result<Box<str>> {
    Path::new(file)
        .file_stem()
        .and_then(|x| x.to_str())
        .map(Box::from)
        .ok_or(anyhow::anyhow!("no file stem: {}", file))
}

///
/// Create a temporary directory and suggest a file name
/// * `suffix` - suffix of the file name
///
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempfile::tempdir()?.keep();
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .into_temp_path()
        .keep()?;
    Ok(temp_file)
}

///
/// Remove a file if it exists
/// * `file` - file name
///
pub fn remove_file(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if path.exists() {
        if path.is_file() {
            std::fs::remove_file(path)?;
        } else {
            std::fs::remove_dir_all(path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_lines_round_trip() -> anyhow::Result<()> {
        let file = create_temp_dir_file(".tsv.gz")?;
        let file = file.to_str().unwrap();

        let lines: Vec<Box<str>> = vec![
            "#comment".into(),
            "cell\tF1\tF2".into(),
            "c1\t1\t2".into(),
            "".into(),
            "c2\t3\t4".into(),
        ];
        write_lines(&lines, file)?;

        let out = read_lines_of_words_delim(file, "\t", 0)?;
        assert_eq!(out.header, vec![Box::from("cell"), "F1".into(), "F2".into()]);
        assert_eq!(out.lines.len(), 2);
        assert_eq!(out.lines[1][2].as_ref(), "4");

        remove_file(file)?;
        Ok(())
    }

    #[test]
    fn delimiter_from_file_name() {
        let csv = detect_delimiter("scores.csv.gz");
        assert_eq!(csv.split_line("a, b").len(), 2);
        let tsv = detect_delimiter("scores.tsv");
        assert_eq!(tsv.split_line("a, b").len(), 1);
    }
}
