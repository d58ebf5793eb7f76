use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::debug;

/// Count data lines whose field count differs from the header's.
///
/// Fields are counted as delimiter occurrences plus one, straight off the raw
/// bytes, so quoting is not understood. The loader has its own notion of a
/// bad row and the two counts are not expected to agree. A missing file
/// counts as zero malformed lines.
pub fn count_malformed(path: &Path, delimiter: u8) -> Result<usize> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut lines = BufReader::new(file).split(b'\n');
    let expected = match lines.next() {
        Some(header) => field_count(&header?, delimiter),
        None => return Ok(0),
    };

    let mut bad = 0usize;
    for line in lines {
        if field_count(&line?, delimiter) != expected {
            bad += 1;
        }
    }
    debug!(path = %path.display(), expected, bad, "structural audit done");
    Ok(bad)
}

fn field_count(line: &[u8], delimiter: u8) -> usize {
    line.iter().filter(|b| **b == delimiter).count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn short_line_is_malformed() {
        let f = write_file("a;b;c\n1;2\n");
        assert_eq!(count_malformed(f.path(), b';').unwrap(), 1);
    }

    #[test]
    fn well_formed_file_has_none() {
        let f = write_file("a;b;c\n1;2;3\n4;5;6\n7;8;9\n");
        assert_eq!(count_malformed(f.path(), b';').unwrap(), 0);
    }

    #[test]
    fn long_lines_and_blank_lines_count() {
        let f = write_file("a;b\n1;2;3\n\n4;5\n");
        assert_eq!(count_malformed(f.path(), b';').unwrap(), 2);
    }

    #[test]
    fn crlf_and_missing_final_newline() {
        let f = write_file("a,b\r\n1,2\r\n3,4");
        assert_eq!(count_malformed(f.path(), b',').unwrap(), 0);
    }

    #[test]
    fn quoted_delimiters_are_counted_naively() {
        let f = write_file("a;b\n\"x;y\";2\n");
        assert_eq!(count_malformed(f.path(), b';').unwrap(), 1);
    }

    #[test]
    fn missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert_eq!(count_malformed(&path, b';').unwrap(), 0);
    }
}
