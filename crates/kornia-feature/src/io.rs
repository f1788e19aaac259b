use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Reads the non empty lines of a text file.
///
/// Lines are trimmed and empty lines are skipped; the order is kept.
///
/// # Arguments
///
/// * `path` - The path to the text file.
///
/// # Returns
///
/// A vector with the trimmed lines.
pub fn read_text_file_lines(path: impl AsRef<Path>) -> Result<Vec<String>, std::io::Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    reader
        .lines()
        .filter_map(|line| match line {
            Ok(line) => {
                let line = line.trim();
                (!line.is_empty()).then(|| Ok(line.to_string()))
            }
            Err(e) => Some(Err(e)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_text_file_lines() -> Result<(), std::io::Error> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "image1.jpg")?;
        writeln!(file)?;
        writeln!(file, "  sub/image2.jpg \r")?;
        write!(file, "image3.jpg")?;

        let lines = read_text_file_lines(file.path())?;
        assert_eq!(lines, vec!["image1.jpg", "sub/image2.jpg", "image3.jpg"]);
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_text_file_lines("/this/path/does/not/exist.txt").is_err());
    }
}
