//! Atomic file replacement

use crate::output::OutputError;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes a file through a temporary file in the same directory
///
/// `write` fills the temporary file; only when it succeeds is the file
/// flushed, synced and renamed over `path`. On any error the destination is
/// left untouched and the temporary file is removed.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), OutputError>,
{
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".part-scout-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| OutputError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");

        write_atomic(&path, |out| {
            out.write_all(b"Part Number,Status\n")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Part Number,Status\n");
        assert_eq!(entries(dir.path()), vec!["results.csv".to_string()]);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "Part Number,Status\nABC123,Success\n").unwrap();

        let result = write_atomic(&path, |out| {
            out.write_all(b"Part Number,Sta")?;
            Err(OutputError::Schema("simulated crash".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Part Number,Status\nABC123,Success\n"
        );
        assert_eq!(entries(dir.path()), vec!["results.csv".to_string()]);
    }

    #[test]
    fn test_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "[]").unwrap();

        write_atomic(&path, |out| {
            out.write_all(br#"[{"Part Number":"A"}]"#)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), r#"[{"Part Number":"A"}]"#);
    }
}
