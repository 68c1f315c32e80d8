//! Record source: raw rows out of a stream-format CSV file.
//!
//! Input files use the three-row header block of the stream format: row 1
//! names the fields, row 2 declares their types, row 3 carries special
//! flags. [`RecordSource::open`] consumes all three unconditionally before
//! any record is yielded, so a file with fewer than three rows fails at
//! open and a file with exactly three yields an empty stream.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Rows of header metadata every input file starts with.
pub const HEADER_ROWS: usize = 3;

/// Errors raised while opening or reading the input stream.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The input file could not be opened.
    #[error("Cannot open input file {path}")]
    Open {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file ended inside the header block.
    #[error("Input file {path} has only {rows} of {HEADER_ROWS} header rows")]
    TruncatedHeader {
        /// The offending file.
        path: PathBuf,
        /// How many header rows were actually present.
        rows: usize,
    },

    /// A row could not be read from the file.
    #[error("Failed to read record")]
    Read(#[from] csv::Error),
}

/// A one-pass iterator over the raw data rows of an input file.
///
/// The source is finite and not restartable; dropping it closes the
/// underlying file handle.
pub struct RecordSource {
    records: csv::StringRecordsIntoIter<File>,
    path: PathBuf,
}

impl std::fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RecordSource {
    /// Opens `path` and consumes the header block.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;

        // Header rows are narrower than data rows in some files, so the
        // reader must tolerate ragged lengths.
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut records = reader.into_records();

        for consumed in 0..HEADER_ROWS {
            match records.next() {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(SourceError::Read(e)),
                None => {
                    return Err(SourceError::TruncatedHeader {
                        path,
                        rows: consumed,
                    });
                }
            }
        }

        debug!(path = %path.display(), "opened record source");
        Ok(Self { records, path })
    }

    /// The file this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RecordSource {
    type Item = Result<csv::StringRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|r| r.map_err(SourceError::Read))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const PREAMBLE: &str = "timestamp,kw_energy_consumption\ndatetime,float\nT,\n";

    #[test]
    fn missing_file_surfaces_the_open_error() {
        let err = RecordSource::open("/nonexistent/gym.csv").unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }

    #[test]
    fn fewer_than_three_rows_fails_at_open() {
        let dir = TempDir::new().unwrap();
        for (name, contents, expected_rows) in [
            ("empty.csv", "", 0),
            ("one.csv", "timestamp,kw_energy_consumption\n", 1),
            ("two.csv", "timestamp,kw_energy_consumption\ndatetime,float\n", 2),
        ] {
            let path = write_file(&dir, name, contents);
            let err = RecordSource::open(&path).unwrap_err();
            match err {
                SourceError::TruncatedHeader { rows, .. } => assert_eq!(rows, expected_rows),
                other => panic!("expected TruncatedHeader, got {other:?}"),
            }
        }
    }

    #[test]
    fn exactly_three_rows_yields_an_empty_stream() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "header-only.csv", PREAMBLE);
        let mut source = RecordSource::open(&path).unwrap();
        assert!(source.next().is_none());
    }

    #[test]
    fn header_rows_are_skipped_and_data_rows_yielded_in_order() {
        let dir = TempDir::new().unwrap();
        let contents = format!("{PREAMBLE}7/2/10 0:00,21.2\n7/2/10 1:00,16.4\n");
        let path = write_file(&dir, "gym.csv", contents.as_str());

        let rows: Vec<csv::StringRecord> = RecordSource::open(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "7/2/10 0:00");
        assert_eq!(&rows[0][1], "21.2");
        assert_eq!(&rows[1][1], "16.4");
    }
}
