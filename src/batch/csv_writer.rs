//! CSV output for a batch run.
//!
//! The file is opened once, the header is derived from the layout, and every
//! row is flushed as soon as it is written so a crash mid-batch keeps the
//! rows already produced. Values are written as-is, without quoting.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::BatchError;
use crate::layout::LayoutConfig;

/// One output row: the image, its camera type and the field values in
/// layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub filepath: String,
    pub camera_type: String,
    pub columns: Vec<String>,
}

impl Record {
    /// Formats the row without a trailing newline.
    pub fn to_csv_line(&self) -> String {
        let mut line = format!("{},{}", self.filepath, self.camera_type);
        for column in &self.columns {
            line.push(',');
            line.push_str(column);
        }
        line
    }
}

/// Open output file for the lifetime of a run.
pub struct CsvOutput {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvOutput {
    /// Creates (or truncates) the output file.
    pub fn create(path: &Path) -> Result<Self, BatchError> {
        let file = File::create(path).map_err(|source| BatchError::OutputUnwritable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn write_header(&mut self, layout: &LayoutConfig) -> Result<(), BatchError> {
        self.write_line(&layout.csv_header())
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), BatchError> {
        self.write_line(&record.to_csv_line())
    }

    fn write_line(&mut self, line: &str) -> Result<(), BatchError> {
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| BatchError::OutputWrite {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldSpec, PixelRect};
    use tempfile::tempdir;

    fn sample_layout() -> LayoutConfig {
        LayoutConfig {
            camera_type: "Bushnell".into(),
            fields: vec![
                FieldSpec::new("date", PixelRect::default(), None),
                FieldSpec::new("temp", PixelRect::default(), None),
            ],
        }
    }

    #[test]
    fn test_record_to_csv_line() {
        let record = Record {
            filepath: "photos/IMG_0001.JPG".into(),
            camera_type: "Bushnell".into(),
            columns: vec!["10/02/2019".into(), "72.3F".into(), "72".into()],
        };
        assert_eq!(
            record.to_csv_line(),
            "photos/IMG_0001.JPG,Bushnell,10/02/2019,72.3F,72"
        );
    }

    #[test]
    fn test_empty_columns_are_kept() {
        let record = Record {
            filepath: "a.jpg".into(),
            camera_type: "cam".into(),
            columns: vec![String::new(), "x".into(), String::new()],
        };
        assert_eq!(record.to_csv_line(), "a.jpg,cam,,x,");
    }

    #[test]
    fn test_rows_are_visible_before_drop() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");

        let mut output = CsvOutput::create(&csv_path).unwrap();
        output.write_header(&sample_layout()).unwrap();
        output
            .write_record(&Record {
                filepath: "a.jpg".into(),
                camera_type: "Bushnell".into(),
                columns: vec!["10/02/2019".into(), "-15C".into(), "-15".into()],
            })
            .unwrap();

        // Still open: contents must already be flushed
        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "filepath,cameraType,date,temp,temp_corrected");
        assert_eq!(lines[1], "a.jpg,Bushnell,10/02/2019,-15C,-15");
        drop(output);
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        std::fs::write(&csv_path, "old,data\n1,2\n").unwrap();

        let mut output = CsvOutput::create(&csv_path).unwrap();
        output.write_header(&sample_layout()).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "filepath,cameraType,date,temp,temp_corrected\n");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let err = CsvOutput::create(&dir.path().join("no/such/dir/out.csv"))
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::OutputUnwritable { .. }));
    }
}
