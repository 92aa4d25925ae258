//! The batch loop: every image in the list, every field in the layout.
//!
//! Runs strictly in sequence on a single engine instance. Rows come out in
//! image-list order; missing or unreadable images are logged and skipped
//! without stopping the batch.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::batch::csv_writer::{CsvOutput, Record};
use crate::error::BatchError;
use crate::layout::{load_layout, LayoutConfig};
use crate::log;
use crate::ocr::{extract_region, normalize, ImageSession, TextRecognizer};

/// Input and output locations of one run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub output: PathBuf,
    pub config: PathBuf,
    pub image_list: PathBuf,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Images that produced a row
    pub processed: usize,
    /// Images that were missing or could not be decoded
    pub skipped: usize,
}

/// Runs a whole batch.
///
/// The layout, image list and output file are opened before `init_engine`
/// is called, so a bad path fails without paying for engine startup. The
/// engine is shut down once the list is exhausted, or when a fatal error
/// stops the loop.
pub fn run<R, F>(job: &BatchJob, init_engine: F) -> Result<Summary, BatchError>
where
    R: TextRecognizer,
    F: FnOnce() -> Result<R, BatchError>,
{
    let layout = load_layout(&job.config)?;
    log(&format!(
        "Loaded layout '{}' with {} fields from {}",
        layout.camera_type,
        layout.fields.len(),
        job.config.display()
    ));

    let image_list = File::open(&job.image_list).map_err(|source| {
        BatchError::ImageListUnreadable {
            path: job.image_list.clone(),
            source,
        }
    })?;

    let mut output = CsvOutput::create(&job.output)?;
    let mut engine = init_engine()?;

    let result = output.write_header(&layout).and_then(|_| {
        process_images(&mut engine, &layout, image_list, &job.image_list, &mut output)
    });

    engine.shutdown();
    result
}

fn process_images<R: TextRecognizer>(
    engine: &mut R,
    layout: &LayoutConfig,
    image_list: File,
    image_list_path: &Path,
    output: &mut CsvOutput,
) -> Result<Summary, BatchError> {
    let mut summary = Summary::default();

    for entry in BufReader::new(image_list).split(b'\n') {
        let entry = entry.map_err(|source| BatchError::ImageListUnreadable {
            path: image_list_path.to_path_buf(),
            source,
        })?;

        let entry = entry.trim_ascii_end();
        if entry.is_empty() {
            continue;
        }

        let Some(image_path) = entry_to_path(entry) else {
            log(&format!(
                "Warning: image path '{}' is not valid on this platform. Skipping.",
                String::from_utf8_lossy(entry)
            ));
            summary.skipped += 1;
            continue;
        };

        match assemble_record(engine, layout, &image_path) {
            Ok(record) => {
                output.write_record(&record)?;
                log(&format!("Processed {}", image_path.display()));
                summary.processed += 1;
            }
            Err(e) if e.is_recoverable() => {
                log(&format!("Warning: {}. Skipping.", e));
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// Image list entries are raw bytes; on unix any byte string is a path.
#[cfg(unix)]
fn entry_to_path(entry: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(entry)))
}

#[cfg(not(unix))]
fn entry_to_path(entry: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(entry).ok().map(PathBuf::from)
}

/// Loads one image and reads every layout field from it.
///
/// The image stays set on the engine only while its fields are read.
pub fn assemble_record<R: TextRecognizer + ?Sized>(
    engine: &mut R,
    layout: &LayoutConfig,
    path: &Path,
) -> Result<Record, BatchError> {
    if !path.exists() {
        return Err(BatchError::ImageNotFound {
            path: path.to_path_buf(),
        });
    }

    let image = image::open(path)
        .map_err(|source| BatchError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let mut session = ImageSession::begin(engine, image);
    let mut columns = Vec::with_capacity(layout.column_count());
    for field in &layout.fields {
        let raw = extract_region(session.engine(), &field.rect);
        normalize(&raw, field).push_columns(&mut columns);
    }

    Ok(Record {
        filepath: path.to_string_lossy().into_owned(),
        camera_type: layout.camera_type.clone(),
        columns,
    })
}
