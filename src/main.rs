//! traptapper
//!
//! Reads fixed instrument readout regions (date, time, temperature, ...)
//! from a batch of trail camera photos with Tesseract and writes one
//! cleaned-up CSV row per photo.

mod batch;
mod error;
mod layout;
mod ocr;
mod paths;
mod settings;

use chrono::Local;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use batch::{BatchJob, Summary};
use error::BatchError;
use ocr::TesseractEngine;

const USAGE_ARGS: &str = "OUTPUT_FILE CONFIG_FILE IMAGE_LIST_FILE";

#[derive(Parser, Debug)]
#[command(
    name = "traptapper",
    version,
    about = "Extract instrument readouts from camera images into a CSV file"
)]
struct Cli {
    /// CSV file to write (overwritten)
    output_file: PathBuf,

    /// Layout file: camera type, then one `name x y w h [precision]` line per field
    config_file: PathBuf,

    /// Text file with one image path per line
    image_list_file: PathBuf,
}

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    append_to_log(&paths::get_logs_dir().join("traptapper.log"), &line);
}

/// Appends `line` to the log file, ignoring failures.
fn append_to_log(log_path: &Path, line: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn panic_line(payload: &(dyn std::any::Any + Send), location: Option<&Location<'_>>) -> String {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };
    let location = location
        .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_default();
    format!("[PANIC]{} {}", location, msg)
}

/// Parses the command line. `Err` carries the exit status to return
/// without running a batch; a wrong argument count is not a failure.
fn parse_args<I, T>(args: I) -> Result<Cli, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            Err(0)
        }
        Err(_) => {
            eprintln!("Usage: {} {}", program_name(), USAGE_ARGS);
            Err(0)
        }
    }
}

/// Lines logged after a successful batch.
fn completion_messages(summary: &Summary, output: &Path) -> Vec<String> {
    let mut messages = vec![format!("Completed processing {} images.", summary.processed)];
    if summary.skipped > 0 {
        messages.push(format!("Skipped {} images.", summary.skipped));
    }
    messages.push(format!("Results saved to {}", output.display()));
    messages
}

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|panic_info| {
        let line = panic_line(panic_info.payload(), panic_info.location());
        eprintln!("{}", line);
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        append_to_log(
            &paths::get_logs_dir().join("traptapper.log"),
            &format!("[{}] {}\n", timestamp, line),
        );
    }));

    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return ExitCode::from(code),
    };

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: could not create log directory: {}", e);
    }

    settings::init_settings();

    let job = BatchJob {
        output: cli.output_file,
        config: cli.config_file,
        image_list: cli.image_list_file,
    };

    let result = batch::run(&job, || {
        TesseractEngine::initialize(settings::get_settings())
            .map_err(|e| BatchError::EngineInitFailed(format!("{:#}", e)))
    });

    match result {
        Ok(summary) => {
            for message in completion_messages(&summary, &job.output) {
                log(&message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn program_name() -> String {
    std::env::args()
        .next()
        .map(PathBuf::from)
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "traptapper".to_string())
}
