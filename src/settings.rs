//! Runtime settings for the OCR engine.
//!
//! Loads settings from traptapper.json at startup. The layout itself comes
//! from the config file given on the command line; this file only tunes how
//! Tesseract is found and invoked.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global settings instance, initialized once at startup.
static SETTINGS: OnceLock<EngineSettings> = OnceLock::new();

/// Environment variable that points at an alternative settings file.
pub const SETTINGS_ENV: &str = "TRAPTAPPER_CONFIG";

const SETTINGS_FILE_NAME: &str = "traptapper.json";

/// Tesseract invocation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Tesseract language code
    pub language: String,
    /// Tesseract `--psm` value (6 = assume a single uniform block of text)
    pub page_segmentation_mode: u32,
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    pub tessdata_dir: Option<PathBuf>,
    /// Download `<language>.traineddata` when no tessdata directory has it
    pub download_tessdata: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            tesseract_path: None,
            tessdata_dir: None,
            download_tessdata: false,
        }
    }
}

impl EngineSettings {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unusable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            crate::log(&format!(
                "{} not found. Using default settings.",
                path.display()
            ));
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    crate::log(&format!("Settings loaded from {}", path.display()));
                    return settings;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
            }
        }

        Self::default()
    }
}

/// Resolves the settings file: `$TRAPTAPPER_CONFIG`, else traptapper.json
/// next to the executable.
fn settings_path() -> PathBuf {
    match std::env::var_os(SETTINGS_ENV) {
        Some(path) => PathBuf::from(path),
        None => crate::paths::get_exe_dir().join(SETTINGS_FILE_NAME),
    }
}

/// Initializes the global settings. Call once at startup.
pub fn init_settings() {
    let _ = SETTINGS.set(EngineSettings::load(&settings_path()));
}

/// Returns the global settings, or defaults if `init_settings` was never called.
pub fn get_settings() -> &'static EngineSettings {
    SETTINGS.get_or_init(EngineSettings::default)
}
