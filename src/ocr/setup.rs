use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;
use crate::settings::EngineSettings;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Pulls the version number out of the first line of `tesseract --version`.
const VERSION_PATTERN: &str = r"tesseract\s+v?(\d+(?:\.\d+)*)";

/// Resolved locations of a working Tesseract install.
#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` means Tesseract's own compiled-in default is used
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for locally managed Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    crate::paths::get_data_dir().join("tesseract")
}

/// Locates Tesseract and the trained data for `settings.language`.
///
/// Fails if the executable does not run, or if the language is neither
/// loadable by the executable nor obtainable by download.
pub fn ensure_tesseract(settings: &EngineSettings) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(settings)?;

    let banner = version_banner(&executable)?;
    match parse_version(&banner) {
        Ok(version) => log(&format!(
            "Using Tesseract {} at {}",
            version,
            executable.display()
        )),
        Err(e) => log(&format!("Warning: {}", e)),
    }

    let traineddata = format!("{}.traineddata", settings.language);

    if let Some(tessdata) = find_tessdata_dir(settings, &traineddata) {
        require_language(&executable, Some(&tessdata), &settings.language)?;
        log(&format!("Using tessdata at: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    let available = list_languages(&executable, None)?;
    if available.iter().any(|lang| lang == &settings.language) {
        return Ok(TesseractPaths {
            executable,
            tessdata: None,
        });
    }

    if !settings.download_tessdata {
        return Err(anyhow!(
            "language '{}' is not installed (available: {}). \
             Install {} or set \"download_tessdata\": true",
            settings.language,
            available.join(", "),
            traineddata
        ));
    }

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)?;
    download_tessdata(&tessdata_dir, &settings.language)?;
    require_language(&executable, Some(&tessdata_dir), &settings.language)?;

    Ok(TesseractPaths {
        executable,
        tessdata: Some(tessdata_dir),
    })
}

/// Fails unless `--list-langs` (against `tessdata`, if given) reports `language`.
fn require_language(executable: &Path, tessdata: Option<&Path>, language: &str) -> Result<()> {
    let available = list_languages(executable, tessdata)?;
    if available.iter().any(|lang| lang == language) {
        return Ok(());
    }
    Err(anyhow!(
        "language '{}' is not loadable from {} (available: {})",
        language,
        tessdata.map_or_else(|| "the default tessdata".to_string(), |d| d.display().to_string()),
        available.join(", ")
    ))
}

/// Downloads `<language>.traineddata` into `tessdata_dir`.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    let target = tessdata_dir.join(format!("{}.traineddata", language));

    log(&format!("Downloading {}...", url));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "traptapper")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        language,
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable: explicit setting, local dir, PATH, then
/// common install locations.
pub fn find_tesseract_executable(settings: &EngineSettings) -> Result<PathBuf> {
    if let Some(explicit) = &settings.tesseract_path {
        if explicit.exists() {
            return Ok(explicit.clone());
        }
        return Err(anyhow!(
            "Configured tesseract_path does not exist: {}",
            explicit.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];

    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    }
}

/// Finds a tessdata directory containing `traineddata`.
pub fn find_tessdata_dir(settings: &EngineSettings, traineddata: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(explicit) = &settings.tessdata_dir {
        candidates.push(explicit.clone());
    }

    candidates.push(get_tesseract_dir().join("tessdata"));

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    candidates.into_iter().find(|dir| dir.join(traineddata).exists())
}

/// Runs `tesseract --version` and returns its banner. Fails if the
/// executable cannot be started or exits unsuccessfully.
fn version_banner(executable: &Path) -> Result<String> {
    let output = Command::new(executable)
        .arg("--version")
        .output()
        .with_context(|| format!("failed to run {}", executable.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} --version failed: {}",
            executable.display(),
            stderr.trim()
        ));
    }

    // Older builds print the banner to stderr
    let mut banner = String::from_utf8_lossy(&output.stdout).to_string();
    banner.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(banner)
}

fn parse_version(banner: &str) -> Result<String> {
    let version_regex = Regex::new(VERSION_PATTERN)?;
    version_regex
        .captures(banner)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("Unrecognized version banner: {}", banner.trim()))
}

/// Lists the languages the executable can load, via `--list-langs`.
pub fn list_languages(executable: &Path, tessdata: Option<&Path>) -> Result<Vec<String>> {
    let mut command = Command::new(executable);
    if let Some(dir) = tessdata {
        command.arg("--tessdata-dir").arg(dir);
    }
    let output = command
        .arg("--list-langs")
        .output()
        .with_context(|| "failed to run tesseract --list-langs")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }

    Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `--list-langs` output: a banner line, then one language per line.
fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("tesseract 5.3.0\n leptonica-1.82.0\n").unwrap(),
            "5.3.0"
        );
        assert_eq!(parse_version("tesseract v4.1.1\n").unwrap(), "4.1.1");
        assert!(parse_version("command not found").is_err());
    }

    #[test]
    fn test_parse_language_list() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\n\nfra\n";
        assert_eq!(parse_language_list(stdout), vec!["eng", "osd", "fra"]);
    }

    #[test]
    fn test_find_tessdata_prefers_explicit_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("eng.traineddata"), b"stub").unwrap();

        let settings = EngineSettings {
            tessdata_dir: Some(dir.path().to_path_buf()),
            ..EngineSettings::default()
        };

        assert_eq!(
            find_tessdata_dir(&settings, "eng.traineddata"),
            Some(dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_find_tessdata_skips_dir_without_language() {
        let dir = tempdir().unwrap();
        let settings = EngineSettings {
            tessdata_dir: Some(dir.path().to_path_buf()),
            ..EngineSettings::default()
        };

        assert_ne!(
            find_tessdata_dir(&settings, "zzz_test_only.traineddata"),
            Some(dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_unrunnable_executable_fails_even_with_tessdata() {
        let dir = tempdir().unwrap();
        let stub = dir.path().join("tesseract");
        fs::write(&stub, "not a program").unwrap();
        let tessdata = dir.path().join("tessdata");
        fs::create_dir_all(&tessdata).unwrap();
        fs::write(tessdata.join("eng.traineddata"), b"stub").unwrap();

        let settings = EngineSettings {
            tesseract_path: Some(stub),
            tessdata_dir: Some(tessdata),
            ..EngineSettings::default()
        };

        assert!(ensure_tesseract(&settings).is_err());
    }

    #[test]
    fn test_missing_explicit_executable() {
        let dir = tempdir().unwrap();
        let settings = EngineSettings {
            tesseract_path: Some(dir.path().join("no-such-tesseract")),
            ..EngineSettings::default()
        };
        assert!(find_tesseract_executable(&settings).is_err());
    }
}
