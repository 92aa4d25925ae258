use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::process::Command;
use tempfile::TempDir;

use super::crop::crop_region;
use super::setup::{ensure_tesseract, TesseractPaths};
use crate::layout::PixelRect;
use crate::settings::EngineSettings;

/// A stateful text recognizer: set an image, pick a region, read its text.
///
/// One instance is reused for a whole batch. Every method takes `&mut self`,
/// so the image/region/text sequence of one caller can never interleave with
/// another's.
pub trait TextRecognizer {
    /// Makes `image` the current image. Replaces any previous one.
    fn set_image(&mut self, image: RgbaImage);

    /// Restricts recognition to `region` of the current image.
    fn set_region(&mut self, region: PixelRect);

    /// Recognizes text in the current region (or the whole image if no
    /// region was set).
    fn get_text(&mut self) -> Result<String>;

    /// Releases the current image.
    fn clear_image(&mut self);

    /// Releases everything the engine holds. Called once, after the last image.
    fn shutdown(&mut self);
}

/// Holds an image on the engine for the duration of one iteration.
///
/// The image is cleared from the engine when the session is dropped, on
/// every exit path.
pub struct ImageSession<'e, R: TextRecognizer + ?Sized> {
    engine: &'e mut R,
}

impl<'e, R: TextRecognizer + ?Sized> ImageSession<'e, R> {
    pub fn begin(engine: &'e mut R, image: RgbaImage) -> Self {
        engine.set_image(image);
        Self { engine }
    }

    pub fn engine(&mut self) -> &mut R {
        &mut *self.engine
    }
}

impl<R: TextRecognizer + ?Sized> Drop for ImageSession<'_, R> {
    fn drop(&mut self) {
        self.engine.clear_image();
    }
}

/// Tesseract driven as a subprocess, one invocation per region.
pub struct TesseractEngine {
    paths: TesseractPaths,
    language: String,
    page_segmentation_mode: u32,
    /// Scratch directory for region PNGs; `None` after shutdown
    workdir: Option<TempDir>,
    image: Option<RgbaImage>,
    region: Option<PixelRect>,
}

impl TesseractEngine {
    /// Locates Tesseract and the configured language and prepares a scratch
    /// directory. Fails if recognition would be impossible.
    pub fn initialize(settings: &EngineSettings) -> Result<Self> {
        let paths = ensure_tesseract(settings)?;
        Self::with_paths(paths, settings)
    }

    fn with_paths(paths: TesseractPaths, settings: &EngineSettings) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("traptapper-")
            .tempdir()
            .context("Failed to create OCR scratch directory")?;

        Ok(Self {
            paths,
            language: settings.language.clone(),
            page_segmentation_mode: settings.page_segmentation_mode,
            workdir: Some(workdir),
            image: None,
            region: None,
        })
    }
}

impl TextRecognizer for TesseractEngine {
    fn set_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.region = None;
    }

    fn set_region(&mut self, region: PixelRect) {
        self.region = Some(region);
    }

    fn get_text(&mut self) -> Result<String> {
        let workdir = self
            .workdir
            .as_ref()
            .ok_or_else(|| anyhow!("Tesseract engine has been shut down"))?;
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| anyhow!("No image set before recognition"))?;

        let region = self.region.unwrap_or(PixelRect {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        });

        let cropped = crop_region(image, &region);
        if cropped.width() == 0 || cropped.height() == 0 {
            return Ok(String::new());
        }

        let region_png = workdir.path().join("region.png");
        cropped
            .save(&region_png)
            .context("Failed to write region image for Tesseract")?;

        let mut command = Command::new(&self.paths.executable);
        command.arg(&region_png).arg("stdout");
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .output()
            .context("failed to run tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        // The CLI ends each page with a form feed
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.trim_end_matches(['\x0c', '\n']).to_string())
    }

    fn clear_image(&mut self) {
        self.image = None;
        self.region = None;
    }

    fn shutdown(&mut self) {
        self.clear_image();
        self.workdir = None;
    }
}
