use super::engine::TextRecognizer;
use crate::layout::PixelRect;
use crate::log;

/// Reads the raw text inside `region` of the engine's current image.
///
/// Recognition is attempted exactly once. A failure is logged and read as
/// empty text, the same as a region that simply contains nothing legible.
pub fn extract_region<R: TextRecognizer + ?Sized>(engine: &mut R, region: &PixelRect) -> String {
    engine.set_region(*region);
    match engine.get_text() {
        Ok(text) => text,
        Err(e) => {
            log(&format!(
                "Warning: OCR failed for region {}x{}+{}+{}: {}",
                region.width, region.height, region.x, region.y, e
            ));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use image::RgbaImage;

    /// Returns a fixed reply and remembers the last region.
    struct FixedReply {
        reply: Option<&'static str>,
        region: Option<PixelRect>,
    }

    impl TextRecognizer for FixedReply {
        fn set_image(&mut self, _image: RgbaImage) {}
        fn set_region(&mut self, region: PixelRect) {
            self.region = Some(region);
        }
        fn get_text(&mut self) -> Result<String> {
            self.reply
                .map(str::to_string)
                .ok_or_else(|| anyhow!("engine error"))
        }
        fn clear_image(&mut self) {}
        fn shutdown(&mut self) {}
    }

    #[test]
    fn test_extract_sets_region() {
        let mut engine = FixedReply { reply: Some("72F\n"), region: None };
        let region = PixelRect { x: 1, y: 2, width: 3, height: 4 };

        assert_eq!(extract_region(&mut engine, &region), "72F\n");
        assert_eq!(engine.region, Some(region));
    }

    #[test]
    fn test_extract_failure_reads_as_empty() {
        let mut engine = FixedReply { reply: None, region: None };
        assert_eq!(extract_region(&mut engine, &PixelRect::default()), "");
    }
}
