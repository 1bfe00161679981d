//! OCR wrapper.
//!
//! The crate relies on `ocr-rs` (Rust PaddleOCR bindings). Preprocessing
//! happens in the crate root before calling into this module.

use std::path::Path;

use anyhow::Context;

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Load the detection/recognition models and the charset file.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charset: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection.as_ref(),
            recognition.as_ref(),
            charset.as_ref(),
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count,
                // Affix tooltips use small stylized glyphs; High is worth the CPU.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .with_context(|| {
            format!(
                "failed to initialize OCR engine (det={}, rec={}, charset={})",
                detection.as_ref().display(),
                recognition.as_ref().display(),
                charset.as_ref().display()
            )
        })?;

        Ok(Self { engine })
    }

    /// Recognize text from an RGB image view.
    ///
    /// Each detected text box becomes one line, top to bottom, so the caller
    /// can keep affixes on separate lines.
    pub fn get_text(&self, image: crate::Image) -> anyhow::Result<String> {
        if image.is_empty() {
            return Ok(String::new());
        }

        let image = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());
        let results = self.engine.recognize(&image).context("OCR recognition failed")?;

        Ok(results
            .into_iter()
            .map(|v| v.text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
