mod image;
pub use self::image::*;
mod ocr;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

/// Per-capture recognition knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
	/// Upscale factor applied before thresholding. Values <= 1 disable it.
	pub magnification: f32,
	/// When set, every preprocessed candidate is written here as PNG.
	pub debug_dump: Option<PathBuf>,
}

impl Default for ReadOptions {
	fn default() -> Self {
		Self {
			magnification: 3.0,
			debug_dump: None,
		}
	}
}

pub struct Ie {
	ocr: ocr::Ocr,
	dumps: AtomicU64,
}

impl Ie {
	pub fn try_new(
		ocr_detection: impl AsRef<std::path::Path>,
		ocr_recognition: impl AsRef<std::path::Path>,
		ocr_charset: impl AsRef<std::path::Path>,
	) -> anyhow::Result<Self> {
		Ok(Self {
			ocr: ocr::Ocr::try_new(ocr_detection, ocr_recognition, ocr_charset)?,
			dumps: AtomicU64::new(0),
		})
	}

	/// Recognize the text in `image`.
	///
	/// Tries several binarizations of the magnified crop and keeps the most
	/// plausible reading. Lines are separated by `\n`.
	pub fn read_text(&self, image: Image, options: &ReadOptions) -> anyhow::Result<String> {
		if image.is_empty() {
			return Ok(String::new());
		}

		let candidates = preprocess(image, options.magnification)?;
		let sequence = self.dumps.fetch_add(1, Ordering::Relaxed);

		let mut best = String::new();
		let mut best_score = i64::MIN;
		let mut last_err = None;
		for (label, candidate) in &candidates {
			if let Some(dir) = &options.debug_dump {
				dump(dir, sequence, label, candidate);
			}
			match self.ocr.get_text(candidate.as_image()) {
				Ok(text) => {
					let score = score_ocr_text(&text);
					tracing::trace!(candidate = label, score, text = %text.replace('\n', " | "), "ocr candidate");
					if score > best_score {
						best_score = score;
						best = text;
					}
				}
				Err(err) => last_err = Some(err),
			}
		}

		match (best_score, last_err) {
			(i64::MIN, Some(err)) => Err(err),
			_ => Ok(best),
		}
	}
}

fn dump(dir: &std::path::Path, sequence: u64, label: &str, image: &OwnedImage) {
	let result = std::fs::create_dir_all(dir)
		.with_context(|| format!("create {}", dir.display()))
		.and_then(|_| image.as_image().save_png(dir.join(format!("{sequence:06}_{label}.png"))));
	if let Err(err) = result {
		tracing::warn!(error = %err, "failed to write OCR debug image");
	}
}

/// Magnify the crop, then produce the binarized variants OCR is run on.
fn preprocess(image: Image, magnification: f32) -> anyhow::Result<Vec<(&'static str, OwnedImage)>> {
	use imageproc::contrast::{adaptive_threshold, equalize_histogram, otsu_level, threshold, ThresholdType};

	let base = image.to_owned_image().magnified(magnification)?;
	let gray = base.to_gray_image();
	let equalized = equalize_histogram(&gray);

	let adaptive = OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(adaptive_threshold(&equalized, 7, 10)));
	let otsu = {
		let level = otsu_level(&equalized);
		let bin = threshold(&equalized, level, ThresholdType::Binary);
		OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(bin))
	};

	Ok(vec![
		("adaptive", adaptive),
		("otsu", otsu),
		("gray", OwnedImage::from_gray_as_rgb(&gray)),
	])
}

fn ensure_dark_text_on_light(mut bin: ::image::GrayImage) -> ::image::GrayImage {
	// Mostly-black means light text on a dark tooltip; flip it.
	let white = bin.pixels().filter(|p| p.0[0] > 0).count();
	let black = (bin.width() * bin.height()) as usize - white;
	if black > white {
		for p in bin.pixels_mut() {
			p.0[0] = 255u8.saturating_sub(p.0[0]);
		}
	}
	bin
}

/// Prefer readings with more letters/digits (CJK included) and fewer stray glyphs.
fn score_ocr_text(text: &str) -> i64 {
	text.chars()
		.map(|ch| {
			if ch.is_alphanumeric() {
				3
			} else if ch.is_whitespace() {
				0
			} else {
				1
			}
		})
		.sum::<i64>()
		+ text.chars().count() as i64
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn score_prefers_cjk_text_over_noise() {
		assert!(score_ocr_text("冰霜抗性 +30") > score_ocr_text("|:;'., -~"));
		assert!(score_ocr_text("攻击速度") > score_ocr_text("攻击"));
		assert_eq!(score_ocr_text(""), 0);
	}

	#[test]
	fn dark_background_is_inverted() {
		let mut bin = ::image::GrayImage::new(4, 1);
		bin.put_pixel(0, 0, ::image::Luma([255]));
		let out = ensure_dark_text_on_light(bin);
		assert_eq!(out.get_pixel(0, 0).0[0], 0);
		assert_eq!(out.get_pixel(3, 0).0[0], 255);
	}

	#[test]
	fn preprocess_magnifies_every_candidate() {
		// Dark 20x10 strip with a bright stroke along row 5.
		let mut rgba = [30u8, 30, 30, 255].repeat(20 * 10);
		for x in 5..15 {
			let at = (x + 5 * 20) * 4;
			rgba[at..at + 3].fill(255);
		}
		let img = OwnedImage::from_rgba(20, &rgba);
		let candidates = preprocess(img.as_image(), 2.0).unwrap();
		let labels: Vec<_> = candidates.iter().map(|(label, _)| *label).collect();
		assert_eq!(labels, ["adaptive", "otsu", "gray"]);
		for (_, candidate) in &candidates {
			assert_eq!((candidate.width(), candidate.height()), (40, 20));
		}
	}

	#[test]
	fn debug_dump_writes_png() {
		let dir = tempfile::tempdir().unwrap();
		let img = OwnedImage::filled(3, 3, Color::new(255, 255, 255));
		dump(dir.path(), 7, "gray", &img);
		assert!(dir.path().join("000007_gray.png").exists());
	}
}
