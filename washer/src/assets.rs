use std::path::PathBuf;

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

impl OcrAssets {
	pub fn load(&self) -> Result<ie::Ie> {
		ie::Ie::try_new(&self.detection, &self.recognition, &self.charset)
	}
}

/// Accept either an app root containing `ocr/` or the `ocr/` folder itself.
fn ocr_dir(base: PathBuf) -> PathBuf {
	if base.join("detection.mnn").is_file() {
		base
	} else {
		base.join("ocr")
	}
}

fn candidate_dirs() -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Some(dir) = std::env::var_os("WASHER_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	candidates
}

/// Find the OCR models for `lang_code`.
///
/// Looks in `WASHER_ASSETS_DIR`, next to the executable, in the working
/// directory and (debug builds) the workspace root.
pub fn resolve_ocr_assets(lang_code: &str) -> Result<OcrAssets> {
	resolve_in(lang_code, candidate_dirs())
}

fn resolve_in(lang_code: &str, candidates: Vec<PathBuf>) -> Result<OcrAssets> {
	let recognition_name = format!("{lang_code}_recognition.mnn");
	let charset_name = format!("{lang_code}_charset.txt");

	let mut tried = Vec::new();
	for base in candidates {
		let dir = ocr_dir(base);
		let detection = dir.join("detection.mnn");
		let recognition = dir.join(&recognition_name);
		let charset = dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			tracing::debug!(dir = %dir.display(), "found OCR models");
			return Ok(OcrAssets { detection, recognition, charset });
		}
		tried.push(dir);
	}

	bail!(
		"OCR model files not found. Expected ocr/detection.mnn, ocr/{recognition_name} and ocr/{charset_name}.\nSearched in:\n{}\nCopy the 'ocr/' folder next to the executable or set WASHER_ASSETS_DIR.",
		tried
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}
