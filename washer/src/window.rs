//! Finding the bound game window again.

use crate::profile::WindowBinding;

/// Current geometry of a top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
	/// Native handle (the HWND on Windows).
	pub id: u32,
	pub title: String,
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

pub trait WindowResolver {
	/// Locate the window for `binding`, or `None` if it is gone.
	fn resolve_window(&self, binding: &WindowBinding) -> Option<WindowInfo>;
}

/// Largest title edit distance still accepted as the same window.
const TITLE_DISTANCE: usize = 3;

/// Pick the best candidate for `title`: exact, then containing, then the
/// closest title within [`TITLE_DISTANCE`] edits.
pub fn best_match(title: &str, windows: Vec<WindowInfo>) -> Option<WindowInfo> {
	if title.is_empty() {
		return None;
	}
	if let Some(index) = windows.iter().position(|w| w.title == title) {
		return windows.into_iter().nth(index);
	}
	if let Some(index) = windows.iter().position(|w| w.title.contains(title)) {
		return windows.into_iter().nth(index);
	}
	windows
		.into_iter()
		.map(|w| (levenshtein::levenshtein(&w.title, title), w))
		.filter(|(distance, _)| *distance <= TITLE_DISTANCE)
		.min_by_key(|(distance, _)| *distance)
		.map(|(_, w)| w)
}

/// Enumerates windows through `xcap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopWindows;

impl DesktopWindows {
	pub fn list() -> Vec<WindowInfo> {
		let windows = match xcap::Window::all() {
			Ok(windows) => windows,
			Err(err) => {
				tracing::warn!(error = %err, "failed to enumerate windows");
				return Vec::new();
			}
		};

		windows
			.into_iter()
			.filter(|window| !window.is_minimized().unwrap_or(false))
			.filter_map(|window| {
				Some(WindowInfo {
					id: window.id().ok()?,
					title: window.title().ok()?,
					x: window.x().ok()?,
					y: window.y().ok()?,
					width: window.width().ok()?,
					height: window.height().ok()?,
				})
			})
			.filter(|info| !info.title.is_empty())
			.collect()
	}
}

impl WindowResolver for DesktopWindows {
	fn resolve_window(&self, binding: &WindowBinding) -> Option<WindowInfo> {
		best_match(&binding.title, Self::list())
	}
}
