//! Interactive calibration: the user points at each spot and confirms.

use anyhow::{Context, Result};

use crate::profile::{Point, Profile, Region, WindowBinding};
use crate::window::WindowInfo;

/// Source of pointer positions for calibration.
pub trait PointerProbe {
	/// Show `prompt` and return the pointer position once the user confirms.
	fn confirm_point(&mut self, prompt: &str) -> Result<Point>;
	/// The window that currently has focus.
	fn foreground_window(&mut self) -> Result<Option<WindowInfo>>;
}

/// Walk the user through hover target, text region corners and reroll button.
///
/// With `bind_window`, the window focused when the hover target is confirmed
/// becomes the binding and every coordinate is stored relative to it.
pub fn calibrate(probe: &mut dyn PointerProbe, bind_window: bool) -> Result<Profile> {
	let hover = probe.confirm_point("[1/4] Point at the item so its tooltip shows")?;
	tracing::info!(%hover, "hover position recorded");

	let window = if bind_window {
		let window = probe
			.foreground_window()?
			.filter(|w| !w.title.is_empty())
			.context("no titled foreground window to bind to")?;
		tracing::info!(title = %window.title, x = window.x, y = window.y, "bound to window");
		Some(window)
	} else {
		None
	};

	let first = probe.confirm_point("[2/4] Point at one corner of the affix text")?;
	let second = probe.confirm_point("[3/4] Point at the opposite corner")?;
	let region = Region::from_corners(first, second);
	if region.is_empty() {
		tracing::warn!(%region, "text region has no area");
	} else {
		tracing::info!(%region, "text region recorded");
	}

	let reroll = probe.confirm_point("[4/4] Point at the reroll button")?;
	tracing::info!(%reroll, "reroll position recorded");

	let (dx, dy) = window.as_ref().map_or((0, 0), |w| (-w.x, -w.y));
	Ok(Profile {
		hover: Some(hover.offset(dx, dy)),
		region: Some(region.offset(dx, dy)),
		reroll: Some(reroll.offset(dx, dy)),
		window: window.map(|w| WindowBinding { title: w.title }),
	})
}

/// Confirms with the space bar and reads the real cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProbe;

#[cfg(windows)]
impl PointerProbe for ConsoleProbe {
	fn confirm_point(&mut self, prompt: &str) -> Result<Point> {
		use std::time::Duration;
		use windows::Win32::Foundation::POINT;
		use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

		const VK_SPACE: u16 = 0x20;

		println!("{prompt}, then press Space.");
		// Wait for a fresh press, not one still held from the previous step.
		while crate::hotkey::is_key_down(VK_SPACE) {
			std::thread::sleep(Duration::from_millis(20));
		}
		while !crate::hotkey::is_key_down(VK_SPACE) {
			std::thread::sleep(Duration::from_millis(50));
		}

		let mut pt = POINT::default();
		unsafe { GetCursorPos(&mut pt) }.context("GetCursorPos")?;
		std::thread::sleep(Duration::from_millis(300));
		Ok(Point::new(pt.x, pt.y))
	}

	fn foreground_window(&mut self) -> Result<Option<WindowInfo>> {
		use windows::Win32::Foundation::RECT;
		use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowRect, GetWindowTextW};

		let hwnd = unsafe { GetForegroundWindow() };
		if hwnd.is_invalid() {
			return Ok(None);
		}

		let mut buf = [0u16; 512];
		let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
		let title = String::from_utf16_lossy(&buf[..len.max(0) as usize]);

		let mut rect = RECT::default();
		unsafe { GetWindowRect(hwnd, &mut rect) }.context("GetWindowRect")?;

		Ok(Some(WindowInfo {
			id: hwnd.0 as usize as u32,
			title,
			x: rect.left,
			y: rect.top,
			width: (rect.right - rect.left).max(0) as u32,
			height: (rect.bottom - rect.top).max(0) as u32,
		}))
	}
}

#[cfg(not(windows))]
impl PointerProbe for ConsoleProbe {
	fn confirm_point(&mut self, _prompt: &str) -> Result<Point> {
		anyhow::bail!("pointer probing is only supported on Windows")
	}

	fn foreground_window(&mut self) -> Result<Option<WindowInfo>> {
		Ok(None)
	}
}
