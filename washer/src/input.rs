//! Input injection: pointer movement and the reroll action.

use anyhow::Result;

use crate::config::RerollAction;
use crate::profile::Point;
use crate::window::WindowInfo;

/// Where injected input goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
	/// Real OS-level input.
	Foreground,
	/// Messages posted to this window.
	Background(WindowInfo),
}

/// All points are absolute screen coordinates.
pub trait InputInjector {
	fn move_or_hover(&mut self, at: Point, target: &InputTarget) -> Result<()>;
	fn trigger_action(&mut self, action: RerollAction, at: Point, target: &InputTarget) -> Result<()>;
}

/// Win32 input: `SendInput` in the foreground, `PostMessageW` in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopInput;

#[cfg(windows)]
mod win32 {
	use anyhow::{ensure, Context, Result};
	use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
	use windows::Win32::Graphics::Gdi::ScreenToClient;
	use windows::Win32::UI::Input::KeyboardAndMouse::{
		SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
		MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
	};
	use windows::Win32::UI::WindowsAndMessaging::{
		PostMessageW, SetCursorPos, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE,
	};

	use crate::profile::Point;
	use crate::window::WindowInfo;

	const MK_LBUTTON: usize = 0x0001;

	fn hwnd(window: &WindowInfo) -> HWND {
		HWND(window.id as usize as *mut core::ffi::c_void)
	}

	pub fn set_cursor(at: Point) -> Result<()> {
		unsafe { SetCursorPos(at.x, at.y) }.context("SetCursorPos")
	}

	fn mouse(flags: MOUSE_EVENT_FLAGS) -> INPUT {
		INPUT {
			r#type: INPUT_MOUSE,
			Anonymous: INPUT_0 {
				mi: MOUSEINPUT {
					dx: 0,
					dy: 0,
					mouseData: 0,
					dwFlags: flags,
					time: 0,
					dwExtraInfo: 0,
				},
			},
		}
	}

	fn key(vk: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
		INPUT {
			r#type: INPUT_KEYBOARD,
			Anonymous: INPUT_0 {
				ki: KEYBDINPUT {
					wVk: VIRTUAL_KEY(vk),
					wScan: 0,
					dwFlags: flags,
					time: 0,
					dwExtraInfo: 0,
				},
			},
		}
	}

	fn send(inputs: &[INPUT]) -> Result<()> {
		let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
		ensure!(sent as usize == inputs.len(), "SendInput accepted {sent} of {} events", inputs.len());
		Ok(())
	}

	pub fn click() -> Result<()> {
		send(&[mouse(MOUSEEVENTF_LEFTDOWN), mouse(MOUSEEVENTF_LEFTUP)])
	}

	pub fn press(vk: u16) -> Result<()> {
		send(&[key(vk, KEYBD_EVENT_FLAGS(0)), key(vk, KEYEVENTF_KEYUP)])
	}

	/// Screen point to the window's client-area `lParam`.
	fn client_lparam(window: &WindowInfo, at: Point) -> Result<LPARAM> {
		let mut pt = POINT { x: at.x, y: at.y };
		let ok = unsafe { ScreenToClient(hwnd(window), &mut pt) };
		ensure!(ok.as_bool(), "ScreenToClient failed for window {:?}", window.title);
		let packed = ((pt.y as u16 as u32) << 16) | (pt.x as u16 as u32);
		Ok(LPARAM(packed as isize))
	}

	fn post(window: &WindowInfo, msg: u32, wparam: usize, lparam: LPARAM) -> Result<()> {
		unsafe { PostMessageW(Some(hwnd(window)), msg, WPARAM(wparam), lparam) }
			.with_context(|| format!("PostMessageW({msg:#x}) to {:?}", window.title))
	}

	pub fn post_move(window: &WindowInfo, at: Point) -> Result<()> {
		post(window, WM_MOUSEMOVE, 0, client_lparam(window, at)?)
	}

	pub fn post_click(window: &WindowInfo, at: Point) -> Result<()> {
		let lparam = client_lparam(window, at)?;
		post(window, WM_MOUSEMOVE, 0, lparam)?;
		post(window, WM_LBUTTONDOWN, MK_LBUTTON, lparam)?;
		post(window, WM_LBUTTONUP, 0, lparam)
	}

	pub fn post_key(window: &WindowInfo, vk: u16) -> Result<()> {
		// Repeat count 1; the key-up also sets the previous-state and transition bits.
		post(window, WM_KEYDOWN, vk as usize, LPARAM(1))?;
		post(window, WM_KEYUP, vk as usize, LPARAM(0xC000_0001u32 as isize))
	}
}

#[cfg(windows)]
impl InputInjector for DesktopInput {
	fn move_or_hover(&mut self, at: Point, target: &InputTarget) -> Result<()> {
		match target {
			InputTarget::Foreground => win32::set_cursor(at),
			InputTarget::Background(window) => win32::post_move(window, at),
		}
	}

	fn trigger_action(&mut self, action: RerollAction, at: Point, target: &InputTarget) -> Result<()> {
		match (target, action) {
			(InputTarget::Foreground, RerollAction::Click) => {
				win32::set_cursor(at)?;
				win32::click()
			}
			(InputTarget::Foreground, RerollAction::Key { vk }) => win32::press(vk),
			(InputTarget::Background(window), RerollAction::Click) => win32::post_click(window, at),
			(InputTarget::Background(window), RerollAction::Key { vk }) => win32::post_key(window, vk),
		}
	}
}

#[cfg(not(windows))]
impl InputInjector for DesktopInput {
	fn move_or_hover(&mut self, _at: Point, _target: &InputTarget) -> Result<()> {
		anyhow::bail!("input injection is only supported on Windows")
	}

	fn trigger_action(&mut self, _action: RerollAction, _at: Point, _target: &InputTarget) -> Result<()> {
		anyhow::bail!("input injection is only supported on Windows")
	}
}
