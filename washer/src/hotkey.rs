//! Global stop key, polled while a run is active.

use std::thread::JoinHandle;
use std::time::Duration;

use crate::engine::Washer;

/// Whether the virtual key is currently held down.
#[cfg(windows)]
pub fn is_key_down(vk: u16) -> bool {
	use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
	let state = unsafe { GetAsyncKeyState(vk as i32) };
	(state as u16 & 0x8000) != 0
}

#[cfg(not(windows))]
pub fn is_key_down(_vk: u16) -> bool {
	false
}

/// Cancel the active run of `washer` when `vk` is pressed.
///
/// The watcher exits on its own once the run is over.
pub fn spawn_stop_watcher(washer: Washer, vk: u16, granularity: Duration) -> Option<JoinHandle<()>> {
	if cfg!(not(windows)) {
		tracing::warn!(vk, "stop hotkey is only supported on Windows; use Ctrl-C");
		return None;
	}

	let spawned = std::thread::Builder::new()
		.name("washer-hotkey".to_string())
		.spawn(move || watch(&washer, vk, granularity, is_key_down));
	match spawned {
		Ok(handle) => Some(handle),
		Err(err) => {
			tracing::warn!(error = %err, "failed to start stop hotkey watcher");
			None
		}
	}
}

/// Polls `pressed` for `vk` every `granularity` while `washer` has a run, and
/// cancels that run on the first press.
pub fn watch(washer: &Washer, vk: u16, granularity: Duration, pressed: impl Fn(u16) -> bool) {
	while washer.is_running() {
		if pressed(vk) {
			tracing::info!(vk, "stop hotkey pressed");
			washer.request_cancel();
			return;
		}
		std::thread::sleep(granularity);
	}
}
