/// Tell the user the rule was hit, above the game window.
#[cfg(windows)]
pub fn announce_success(rule: &str) {
	use windows::core::HSTRING;
	use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONINFORMATION, MB_SYSTEMMODAL, MB_TOPMOST};

	let text = HSTRING::from(format!("Reroll finished.\nMatched rule:\n{rule}"));
	let caption = HSTRING::from("washer");
	unsafe {
		MessageBoxW(None, &text, &caption, MB_ICONINFORMATION | MB_SYSTEMMODAL | MB_TOPMOST);
	}
}

#[cfg(not(windows))]
pub fn announce_success(rule: &str) {
	tracing::info!(rule, "rule satisfied");
}
