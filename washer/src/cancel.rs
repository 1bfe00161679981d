use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Level-triggered stop flag shared between a run and its cancellation sources.
///
/// Cancelling is idempotent and may happen from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	flag: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.flag.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::SeqCst)
	}

	/// Sleep for `total` in slices of at most `granularity`, checking the flag
	/// between slices. Returns `false` if cancelled before the time elapsed.
	pub fn sleep(&self, total: Duration, granularity: Duration) -> bool {
		let granularity = granularity.max(Duration::from_millis(1));
		let deadline = Instant::now() + total;
		loop {
			if self.is_cancelled() {
				return false;
			}
			let now = Instant::now();
			if now >= deadline {
				return true;
			}
			std::thread::sleep(granularity.min(deadline - now));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cancel_is_idempotent_and_shared() {
		let token = CancelToken::new();
		let other = token.clone();
		assert!(!other.is_cancelled());
		token.cancel();
		token.cancel();
		assert!(other.is_cancelled());
	}

	#[test]
	fn sleep_runs_to_completion() {
		let token = CancelToken::new();
		let start = Instant::now();
		assert!(token.sleep(Duration::from_millis(30), Duration::from_millis(5)));
		assert!(start.elapsed() >= Duration::from_millis(30));
	}

	#[test]
	fn sleep_wakes_promptly_on_cancel() {
		let token = CancelToken::new();
		let remote = token.clone();
		let canceller = std::thread::spawn(move || {
			std::thread::sleep(Duration::from_millis(20));
			remote.cancel();
		});

		let start = Instant::now();
		assert!(!token.sleep(Duration::from_secs(10), Duration::from_millis(10)));
		assert!(start.elapsed() < Duration::from_secs(2));
		canceller.join().unwrap();
	}

	#[test]
	fn already_cancelled_sleep_returns_immediately() {
		let token = CancelToken::new();
		token.cancel();
		assert!(!token.sleep(Duration::ZERO, Duration::from_millis(10)));
	}
}
