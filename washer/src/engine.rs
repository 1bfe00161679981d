//! Runs the reroll loop on a dedicated worker thread, one run at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::cancel::CancelToken;
use crate::capture::Recognizer;
use crate::error::RunError;
use crate::input::InputInjector;
use crate::runner::{RunEvent, RunPlan, RunReport, Runner};
use crate::window::WindowResolver;

/// The collaborators a run talks to, moved onto the worker.
pub struct Collaborators {
	pub recognizer: Box<dyn Recognizer + Send>,
	pub injector: Box<dyn InputInjector + Send>,
	pub windows: Box<dyn WindowResolver + Send>,
}

/// Owns the "one active run" invariant.
///
/// Cloning is cheap; clones share the same active run, so any of them can
/// cancel it (a hotkey watcher, a Ctrl-C handler, a stop button).
#[derive(Clone, Default)]
pub struct Washer {
	active: Arc<AtomicBool>,
	current: Arc<Mutex<Option<CancelToken>>>,
}

/// Clears the active flag when the worker exits, panics included.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

pub struct RunHandle {
	cancel: CancelToken,
	worker: JoinHandle<Result<RunReport, RunError>>,
}

impl RunHandle {
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_finished(&self) -> bool {
		self.worker.is_finished()
	}

	/// Wait for the run to end.
	pub fn join(self) -> Result<RunReport, RunError> {
		self.worker.join().unwrap_or(Err(RunError::WorkerPanicked))
	}
}

impl Washer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_running(&self) -> bool {
		self.active.load(Ordering::SeqCst)
	}

	/// Validate `plan` and start it on a worker thread.
	///
	/// Rejected with [`RunError::AlreadyRunning`] while another run is active,
	/// and with [`RunError::Config`] before any thread is spawned.
	pub fn start(
		&self,
		plan: RunPlan,
		collaborators: Collaborators,
		events: Option<Sender<RunEvent>>,
	) -> Result<RunHandle, RunError> {
		plan.validate()?;

		if self
			.active
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			tracing::warn!("refusing to start a second run");
			return Err(RunError::AlreadyRunning);
		}
		let guard = ActiveGuard(self.active.clone());

		let cancel = CancelToken::new();
		self.set_current(Some(cancel.clone()));

		let token = cancel.clone();
		let current = self.current.clone();
		let worker = std::thread::Builder::new()
			.name("washer-run".to_string())
			.spawn(move || {
				let _guard = guard;
				let Collaborators {
					mut recognizer,
					mut injector,
					windows,
				} = collaborators;

				let mut runner = Runner::new(recognizer.as_mut(), injector.as_mut(), windows.as_ref(), token);
				if let Some(tx) = events {
					runner = runner.with_events(tx);
				}
				let result = runner.run(&plan);

				if let Ok(mut current) = current.lock() {
					*current = None;
				}
				result
			});

		match worker {
			Ok(worker) => Ok(RunHandle { cancel, worker }),
			Err(err) => {
				// The closure (and the guard in it) was dropped, so the flag is already clear.
				self.set_current(None);
				Err(RunError::Spawn(err))
			}
		}
	}

	/// Stop the active run, if any. Safe to call repeatedly and from any thread.
	pub fn request_cancel(&self) {
		let current = match self.current.lock() {
			Ok(current) => current,
			Err(poisoned) => poisoned.into_inner(),
		};
		if let Some(token) = current.as_ref() {
			if !token.is_cancelled() {
				tracing::info!("stop requested");
			}
			token.cancel();
		}
	}

	fn set_current(&self, token: Option<CancelToken>) {
		let mut current = match self.current.lock() {
			Ok(current) => current,
			Err(poisoned) => poisoned.into_inner(),
		};
		*current = token;
	}
}
