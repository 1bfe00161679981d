//! The reroll loop.
//!
//! One run hovers the item, reads the affix text, checks it against the rule
//! and rerolls until the rule is satisfied, the attempt budget runs out or
//! the cancel token fires. The token is checked between every step, and every
//! wait is sliced so cancellation takes effect within one poll interval.

use std::sync::mpsc::Sender;
use std::time::Duration;

use matcher::{Matcher, Rule};

use crate::cancel::CancelToken;
use crate::capture::Recognizer;
use crate::config::{Config, InputMode, RerollAction};
use crate::error::{ConfigError, RunError};
use crate::input::{InputInjector, InputTarget};
use crate::profile::{Point, Profile, Region, WindowBinding};
use crate::window::{WindowInfo, WindowResolver};

/// Timing and OCR knobs of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
	pub max_attempts: u32,
	pub hover_settle: Duration,
	pub reroll_interval: Duration,
	pub poll_granularity: Duration,
	pub start_delay: Duration,
	pub reroll_action: RerollAction,
	pub similarity_threshold: f64,
	pub read_options: ie::ReadOptions,
}

impl From<&Config> for LoopSettings {
	fn from(cfg: &Config) -> Self {
		Self {
			max_attempts: cfg.max_attempts,
			hover_settle: cfg.hover_settle(),
			reroll_interval: cfg.reroll_interval(),
			poll_granularity: cfg.poll_granularity(),
			start_delay: cfg.start_delay(),
			reroll_action: cfg.reroll_action,
			similarity_threshold: cfg.similarity_threshold,
			read_options: cfg.read_options(),
		}
	}
}

/// Everything a run needs, as supplied by the caller.
#[derive(Debug, Clone)]
pub struct RunPlan {
	pub profile: Profile,
	pub rule: Rule,
	pub mode: InputMode,
	pub settings: LoopSettings,
}

/// A plan whose preconditions hold.
struct Armed<'a> {
	hover: Point,
	region: Region,
	reroll: Point,
	window: Option<&'a WindowBinding>,
	mode: InputMode,
	rule: &'a Rule,
	settings: &'a LoopSettings,
}

impl RunPlan {
	/// Check that the run could start.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.arm().map(|_| ())
	}

	fn arm(&self) -> Result<Armed<'_>, ConfigError> {
		let hover = self.profile.hover.ok_or(ConfigError::MissingHover)?;
		let region = self.profile.region.ok_or(ConfigError::MissingRegion)?;
		if region.is_empty() {
			return Err(ConfigError::EmptyRegion(region));
		}
		let reroll = self.profile.reroll.ok_or(ConfigError::MissingReroll)?;
		if self.rule.is_empty() {
			return Err(ConfigError::EmptyRule);
		}
		if self.mode == InputMode::Background && self.profile.window.is_none() {
			return Err(ConfigError::BackgroundWithoutWindow);
		}

		Ok(Armed {
			hover,
			region,
			reroll,
			window: self.profile.window.as_ref(),
			mode: self.mode,
			rule: &self.rule,
			settings: &self.settings,
		})
	}
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	Satisfied,
	Exhausted,
	Cancelled,
}

impl std::fmt::Display for RunOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RunOutcome::Satisfied => write!(f, "satisfied"),
			RunOutcome::Exhausted => write!(f, "exhausted"),
			RunOutcome::Cancelled => write!(f, "cancelled"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
	pub outcome: RunOutcome,
	/// Attempts started, including the one that ended the run.
	pub attempts: u32,
	/// The last recognized text, if any attempt got that far.
	pub last_text: String,
}

/// Progress notifications for a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
	Started { max_attempts: u32 },
	Attempt { attempt: u32 },
	Recognized { attempt: u32, text: String },
	Verdict { attempt: u32, matched: bool },
	Finished(RunReport),
	Failed(String),
}

enum Halt {
	Finished(RunOutcome),
	Failed(RunError),
}

impl From<RunError> for Halt {
	fn from(err: RunError) -> Self {
		Halt::Failed(err)
	}
}

/// Drives one run against its collaborators.
pub struct Runner<'a> {
	recognizer: &'a mut dyn Recognizer,
	injector: &'a mut dyn InputInjector,
	windows: &'a dyn WindowResolver,
	cancel: CancelToken,
	events: Option<Sender<RunEvent>>,
	last_origin: Option<(i32, i32)>,
}

impl<'a> Runner<'a> {
	pub fn new(
		recognizer: &'a mut dyn Recognizer,
		injector: &'a mut dyn InputInjector,
		windows: &'a dyn WindowResolver,
		cancel: CancelToken,
	) -> Self {
		Self {
			recognizer,
			injector,
			windows,
			cancel,
			events: None,
			last_origin: None,
		}
	}

	pub fn with_events(mut self, tx: Sender<RunEvent>) -> Self {
		self.events = Some(tx);
		self
	}

	/// Run to completion.
	///
	/// Configuration problems are reported before any input is sent. A lost
	/// window or failing input aborts the run; recognition failures never do.
	pub fn run(&mut self, plan: &RunPlan) -> Result<RunReport, RunError> {
		let armed = match plan.arm() {
			Ok(armed) => armed,
			Err(err) => {
				tracing::error!(error = %err, "run not started");
				self.emit(RunEvent::Failed(err.to_string()));
				return Err(err.into());
			}
		};

		tracing::info!(
			max_attempts = armed.settings.max_attempts,
			mode = %armed.mode,
			rule = %armed.rule,
			"starting reroll loop"
		);
		self.emit(RunEvent::Started {
			max_attempts: armed.settings.max_attempts,
		});

		let mut report = RunReport {
			outcome: RunOutcome::Exhausted,
			attempts: 0,
			last_text: String::new(),
		};
		match self.iterate(&armed, &mut report) {
			Ok(()) => {}
			Err(Halt::Finished(outcome)) => report.outcome = outcome,
			Err(Halt::Failed(err)) => {
				tracing::error!(attempt = report.attempts, error = %err, "run aborted");
				self.emit(RunEvent::Failed(err.to_string()));
				return Err(err);
			}
		}

		tracing::info!(outcome = %report.outcome, attempts = report.attempts, "run finished");
		self.emit(RunEvent::Finished(report.clone()));
		Ok(report)
	}

	fn iterate(&mut self, armed: &Armed, report: &mut RunReport) -> Result<(), Halt> {
		let settings = armed.settings;
		let matcher = Matcher::new(settings.similarity_threshold);

		self.pause(settings.start_delay, settings.poll_granularity)?;

		for attempt in 1..=settings.max_attempts {
			report.attempts = attempt;
			self.checkpoint()?;
			tracing::debug!(attempt, "attempt");
			self.emit(RunEvent::Attempt { attempt });

			let (origin, target) = self.locate(armed)?;
			let (dx, dy) = origin;
			self.injector
				.move_or_hover(armed.hover.offset(dx, dy), &target)
				.map_err(|err| RunError::Input(err.into()))?;
			self.checkpoint()?;

			self.pause(settings.hover_settle, settings.poll_granularity)?;
			self.checkpoint()?;

			let region = armed.region.offset(dx, dy);
			let text = match self.recognizer.capture_and_recognize(region, &settings.read_options) {
				Ok(text) => text,
				Err(err) => {
					tracing::warn!(attempt, error = %err, "recognition failed; treating as empty text");
					String::new()
				}
			};
			tracing::info!(attempt, text = %text.replace('\n', " | "), "recognized");
			self.emit(RunEvent::Recognized {
				attempt,
				text: text.clone(),
			});
			report.last_text = text;
			self.checkpoint()?;

			let matched = matcher.matches(&report.last_text, armed.rule);
			tracing::info!(attempt, matched, "verdict");
			self.emit(RunEvent::Verdict { attempt, matched });
			if matched {
				return Err(Halt::Finished(RunOutcome::Satisfied));
			}
			self.checkpoint()?;

			self.injector
				.trigger_action(settings.reroll_action, armed.reroll.offset(dx, dy), &target)
				.map_err(|err| RunError::Input(err.into()))?;
			self.pause(settings.reroll_interval, settings.poll_granularity)?;
		}

		tracing::warn!(max_attempts = settings.max_attempts, "attempt budget exhausted");
		Ok(())
	}

	/// Offset that turns calibrated coordinates into screen coordinates, and
	/// where input goes. Re-resolved every attempt so a moved window is followed.
	fn locate(&mut self, armed: &Armed) -> Result<((i32, i32), InputTarget), Halt> {
		let Some(binding) = armed.window else {
			return Ok(((0, 0), InputTarget::Foreground));
		};

		let window: WindowInfo = self
			.windows
			.resolve_window(binding)
			.ok_or_else(|| RunError::WindowLost {
				title: binding.title.clone(),
			})?;

		let origin = (window.x, window.y);
		if self.last_origin.is_some_and(|last| last != origin) {
			tracing::info!(x = window.x, y = window.y, title = %window.title, "window moved");
		}
		self.last_origin = Some(origin);

		let target = match armed.mode {
			InputMode::Foreground => InputTarget::Foreground,
			InputMode::Background => InputTarget::Background(window),
		};
		Ok((origin, target))
	}

	fn checkpoint(&self) -> Result<(), Halt> {
		if self.cancel.is_cancelled() {
			tracing::info!("cancellation requested");
			return Err(Halt::Finished(RunOutcome::Cancelled));
		}
		Ok(())
	}

	fn pause(&self, duration: Duration, granularity: Duration) -> Result<(), Halt> {
		if self.cancel.sleep(duration, granularity) {
			Ok(())
		} else {
			tracing::info!("cancellation requested");
			Err(Halt::Finished(RunOutcome::Cancelled))
		}
	}

	fn emit(&self, event: RunEvent) {
		if let Some(tx) = &self.events {
			let _ = tx.send(event);
		}
	}
}
