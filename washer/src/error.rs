use thiserror::Error;

/// A run was asked to start without everything it needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("no hover position calibrated")]
	MissingHover,
	#[error("no capture region calibrated")]
	MissingRegion,
	#[error("capture region {0} has no area")]
	EmptyRegion(crate::profile::Region),
	#[error("no reroll position calibrated")]
	MissingReroll,
	#[error("rule is empty")]
	EmptyRule,
	#[error("background input needs a window binding; recalibrate with --bind-window")]
	BackgroundWithoutWindow,
}

/// Why a run stopped without reaching an outcome.
#[derive(Debug, Error)]
pub enum RunError {
	#[error("invalid run configuration: {0}")]
	Config(#[from] ConfigError),
	#[error("bound window {title:?} could not be found")]
	WindowLost { title: String },
	#[error("input injection failed")]
	Input(#[source] Box<dyn std::error::Error + Send + Sync>),
	#[error("a run is already active")]
	AlreadyRunning,
	#[error("failed to start run worker")]
	Spawn(#[source] std::io::Error),
	#[error("run worker panicked")]
	WorkerPanicked,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
	#[error("no {kind} named {name:?}")]
	NotFound { kind: &'static str, name: String },
	#[error("a {kind} named {name:?} already exists")]
	AlreadyExists { kind: &'static str, name: String },
}
