//! Desktop side of the reroll automation: collaborators, the reroll loop,
//! calibration, configuration and the rule/profile store.

pub mod assets;
pub mod calibrate;
pub mod cancel;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod hotkey;
pub mod input;
pub mod notify;
pub mod profile;
pub mod runner;
pub mod store;
pub mod window;

pub use cancel::CancelToken;
pub use config::{Config, InputMode, RerollAction};
pub use engine::{Collaborators, RunHandle, Washer};
pub use error::{ConfigError, RunError, StoreError};
pub use profile::{Point, Profile, Region, WindowBinding};
pub use runner::{LoopSettings, RunEvent, RunOutcome, RunPlan, RunReport, Runner};
