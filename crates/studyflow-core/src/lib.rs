//! # StudyFlow Core Library
//!
//! The study timer behind StudyFlow: a Pomodoro-style countdown that cycles
//! Focus, Short Break and Long Break phases, survives the host being
//! suspended, and asks a pluggable port to notify the user when a phase
//! ends.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. It owns no
//!   threads; the caller invokes `tick()` once per second while it runs
//! - **Driver**: A tokio actor that owns the engine, delivers ticks and
//!   forwards host commands and lifecycle signals
//! - **Storage**: TOML-based configuration with validation into
//!   [`TimerSettings`]
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerHandle`]: Async handle to an engine running in its driver task
//! - [`NotificationPort`]: Capability the engine calls on phase completion
//! - [`Clock`]: Source of wall-clock time for the engine
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{TimerHandle, TimerOp};
pub use error::{ConfigError, CoreError};
pub use events::Event;
pub use notify::{LogNotifier, NotificationPort, SilentNotifier};
pub use storage::Config;
pub use timer::{RunState, TimerEngine, TimerPhase, TimerSettings, TimerSnapshot};
