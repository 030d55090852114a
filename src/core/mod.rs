//! Core framework module
//!
//! Contains the context facade, its configuration, the frame scheduler and
//! the crate-wide error type

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod types;

pub use config::{ContextConfig, QuadtreeConfig};
pub use context::{Context, Game};
pub use error::{GfmError, GfmResult};
pub use events::{Event, EventQueue, EventSource, FixedStepSource, TimerSource};
pub use scheduler::{DEFAULT_MAX_RATE, FpsCounter, FrameScheduler};
pub use types::TypeCode;
