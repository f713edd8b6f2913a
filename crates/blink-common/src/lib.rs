//! Shared types for the blink workspace: the error taxonomy, native window
//! and message types, identifiers, and the core event bus.

pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{BlinkError, ConfigError, CoreError, EngineError, StagingError};
pub use events::{CoreEvent, EventBus};
pub use id::{new_correlation_id, new_id};
pub use types::{CoreState, Disposition, LifecycleState, Message, MessageKind, WindowId};

pub type Result<T> = std::result::Result<T, BlinkError>;
