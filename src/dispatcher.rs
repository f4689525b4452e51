//! Command dispatcher - serialised outbound control changes
//!
//! A single actor owns the control output port. Every CC leaves through it,
//! including the bounded auto-repeat used to keep the jog wheel alive on the
//! receiving side.

mod actor;
mod commands;
mod handle;
mod repeat;

pub use actor::{CommandDispatcher, DispatcherConfig, DEFAULT_MAX_REPEAT, DEFAULT_REPEAT_INTERVAL};
pub use commands::{Command, DispatchCommand};
pub use handle::DispatcherHandle;
pub use repeat::{RepeatEntry, RepeatTable};
