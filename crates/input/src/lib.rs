//! Terminal input module.
//!
//! Maps `crossterm` key events into [`crate::types::ViewAction`]s for the demo
//! viewer. Mouse picking is handled by the caller, which owns the viewport
//! scale needed to turn a terminal cell back into a screen point.

pub mod map;

pub use isostack_types as types;

pub use map::{handle_key_event, should_quit};
