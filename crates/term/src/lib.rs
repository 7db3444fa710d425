//! Terminal rendering for stacked isometric grids.
//!
//! [`TermBackend`] receives render intents from the core grid and keeps a
//! retained sprite/label scene. Each frame it composes that scene into a
//! depth-tested [`FrameBuffer`], which [`TerminalRenderer`] flushes to the
//! terminal.

pub mod backend;
pub mod fb;
pub mod renderer;

pub use isostack_core as core;
pub use isostack_types as types;

pub use backend::{Glyph, TermBackend, Viewport};
pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use renderer::{changed_rows, encode_rows_into, TerminalRenderer};
