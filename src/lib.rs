//! Isostack (workspace facade crate).
//!
//! Re-exports the workspace crates as `isostack::{core,input,term,types}` so the
//! demo, integration tests, and benches share one import path.

pub use isostack_core as core;
pub use isostack_input as input;
pub use isostack_term as term;
pub use isostack_types as types;
