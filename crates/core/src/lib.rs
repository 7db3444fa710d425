//! Core engine - pure geometry and stacking state
//!
//! This crate holds the isometric coordinate pipeline, the stacked tile grid,
//! picking, and the tactical overlays. It never draws: every visual change is
//! expressed as a [`RenderIntent`] and handed to a [`RenderBackend`].
//!
//! # Module Structure
//!
//! - [`config`]: per-grid geometry with default fallback
//! - [`coords`]: cell → cartesian → isometric screen transform
//! - [`anim`]: animated texture keys and object offsets
//! - [`tile`]: one occupied slot; frame selection and overlay state
//! - [`grid`]: the `z × row × column` slot array, mutations, lookup, picking
//! - [`tactical`]: z-tint and x-ray overlays with ghost pooling
//! - [`render`]: intents, the backend trait, handle ids
//! - [`headless`]: in-memory backend for tests and tooling
//! - [`layout`]: JSON bulk layouts
//!
//! # Example
//!
//! ```
//! use isostack_core::{GridConfig, HeadlessBackend, StackedGrid};
//! use isostack_core::types::{CellContent, Direction, TileKind};
//!
//! let cfg = GridConfig::default();
//! let mut grid = StackedGrid::new(cfg, HeadlessBackend::new(&cfg));
//! let layout = vec![vec![CellContent::Simple(TileKind(2)); 3]; 3];
//! grid.bulk_load(&layout);
//!
//! grid.rotate_view_to(Direction::East);
//! grid.set_xray(true);
//! assert_eq!(grid.tiles().filter(|t| t.is_top_of_column()).count(), 9);
//!
//! let at = grid.lookup(1, 1, None).unwrap().screen_position();
//! assert_eq!(grid.pick_by_screen_point(at.x, at.y).map(|t| (t.x(), t.y())), Some((1, 1)));
//! ```

pub mod anim;
pub mod config;
pub mod coords;
pub mod grid;
pub mod headless;
pub mod layout;
pub mod render;
pub mod tactical;
pub mod tile;

pub use isostack_types as types;

pub use anim::AnimationRegistry;
pub use config::{GridConfig, GridConfigOverrides};
pub use coords::{CoordinateTransformer, ScreenPoint};
pub use grid::StackedGrid;
pub use headless::{HeadlessBackend, LabelState, SpriteState};
pub use layout::{parse_layout, Layout, LayoutError};
pub use render::{
    BackendError, HandleAllocator, HandleId, IntentBatch, LabelId, RenderBackend, RenderIntent,
};
pub use tactical::{Ghost, GhostPool, TacticalVisibilityEngine};
pub use tile::{resolve_frame, xray_alpha, z_tint_for, Occupant, Tile, TileContext};
pub use types::CellContent;
