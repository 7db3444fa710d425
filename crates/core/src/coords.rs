//! Coordinates - cell to cartesian to isometric screen space
//!
//! Two stages:
//!
//! 1. [`CoordinateTransformer::project`] rotates a logical cell `(x, y)` by the
//!    view direction and scales it to cartesian units.
//! 2. [`CoordinateTransformer::to_screen`] applies the isometric transform
//!    `(cx - cy, (cx + cy) / 2)`, halves it, adds the screen offset and raises
//!    the point by `z_step` per stack level.
//!
//! Depth for back-to-front ordering is `cx + cy + z_step * z`.

use crate::config::GridConfig;
use crate::types::Direction;

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Pure cell/screen transform for one grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    width: i64,
    height: i64,
    columns: i64,
    rows: i64,
    offset_x: f64,
    offset_y: f64,
    z_step: f64,
}

impl CoordinateTransformer {
    pub fn new(cfg: &GridConfig) -> Self {
        Self {
            width: i64::from(cfg.tile_width),
            height: i64::from(cfg.tile_height),
            columns: i64::from(cfg.column_count),
            rows: i64::from(cfg.row_count),
            offset_x: f64::from(cfg.screen_offset_x),
            offset_y: f64::from(cfg.screen_offset_y),
            z_step: f64::from(cfg.z_step),
        }
    }

    /// Rotate a logical cell by the view direction into cartesian units.
    ///
    /// Computed in `i64`; with the config limits every product fits.
    pub fn project(&self, x: i32, y: i32, direction: Direction) -> (i64, i64) {
        let (x, y) = (i64::from(x), i64::from(y));
        let (w, h) = (self.width, self.height);
        match direction {
            Direction::North => (x * w, y * h),
            Direction::East => (y * w, (self.columns - 1 - x) * h),
            Direction::South => ((self.columns - 1 - x) * w, (self.rows - 1 - y) * h),
            Direction::West => ((self.rows - 1 - y) * w, x * h),
        }
    }

    /// Isometric transform only (no offset, no scaling, no height).
    pub fn to_iso(cart_x: f64, cart_y: f64) -> (f64, f64) {
        (cart_x - cart_y, (cart_x + cart_y) / 2.0)
    }

    /// Inverse of [`CoordinateTransformer::to_iso`].
    pub fn from_iso(iso_x: f64, iso_y: f64) -> (f64, f64) {
        ((2.0 * iso_y + iso_x) / 2.0, (2.0 * iso_y - iso_x) / 2.0)
    }

    /// Cartesian point at stack level `z` to screen space.
    pub fn to_screen(&self, cart_x: f64, cart_y: f64, z: u32) -> ScreenPoint {
        let (iso_x, iso_y) = Self::to_iso(cart_x, cart_y);
        ScreenPoint {
            x: iso_x / 2.0 + self.offset_x,
            y: iso_y / 2.0 + self.offset_y - self.z_step * f64::from(z),
        }
    }

    /// Undo the screen stage for a known level, yielding isometric coordinates.
    pub fn screen_to_iso(&self, p: ScreenPoint, z: u32) -> (f64, f64) {
        (
            (p.x - self.offset_x) * 2.0,
            (p.y - self.offset_y + self.z_step * f64::from(z)) * 2.0,
        )
    }

    /// Full pipeline: logical cell at level `z` under `direction` to screen.
    pub fn cell_to_screen(&self, x: u32, y: u32, z: u32, direction: Direction) -> ScreenPoint {
        let (cx, cy) = self.project(x as i32, y as i32, direction);
        self.to_screen(cx as f64, cy as f64, z)
    }

    /// Draw-order key; larger draws later.
    pub fn depth(&self, x: u32, y: u32, z: u32, direction: Direction) -> f64 {
        let (cx, cy) = self.project(x as i32, y as i32, direction);
        (cx + cy) as f64 + self.z_step * f64::from(z)
    }
}
