//! Grid configuration with per-field fallback to defaults.

use serde::Deserialize;
use tracing::warn;

use crate::types::{
    DEFAULT_COLUMN_COUNT, DEFAULT_MAX_Z, DEFAULT_ROW_COUNT, DEFAULT_SCREEN_OFFSET_X,
    DEFAULT_SCREEN_OFFSET_Y, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH, DEFAULT_Z_STEP,
    MAX_GRID_SIDE, MAX_SCREEN_EXTENT, MAX_SLOT_COUNT, MAX_TILE_EXTENT, MAX_Z_LIMIT,
};

/// Immutable per-grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub column_count: u32,
    pub row_count: u32,
    pub screen_offset_x: u32,
    pub screen_offset_y: u32,
    pub z_step: u32,
    pub max_z: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            column_count: DEFAULT_COLUMN_COUNT,
            row_count: DEFAULT_ROW_COUNT,
            screen_offset_x: DEFAULT_SCREEN_OFFSET_X,
            screen_offset_y: DEFAULT_SCREEN_OFFSET_Y,
            z_step: DEFAULT_Z_STEP,
            max_z: DEFAULT_MAX_Z,
        }
    }
}

/// Raw values from an external loader. Missing fields keep their default.
///
/// Fields are signed so that negative input can be detected and reported
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfigOverrides {
    pub tile_width: Option<i64>,
    pub tile_height: Option<i64>,
    pub column_count: Option<i64>,
    pub row_count: Option<i64>,
    pub screen_offset_x: Option<i64>,
    pub screen_offset_y: Option<i64>,
    pub z_step: Option<i64>,
    pub max_z: Option<i64>,
}

/// `value` if it lies in `1..=max`, else `default` with a warning.
fn bounded(name: &'static str, value: Option<i64>, default: u32, max: u32) -> u32 {
    match value {
        None => default,
        Some(v) if v > 0 && v <= i64::from(max) => v as u32,
        Some(v) => {
            warn!(field = name, value = v, default, max, "invalid grid config value, using default");
            default
        }
    }
}

impl GridConfig {
    /// Build a config, replacing every invalid override with its default.
    pub fn from_overrides(o: GridConfigOverrides) -> Self {
        let d = Self::default();
        let max_z = match o.max_z {
            Some(v) if (1..=i64::from(MAX_Z_LIMIT)).contains(&v) => v as u32,
            None => d.max_z,
            Some(v) => {
                warn!(
                    field = "maxZ",
                    value = v,
                    default = d.max_z,
                    "max height out of range, using default"
                );
                d.max_z
            }
        };
        let mut cfg = Self {
            tile_width: bounded("tileWidth", o.tile_width, d.tile_width, MAX_TILE_EXTENT),
            tile_height: bounded("tileHeight", o.tile_height, d.tile_height, MAX_TILE_EXTENT),
            column_count: bounded("columnCount", o.column_count, d.column_count, MAX_GRID_SIDE),
            row_count: bounded("rowCount", o.row_count, d.row_count, MAX_GRID_SIDE),
            screen_offset_x: bounded(
                "screenOffsetX",
                o.screen_offset_x,
                d.screen_offset_x,
                MAX_SCREEN_EXTENT,
            ),
            screen_offset_y: bounded(
                "screenOffsetY",
                o.screen_offset_y,
                d.screen_offset_y,
                MAX_SCREEN_EXTENT,
            ),
            z_step: bounded("zStep", o.z_step, d.z_step, MAX_SCREEN_EXTENT),
            max_z,
        };
        if cfg.slot_count() > MAX_SLOT_COUNT {
            warn!(
                columns = cfg.column_count,
                rows = cfg.row_count,
                levels = cfg.levels(),
                max = MAX_SLOT_COUNT,
                "grid too large, using default column and row count"
            );
            cfg.column_count = d.column_count;
            cfg.row_count = d.row_count;
        }
        cfg
    }

    /// Parse overrides from JSON. Malformed input yields the default config.
    pub fn from_json_str(json: &str) -> Self {
        match serde_json::from_str::<GridConfigOverrides>(json) {
            Ok(o) => Self::from_overrides(o),
            Err(e) => {
                warn!(error = %e, "unreadable grid config, using defaults");
                Self::default()
            }
        }
    }

    /// Number of levels per column (`max_z + 1`).
    pub fn levels(&self) -> u32 {
        self.max_z + 1
    }

    /// Total slot count of the `z × row × column` array.
    pub fn slot_count(&self) -> usize {
        self.levels() as usize * self.row_count as usize * self.column_count as usize
    }

    /// Flat index of an in-bounds slot, laid out `z`-major then row-major.
    #[inline(always)]
    pub fn slot_index(&self, x: u32, y: u32, z: u32) -> usize {
        let (cols, rows) = (self.column_count as usize, self.row_count as usize);
        (z as usize * rows + y as usize) * cols + x as usize
    }

    /// Inverse of [`GridConfig::slot_index`].
    pub fn slot_coords(&self, index: usize) -> (u32, u32, u32) {
        let (cols, rows) = (self.column_count as usize, self.row_count as usize);
        let x = index % cols;
        let y = (index / cols) % rows;
        let z = index / (cols * rows);
        (x as u32, y as u32, z as u32)
    }

    /// Validate signed coordinates against the grid bounds.
    pub fn checked(&self, x: i64, y: i64, z: i64) -> Option<(u32, u32, u32)> {
        let in_range = |v: i64, limit: u32| v >= 0 && v < i64::from(limit);
        if in_range(x, self.column_count) && in_range(y, self.row_count) && in_range(z, self.levels())
        {
            Some((x as u32, y as u32, z as u32))
        } else {
            None
        }
    }
}
