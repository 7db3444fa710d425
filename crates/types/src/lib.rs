//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! Everything here is plain data, usable from the core engine, the terminal
//! backend and the demo binary alike.
//!
//! # Grid Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_TILE_WIDTH` | 64 | Cartesian width of one cell |
//! | `DEFAULT_TILE_HEIGHT` | 64 | Cartesian height of one cell |
//! | `DEFAULT_COLUMN_COUNT` | 10 | Cells along x |
//! | `DEFAULT_ROW_COUNT` | 10 | Cells along y |
//! | `DEFAULT_SCREEN_OFFSET_X` | 400 | Screen x of the projected origin |
//! | `DEFAULT_SCREEN_OFFSET_Y` | 100 | Screen y of the projected origin |
//! | `DEFAULT_Z_STEP` | 16 | Screen pixels per stack level |
//! | `DEFAULT_MAX_Z` | 7 | Highest stack level |
//!
//! # Grid Limits
//!
//! Overrides above these fall back to the default. They keep cartesian
//! products and the slot array well inside `i64` and memory.
//!
//! | Constant | Value | Bounds |
//! |----------|-------|--------|
//! | `MAX_Z_LIMIT` | 63 | `max_z` |
//! | `MAX_TILE_EXTENT` | 65536 | tile width and height |
//! | `MAX_GRID_SIDE` | 4096 | column and row count |
//! | `MAX_SCREEN_EXTENT` | 1048576 | screen offsets and z step |
//! | `MAX_SLOT_COUNT` | 4194304 | `columns × rows × (max_z + 1)` |
//!
//! # Examples
//!
//! ```
//! use isostack_types::{Direction, Facing, StairDirection};
//!
//! let view = Direction::North.rotate_cw();
//! assert_eq!(view, Direction::East);
//! assert_eq!(Direction::from_str("w"), Some(Direction::West));
//!
//! let stair = Facing::Stair(StairDirection::NwToSe);
//! assert_eq!(stair.index(), 2);
//! ```

use serde::Deserialize;

/// Default cartesian cell width
pub const DEFAULT_TILE_WIDTH: u32 = 64;

/// Default cartesian cell height
pub const DEFAULT_TILE_HEIGHT: u32 = 64;

/// Default number of columns (x extent)
pub const DEFAULT_COLUMN_COUNT: u32 = 10;

/// Default number of rows (y extent)
pub const DEFAULT_ROW_COUNT: u32 = 10;

/// Default screen x offset of the projected origin
pub const DEFAULT_SCREEN_OFFSET_X: u32 = 400;

/// Default screen y offset of the projected origin
pub const DEFAULT_SCREEN_OFFSET_Y: u32 = 100;

/// Default screen pixels per stack level
pub const DEFAULT_Z_STEP: u32 = 16;

/// Default highest stack level (inclusive)
pub const DEFAULT_MAX_Z: u32 = 7;

/// Largest accepted `max_z`; anything above falls back to the default.
pub const MAX_Z_LIMIT: u32 = 63;

/// Largest accepted tile width or height.
pub const MAX_TILE_EXTENT: u32 = 1 << 16;

/// Largest accepted column or row count.
pub const MAX_GRID_SIDE: u32 = 4096;

/// Largest accepted screen offset or z step.
pub const MAX_SCREEN_EXTENT: u32 = 1 << 20;

/// Largest accepted slot array; larger grids fall back to the default extent.
pub const MAX_SLOT_COUNT: usize = 1 << 22;

/// Tint applied to a hovered/selected tile when no z-tint is active.
pub const HIGHLIGHT_TINT: Rgb = Rgb::new(0xff, 0xee, 0x88);

/// How much a highlight lightens an active z-tint (percent towards white).
pub const HIGHLIGHT_LIGHTEN_PERCENT: u8 = 30;

/// Z-tint palette, indexed by `min(z, len - 1)`. Lower levels are lighter.
pub const Z_TINT_PALETTE: [Rgb; 8] = [
    Rgb::new(0xff, 0xff, 0xff),
    Rgb::new(0xdd, 0xee, 0xff),
    Rgb::new(0xbb, 0xdd, 0xff),
    Rgb::new(0x99, 0xbb, 0xee),
    Rgb::new(0x77, 0x99, 0xdd),
    Rgb::new(0x55, 0x77, 0xbb),
    Rgb::new(0x33, 0x55, 0x99),
    Rgb::new(0x22, 0x33, 0x77),
];

/// Screen pixels between a tile's anchor and its z label.
pub const LABEL_OFFSET_Y: f64 = 12.0;

/// Depth bias keeping a z label above its tile.
pub const LABEL_DEPTH_BIAS: f64 = 0.5;

/// Depth bias keeping an attached object above its tile.
pub const OBJECT_DEPTH_BIAS: f64 = 0.25;

/// X-ray opacity of a non-top tile at z = 0.
pub const XRAY_BASE_ALPHA: f32 = 0.3;

/// X-ray opacity gained per stack level.
pub const XRAY_ALPHA_STEP: f32 = 0.15;

/// X-ray opacity cap for non-top tiles.
pub const XRAY_ALPHA_CAP: f32 = 0.7;

/// Opacity of ghost placeholders.
pub const GHOST_ALPHA: f32 = 0.15;

/// Neutral ghost tint.
pub const GHOST_TINT: Rgb = Rgb::new(0x88, 0x88, 0x88);

/// Depth bias placing ghosts slightly behind real tiles.
pub const GHOST_DEPTH_BIAS: f64 = -0.5;

/// Maximum number of idle ghost handles kept for reuse.
///
/// Covers the default 800-slot grid. Placing or removing a tile under x-ray
/// only cycles that column's ghosts, but `bulk_load` and `clear` release every
/// ghost at once, so on grids with more empty slots than this the surplus is
/// destroyed and recreated on each bulk operation.
pub const GHOST_POOL_CAPACITY: usize = 1024;

/// Texture key shared by every ghost placeholder.
pub const GHOST_TEXTURE_KEY: &str = "tile_ghost";

/// 24-bit RGB color used for tints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Move each channel `percent` of the way towards white.
    ///
    /// ```
    /// use isostack_types::Rgb;
    ///
    /// assert_eq!(Rgb::new(0, 100, 255).lighten(50), Rgb::new(127, 177, 255));
    /// ```
    pub fn lighten(self, percent: u8) -> Self {
        let pct = u16::from(percent.min(100));
        let ch = |c: u8| {
            let c = u16::from(c);
            (c + (255 - c) * pct / 100) as u8
        };
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }
}

/// View rotation, doubling as the directional sprite-frame index.
///
/// - **North**: 0°, the unrotated view
/// - **East**: rotated 90° clockwise
/// - **South**: rotated 180°
/// - **West**: rotated 270° clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Numeric index (North = 0 ... West = 3)
    pub fn index(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Inverse of [`Direction::index`], wrapping modulo 4.
    pub fn from_index(i: u8) -> Self {
        Self::ALL[(i % 4) as usize]
    }

    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use isostack_types::Direction;
    ///
    /// assert_eq!(Direction::West.rotate_cw(), Direction::North);
    /// ```
    pub fn rotate_cw(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Parse from full name or single letter (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "east" | "e" => Some(Direction::East),
            "south" | "s" => Some(Direction::South),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

/// Diagonal facing used only by the stair tile kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StairDirection {
    /// Ascends from south-east to north-west
    SeToNw,
    /// Ascends from south-west to north-east
    SwToNe,
    /// Ascends from north-west to south-east
    NwToSe,
    /// Ascends from north-east to south-west
    NeToSw,
}

impl StairDirection {
    pub fn index(self) -> u8 {
        match self {
            StairDirection::SeToNw => 0,
            StairDirection::SwToNe => 1,
            StairDirection::NwToSe => 2,
            StairDirection::NeToSw => 3,
        }
    }

    pub fn from_index(i: u8) -> Self {
        match i % 4 {
            0 => StairDirection::SeToNw,
            1 => StairDirection::SwToNe,
            2 => StairDirection::NwToSe,
            _ => StairDirection::NeToSw,
        }
    }
}

/// Orientation of a tile: cardinal for ordinary kinds, diagonal for stairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    Cardinal(Direction),
    Stair(StairDirection),
}

impl Facing {
    /// Interpret a raw facing number for the given tile kind.
    pub fn for_kind(kind: TileKind, raw: u8) -> Self {
        if kind.is_stair() {
            Facing::Stair(StairDirection::from_index(raw))
        } else {
            Facing::Cardinal(Direction::from_index(raw))
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Facing::Cardinal(d) => d.index(),
            Facing::Stair(s) => s.index(),
        }
    }
}

/// Tile kind identifier. Kinds map to texture keys `tile_{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct TileKind(pub u16);

impl TileKind {
    /// Kind used to fill the levels below a placed cell.
    pub const FILL: TileKind = TileKind(1);

    /// Stair kind; its facings rotate against the view.
    pub const STAIR: TileKind = TileKind(9);

    pub fn is_stair(self) -> bool {
        self == Self::STAIR
    }

    pub fn texture_key(self) -> String {
        format!("tile_{}", self.0)
    }
}

/// Kind of an object sitting on top of a tile. Texture key `object_{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ObjectKind(pub u16);

impl ObjectKind {
    pub fn texture_key(self) -> String {
        format!("object_{}", self.0)
    }
}

/// Per-cell payload accepted by grid mutations and bulk layouts.
///
/// In JSON layouts, `null` and `0` are empty, a positive integer is a bare
/// tile kind, and an object `{"kind", "height", "facing", "object"}` carries
/// the full description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCell")]
pub enum CellContent {
    Empty,
    Simple(TileKind),
    Detailed {
        kind: TileKind,
        height: u32,
        facing: Option<Facing>,
        object: Option<ObjectKind>,
    },
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Tile kind, or `None` for empty content.
    pub fn kind(&self) -> Option<TileKind> {
        match *self {
            CellContent::Empty => None,
            CellContent::Simple(kind) | CellContent::Detailed { kind, .. } => Some(kind),
        }
    }

    /// Stack level requested by a layout entry (0 unless detailed).
    pub fn height(&self) -> u32 {
        match *self {
            CellContent::Detailed { height, .. } => height,
            _ => 0,
        }
    }

    pub fn facing(&self) -> Option<Facing> {
        match *self {
            CellContent::Detailed { facing, .. } => facing,
            _ => None,
        }
    }

    pub fn object(&self) -> Option<ObjectKind> {
        match *self {
            CellContent::Detailed { object, .. } => object,
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Marker(Option<u16>),
    Detailed {
        kind: u16,
        #[serde(default)]
        height: u32,
        #[serde(default)]
        facing: Option<u8>,
        #[serde(default)]
        object: Option<u16>,
    },
}

impl From<RawCell> for CellContent {
    fn from(raw: RawCell) -> Self {
        match raw {
            RawCell::Marker(None) | RawCell::Marker(Some(0)) => CellContent::Empty,
            RawCell::Marker(Some(kind)) => CellContent::Simple(TileKind(kind)),
            RawCell::Detailed { kind: 0, .. } => CellContent::Empty,
            RawCell::Detailed {
                kind,
                height,
                facing,
                object,
            } => {
                let kind = TileKind(kind);
                CellContent::Detailed {
                    kind,
                    height,
                    facing: facing.map(|raw| Facing::for_kind(kind, raw)),
                    object: object.map(ObjectKind),
                }
            }
        }
    }
}

/// Host-level actions bound to input by the demo front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    Raise,
    Lower,
    RotateCw,
    RotateCcw,
    ToggleZTint,
    ToggleXray,
    Reload,
}

impl ViewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewAction::CursorLeft => "cursorLeft",
            ViewAction::CursorRight => "cursorRight",
            ViewAction::CursorUp => "cursorUp",
            ViewAction::CursorDown => "cursorDown",
            ViewAction::Raise => "raise",
            ViewAction::Lower => "lower",
            ViewAction::RotateCw => "rotateCw",
            ViewAction::RotateCcw => "rotateCcw",
            ViewAction::ToggleZTint => "toggleZTint",
            ViewAction::ToggleXray => "toggleXray",
            ViewAction::Reload => "reload",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_cycles() {
        let mut d = Direction::North;
        for expected in [Direction::East, Direction::South, Direction::West, Direction::North] {
            d = d.rotate_cw();
            assert_eq!(d, expected);
        }
        assert_eq!(Direction::North.rotate_ccw(), Direction::West);
        assert_eq!(Direction::from_index(6), Direction::South);
    }

    #[test]
    fn facing_depends_on_kind() {
        assert_eq!(
            Facing::for_kind(TileKind::STAIR, 1),
            Facing::Stair(StairDirection::SwToNe)
        );
        assert_eq!(
            Facing::for_kind(TileKind(3), 1),
            Facing::Cardinal(Direction::East)
        );
    }

    #[test]
    fn cell_content_from_json() {
        let cells: Vec<CellContent> =
            serde_json::from_str(r#"[null, 0, 4, {"kind": 9, "height": 2, "facing": 3, "object": 7}]"#)
                .unwrap();
        assert_eq!(cells[0], CellContent::Empty);
        assert_eq!(cells[1], CellContent::Empty);
        assert_eq!(cells[2], CellContent::Simple(TileKind(4)));
        assert_eq!(
            cells[3],
            CellContent::Detailed {
                kind: TileKind::STAIR,
                height: 2,
                facing: Some(Facing::Stair(StairDirection::NeToSw)),
                object: Some(ObjectKind(7)),
            }
        );
        assert_eq!(cells[3].height(), 2);
        assert_eq!(cells[2].height(), 0);
    }

    #[test]
    fn lighten_saturates_at_white() {
        assert_eq!(Rgb::new(10, 20, 30).lighten(100), Rgb::new(255, 255, 255));
        assert_eq!(Rgb::new(10, 20, 30).lighten(0), Rgb::new(10, 20, 30));
    }
}
