//! StackedGrid - the `z × row × column` array of tile slots
//!
//! The grid exclusively owns its tiles in a flat slot array (see
//! [`GridConfig::slot_index`]) and is the single place where columns change.
//! Every mutation keeps two invariants:
//!
//! - **Contiguity**: if a column has a tile at height `h`, it has tiles at
//!   every height below `h`.
//! - **Stack visibility**: outside x-ray, only the top tile of a column is
//!   visible; lower tiles are hidden by stacking.
//!
//! Out-of-bounds coordinates are ignored everywhere: mutations become no-ops
//! and queries return `None`.
//!
//! # Example
//!
//! ```
//! use isostack_core::{CellContent, GridConfig, HeadlessBackend, StackedGrid};
//! use isostack_core::types::TileKind;
//!
//! let cfg = GridConfig::default();
//! let mut grid = StackedGrid::new(cfg, HeadlessBackend::new(&cfg));
//! grid.place(2, 3, 2, CellContent::Simple(TileKind(4)));
//!
//! // Levels below were filled to keep the column contiguous.
//! assert_eq!(grid.column_height(2, 3), Some(3));
//! assert_eq!(grid.lookup(2, 3, None).map(|t| t.z()), Some(2));
//! ```

use tracing::{debug, warn};

use crate::anim::AnimationRegistry;
use crate::config::GridConfig;
use crate::coords::CoordinateTransformer;
use crate::render::{flush_batch, HandleAllocator, IntentBatch, RenderBackend};
use crate::tactical::{Scene, TacticalVisibilityEngine};
use crate::tile::{Occupant, Tile, TileContext};
use crate::types::{CellContent, Direction, TileKind};

pub struct StackedGrid<B: RenderBackend> {
    config: GridConfig,
    transformer: CoordinateTransformer,
    registry: AnimationRegistry,
    direction: Direction,
    slots: Vec<Option<Tile>>,
    tactical: TacticalVisibilityEngine,
    ids: HandleAllocator,
    highlighted: Option<(u32, u32, u32)>,
    backend: B,
}

impl<B: RenderBackend> StackedGrid<B> {
    pub fn new(config: GridConfig, backend: B) -> Self {
        Self::with_registry(config, AnimationRegistry::new(), backend)
    }

    pub fn with_registry(config: GridConfig, registry: AnimationRegistry, backend: B) -> Self {
        Self {
            config,
            transformer: CoordinateTransformer::new(&config),
            registry,
            direction: Direction::North,
            slots: vec![None; config.slot_count()],
            tactical: TacticalVisibilityEngine::new(),
            ids: HandleAllocator::default(),
            highlighted: None,
            backend,
        }
    }

    /// Replace the overlay engine (e.g. to pick a different ghost pool size).
    /// Only valid before any overlay is turned on.
    pub fn with_tactical(mut self, tactical: TacticalVisibilityEngine) -> Self {
        self.tactical = tactical;
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tactical(&self) -> &TacticalVisibilityEngine {
        &self.tactical
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Every occupied slot, `z`-major then row-major.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.slots.iter().flatten()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles().count()
    }

    /// Split borrow: the overlay engine plus everything an overlay pass touches.
    fn scene(&mut self) -> (&mut TacticalVisibilityEngine, Scene<'_, B>) {
        (
            &mut self.tactical,
            Scene {
                config: &self.config,
                ctx: TileContext::new(&self.transformer, &self.registry, self.direction),
                slots: &mut self.slots,
                ids: &mut self.ids,
                backend: &mut self.backend,
            },
        )
    }

    /// Place `content` at `(x, y, z)`.
    ///
    /// - `Empty` removes the slot at `z` and everything above it.
    /// - Otherwise fills missing levels below `z` with [`TileKind::FILL`],
    ///   creates or updates the tile at `z`, and removes everything above.
    ///
    /// While x-ray is on only this column's ghosts and opacity are rebuilt.
    ///
    /// Out-of-bounds coordinates are silently ignored.
    pub fn place(&mut self, x: i32, y: i32, z: i32, content: CellContent) {
        let Some(cell) = self.config.checked(x.into(), y.into(), z.into()) else {
            return;
        };
        let (x, y, _) = cell;
        {
            let (tactical, mut scene) = self.scene();
            tactical.suspend_column(x, y, &mut scene);
        }
        self.place_cell(cell, content);
        let (tactical, mut scene) = self.scene();
        tactical.resume_column(x, y, &mut scene);
    }

    /// Same as placing [`CellContent::Empty`].
    pub fn remove(&mut self, x: i32, y: i32, z: i32) {
        self.place(x, y, z, CellContent::Empty);
    }

    /// Clear the grid, then place every non-empty entry of `layout[y][x]` at
    /// its own height (0 unless detailed).
    ///
    /// While x-ray is on the overlay is rebuilt once for the whole grid.
    pub fn bulk_load<R: AsRef<[CellContent]>>(&mut self, layout: &[R]) {
        let xray = self.tactical.xray_active();
        if xray {
            let (tactical, mut scene) = self.scene();
            tactical.set_xray(false, &mut scene);
        }
        self.clear_slots();

        let mut placed = 0usize;
        for (y, row) in layout.iter().enumerate() {
            for (x, content) in row.as_ref().iter().enumerate() {
                if content.is_empty() {
                    continue;
                }
                let cell = self.config.checked(
                    i64::try_from(x).unwrap_or(i64::MAX),
                    i64::try_from(y).unwrap_or(i64::MAX),
                    i64::from(content.height()),
                );
                if let Some(cell) = cell {
                    self.place_cell(cell, *content);
                    placed += 1;
                }
            }
        }
        debug!(rows = layout.len(), placed, "bulk load");

        if xray {
            let (tactical, mut scene) = self.scene();
            tactical.set_xray(true, &mut scene);
        }
    }

    /// Remove every tile.
    pub fn clear(&mut self) {
        let xray = self.tactical.xray_active();
        if xray {
            let (tactical, mut scene) = self.scene();
            tactical.set_xray(false, &mut scene);
        }
        self.clear_slots();
        if xray {
            let (tactical, mut scene) = self.scene();
            tactical.set_xray(true, &mut scene);
        }
    }

    fn clear_slots(&mut self) {
        let mut batch = IntentBatch::new();
        for slot in self.slots.iter_mut() {
            if let Some(tile) = slot.take() {
                let cell = (tile.x(), tile.y(), tile.z());
                tile.destroy(&mut batch);
                flush_batch(&mut self.backend, &mut batch, cell);
            }
        }
        self.highlighted = None;
    }

    /// Column mutation for an in-bounds cell. Does not touch x-ray state.
    fn place_cell(&mut self, (x, y, z): (u32, u32, u32), content: CellContent) {
        match content.kind() {
            None => self.truncate_column(x, y, z),
            Some(kind) => {
                for level in 0..z {
                    if self.slots[self.config.slot_index(x, y, level)].is_none() {
                        self.spawn_slot(x, y, level, Occupant::new(TileKind::FILL));
                    }
                }
                let occupant = Occupant {
                    kind,
                    facing: content.facing(),
                    object: content.object(),
                };
                self.set_slot(x, y, z, occupant);
                self.truncate_column(x, y, z + 1);
            }
        }
        self.sync_column_visibility(x, y);
    }

    /// Remove the slot at `from` and every slot above it.
    fn truncate_column(&mut self, x: u32, y: u32, from: u32) {
        let mut batch = IntentBatch::new();
        for level in from..self.config.levels() {
            let idx = self.config.slot_index(x, y, level);
            if let Some(tile) = self.slots[idx].take() {
                if self.highlighted == Some((x, y, level)) {
                    self.highlighted = None;
                }
                tile.destroy(&mut batch);
                flush_batch(&mut self.backend, &mut batch, (x, y, level));
            }
        }
    }

    fn warn_missing_textures(&self, occupant: &Occupant, cell: (u32, u32, u32)) {
        let (x, y, z) = cell;
        let key = occupant.kind.texture_key();
        if !self.backend.has_texture(&key) {
            warn!(x, y, z, texture = %key, "missing tile texture");
        }
        if let Some(object) = occupant.object {
            let key = object.texture_key();
            if !self.backend.has_texture(&key) {
                warn!(x, y, z, texture = %key, "missing object texture");
            }
        }
    }

    fn spawn_slot(&mut self, x: u32, y: u32, z: u32, occupant: Occupant) {
        self.warn_missing_textures(&occupant, (x, y, z));
        let ctx = TileContext::new(&self.transformer, &self.registry, self.direction);
        let mut batch = IntentBatch::new();
        let mut tile = Tile::spawn(x, y, z, occupant, &ctx, &mut self.ids, &mut batch);
        if self.tactical.z_tint_active() {
            tile.set_z_tint(true, &mut self.ids, &mut batch);
        }
        flush_batch(&mut self.backend, &mut batch, (x, y, z));
        let idx = self.config.slot_index(x, y, z);
        self.slots[idx] = Some(tile);
    }

    fn set_slot(&mut self, x: u32, y: u32, z: u32, occupant: Occupant) {
        let idx = self.config.slot_index(x, y, z);
        match self.slots[idx].as_ref().map(Tile::occupant) {
            None => self.spawn_slot(x, y, z, occupant),
            Some(current) if current == occupant => {}
            Some(_) => {
                self.warn_missing_textures(&occupant, (x, y, z));
                let ctx = TileContext::new(&self.transformer, &self.registry, self.direction);
                let mut batch = IntentBatch::new();
                if let Some(tile) = self.slots[idx].as_mut() {
                    tile.update(occupant, &ctx, &mut self.ids, &mut batch);
                }
                flush_batch(&mut self.backend, &mut batch, (x, y, z));
            }
        }
    }

    /// Show the top tile of the column, hide the rest.
    fn sync_column_visibility(&mut self, x: u32, y: u32) {
        let top = self.column_height(x, y).map(|h| h - 1);
        let mut batch = IntentBatch::new();
        for level in 0..self.config.levels() {
            let idx = self.config.slot_index(x, y, level);
            if let Some(tile) = self.slots[idx].as_mut() {
                tile.set_stack_visible(top == Some(level), &mut batch);
                flush_batch(&mut self.backend, &mut batch, (x, y, level));
            }
        }
    }

    /// Tile at `(x, y, z)`, or the topmost tile of the column when `z` is `None`.
    pub fn lookup(&self, x: i32, y: i32, z: Option<i32>) -> Option<&Tile> {
        match z {
            Some(z) => {
                let (x, y, z) = self.config.checked(x.into(), y.into(), z.into())?;
                self.slots[self.config.slot_index(x, y, z)].as_ref()
            }
            None => {
                let (x, y, _) = self.config.checked(x.into(), y.into(), 0)?;
                (0..self.config.levels())
                    .rev()
                    .find_map(|level| self.slots[self.config.slot_index(x, y, level)].as_ref())
            }
        }
    }

    /// Number of occupied levels in a column; `None` if out of bounds or empty.
    pub fn column_height(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.config.column_count || y >= self.config.row_count {
            return None;
        }
        (0..self.config.levels())
            .rev()
            .find(|&level| self.slots[self.config.slot_index(x, y, level)].is_some())
            .map(|top| top + 1)
    }

    /// Frontmost tile whose on-screen bounds contain the point.
    ///
    /// Levels are searched from `max_z` down; within a level, row-major scan
    /// order decides between overlapping tiles.
    pub fn pick_by_screen_point(&self, screen_x: f64, screen_y: f64) -> Option<&Tile> {
        let cfg = &self.config;
        for z in (0..cfg.levels()).rev() {
            for y in 0..cfg.row_count {
                for x in 0..cfg.column_count {
                    if let Some(tile) = self.slots[cfg.slot_index(x, y, z)].as_ref() {
                        if self.backend.contains_point(tile.handle(), screen_x, screen_y) {
                            return Some(tile);
                        }
                    }
                }
            }
        }
        None
    }

    /// Rotate the view. Every tile and every shown ghost is repositioned,
    /// re-depthed and re-framed.
    pub fn rotate_view_to(&mut self, direction: Direction) {
        if direction == self.direction {
            return;
        }
        debug!(from = self.direction.as_str(), to = direction.as_str(), "rotate view");
        self.direction = direction;

        let ctx = TileContext::new(&self.transformer, &self.registry, direction);
        let mut batch = IntentBatch::new();
        for tile in self.slots.iter_mut().flatten() {
            tile.refresh(&ctx, &mut batch);
            flush_batch(&mut self.backend, &mut batch, (tile.x(), tile.y(), tile.z()));
        }

        if self.tactical.xray_active() {
            let (tactical, mut scene) = self.scene();
            tactical.rotate(&mut scene);
        }
    }

    pub fn rotate_view_cw(&mut self) {
        self.rotate_view_to(self.direction.rotate_cw());
    }

    pub fn rotate_view_ccw(&mut self) {
        self.rotate_view_to(self.direction.rotate_ccw());
    }

    /// Highlight the tile at `(x, y, z)`, clearing any previous highlight.
    /// Returns `false` if there is no tile there.
    pub fn highlight(&mut self, x: i32, y: i32, z: i32) -> bool {
        let Some(cell) = self.config.checked(x.into(), y.into(), z.into()) else {
            return false;
        };
        let idx = self.config.slot_index(cell.0, cell.1, cell.2);
        if self.slots[idx].is_none() {
            return false;
        }
        if self.highlighted == Some(cell) {
            return true;
        }
        self.clear_highlight();

        let mut batch = IntentBatch::new();
        if let Some(tile) = self.slots[idx].as_mut() {
            tile.set_highlight(true, &mut batch);
        }
        flush_batch(&mut self.backend, &mut batch, cell);
        self.highlighted = Some(cell);
        true
    }

    pub fn clear_highlight(&mut self) {
        let Some(cell) = self.highlighted.take() else {
            return;
        };
        let (x, y, z) = cell;
        let idx = self.config.slot_index(x, y, z);
        let mut batch = IntentBatch::new();
        if let Some(tile) = self.slots[idx].as_mut() {
            tile.set_highlight(false, &mut batch);
        }
        flush_batch(&mut self.backend, &mut batch, cell);
    }

    pub fn highlighted(&self) -> Option<&Tile> {
        let (x, y, z) = self.highlighted?;
        self.slots[self.config.slot_index(x, y, z)].as_ref()
    }

    pub fn set_z_tint(&mut self, on: bool) {
        let (tactical, mut scene) = self.scene();
        tactical.set_z_tint(on, &mut scene);
    }

    pub fn set_xray(&mut self, on: bool) {
        let (tactical, mut scene) = self.scene();
        tactical.set_xray(on, &mut scene);
    }

    pub fn toggle_z_tint(&mut self) {
        let on = !self.tactical.z_tint_active();
        self.set_z_tint(on);
    }

    pub fn toggle_xray(&mut self) {
        let on = !self.tactical.xray_active();
        self.set_xray(on);
    }
}
