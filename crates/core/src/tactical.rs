//! Tactical overlays - grid-wide z-tint and x-ray modes
//!
//! - **Mode 1 (z-tint)**: every occupied tile is tinted by height and labelled.
//! - **Mode 2 (x-ray)**: marks the top tile of each column, fills every empty
//!   slot with a pooled ghost placeholder, then shows every tile with graded
//!   opacity.
//!
//! Ghost handles come from a [`GhostPool`]. Turning x-ray off hides pooled
//! handles instead of destroying them, so toggling repeatedly on a sparse grid
//! does not churn backend objects. Single-cell edits under x-ray only rebuild
//! the edited column.

use tracing::debug;

use crate::config::GridConfig;
use crate::render::{flush_batch, HandleAllocator, HandleId, IntentBatch, RenderBackend, RenderIntent};
use crate::tile::{Tile, TileContext};
use crate::types::{GHOST_ALPHA, GHOST_DEPTH_BIAS, GHOST_POOL_CAPACITY, GHOST_TEXTURE_KEY, GHOST_TINT};

/// Everything an overlay pass may touch, borrowed from the grid.
pub(crate) struct Scene<'a, B: RenderBackend> {
    pub config: &'a GridConfig,
    pub ctx: TileContext<'a>,
    pub slots: &'a mut [Option<Tile>],
    pub ids: &'a mut HandleAllocator,
    pub backend: &'a mut B,
}

/// A ghost placeholder currently shown at an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ghost {
    pub handle: HandleId,
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// LIFO freelist of idle ghost handles with a retention ceiling.
#[derive(Debug, Clone)]
pub struct GhostPool {
    free: Vec<HandleId>,
    capacity: usize,
}

impl GhostPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
        }
    }

    /// Pop an idle handle, or allocate a fresh one. The flag is `true` when
    /// the handle is new and its backend object still has to be created.
    pub fn acquire(&mut self, ids: &mut HandleAllocator) -> (HandleId, bool) {
        match self.free.pop() {
            Some(handle) => (handle, false),
            None => (ids.sprite(), true),
        }
    }

    /// Return a handle. `false` means the pool is full and the caller must
    /// destroy the backend object.
    pub fn release(&mut self, handle: HandleId) -> bool {
        if self.free.len() < self.capacity {
            self.free.push(handle);
            true
        } else {
            false
        }
    }

    pub fn idle(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for GhostPool {
    fn default() -> Self {
        Self::new(GHOST_POOL_CAPACITY)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TacticalVisibilityEngine {
    z_tint: bool,
    xray: bool,
    pool: GhostPool,
    ghosts: Vec<Ghost>,
}

impl TacticalVisibilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_capacity(capacity: usize) -> Self {
        Self {
            pool: GhostPool::new(capacity),
            ..Self::default()
        }
    }

    pub fn z_tint_active(&self) -> bool {
        self.z_tint
    }

    pub fn xray_active(&self) -> bool {
        self.xray
    }

    /// Ghosts currently shown, in creation order.
    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn pool(&self) -> &GhostPool {
        &self.pool
    }

    pub(crate) fn set_z_tint<B: RenderBackend>(&mut self, on: bool, scene: &mut Scene<'_, B>) {
        if self.z_tint == on {
            return;
        }
        self.z_tint = on;
        debug!(on, "z-tint overlay");
        let mut batch = IntentBatch::new();
        for tile in scene.slots.iter_mut().flatten() {
            tile.set_z_tint(on, scene.ids, &mut batch);
            flush_batch(scene.backend, &mut batch, (tile.x(), tile.y(), tile.z()));
        }
    }

    pub(crate) fn set_xray<B: RenderBackend>(&mut self, on: bool, scene: &mut Scene<'_, B>) {
        if self.xray == on {
            return;
        }
        self.xray = on;
        if on {
            self.mark_tops(scene);
            self.spawn_ghosts(scene);
            self.apply_xray(true, scene);
        } else {
            self.release_ghosts(scene);
            self.apply_xray(false, scene);
        }
        debug!(on, ghosts = self.ghosts.len(), idle = self.pool.idle(), "x-ray overlay");
    }

    /// Reposition every shown ghost for the current view.
    pub(crate) fn rotate<B: RenderBackend>(&mut self, scene: &mut Scene<'_, B>) {
        let mut batch = IntentBatch::new();
        for ghost in &self.ghosts {
            place_ghost(*ghost, false, &scene.ctx, &mut batch);
            flush_batch(scene.backend, &mut batch, (ghost.x, ghost.y, ghost.z));
        }
    }

    /// Lift x-ray from one column ahead of a mutation there. The rest of the
    /// grid keeps its ghosts and opacity. No-op while x-ray is off.
    pub(crate) fn suspend_column<B: RenderBackend>(
        &mut self,
        x: u32,
        y: u32,
        scene: &mut Scene<'_, B>,
    ) {
        if !self.xray {
            return;
        }
        let (column, rest): (Vec<Ghost>, Vec<Ghost>) = self
            .ghosts
            .drain(..)
            .partition(|g| (g.x, g.y) == (x, y));
        self.ghosts = rest;
        let mut batch = IntentBatch::new();
        for ghost in column {
            self.release_ghost(ghost, scene, &mut batch);
        }
        let cfg = scene.config;
        for z in 0..cfg.levels() {
            if let Some(tile) = scene.slots[cfg.slot_index(x, y, z)].as_mut() {
                tile.set_xray(false, &mut batch);
                flush_batch(scene.backend, &mut batch, (x, y, z));
            }
        }
    }

    /// Reapply x-ray to one column after a mutation there.
    pub(crate) fn resume_column<B: RenderBackend>(
        &mut self,
        x: u32,
        y: u32,
        scene: &mut Scene<'_, B>,
    ) {
        if !self.xray {
            return;
        }
        mark_column_top(x, y, scene);
        let mut batch = IntentBatch::new();
        let cfg = scene.config;
        for z in 0..cfg.levels() {
            if scene.slots[cfg.slot_index(x, y, z)].is_none() {
                self.spawn_ghost((x, y, z), scene, &mut batch);
            }
        }
        for z in 0..cfg.levels() {
            if let Some(tile) = scene.slots[cfg.slot_index(x, y, z)].as_mut() {
                tile.set_xray(true, &mut batch);
                flush_batch(scene.backend, &mut batch, (x, y, z));
            }
        }
    }

    /// Exactly one top per non-empty column, none in empty columns.
    fn mark_tops<B: RenderBackend>(&self, scene: &mut Scene<'_, B>) {
        for y in 0..scene.config.row_count {
            for x in 0..scene.config.column_count {
                mark_column_top(x, y, scene);
            }
        }
    }

    fn spawn_ghosts<B: RenderBackend>(&mut self, scene: &mut Scene<'_, B>) {
        let mut batch = IntentBatch::new();
        for i in 0..scene.slots.len() {
            if scene.slots[i].is_none() {
                let cell = scene.config.slot_coords(i);
                self.spawn_ghost(cell, scene, &mut batch);
            }
        }
    }

    /// Show a ghost at an empty slot. A fresh handle whose creation the
    /// backend rejected is dropped rather than recorded or pooled.
    fn spawn_ghost<B: RenderBackend>(
        &mut self,
        (x, y, z): (u32, u32, u32),
        scene: &mut Scene<'_, B>,
        batch: &mut IntentBatch,
    ) {
        let (handle, fresh) = self.pool.acquire(scene.ids);
        let ghost = Ghost { handle, x, y, z };
        place_ghost(ghost, fresh, &scene.ctx, batch);
        if !flush_batch(scene.backend, batch, (x, y, z)) && fresh {
            // The create may have landed before a later intent failed.
            batch.push(RenderIntent::DestroySprite { handle });
            flush_batch(scene.backend, batch, (x, y, z));
            return;
        }
        self.ghosts.push(ghost);
    }

    fn release_ghosts<B: RenderBackend>(&mut self, scene: &mut Scene<'_, B>) {
        let mut batch = IntentBatch::new();
        for ghost in std::mem::take(&mut self.ghosts) {
            self.release_ghost(ghost, scene, &mut batch);
        }
    }

    /// Hide a pooled ghost, or destroy it when the pool is full.
    fn release_ghost<B: RenderBackend>(
        &mut self,
        ghost: Ghost,
        scene: &mut Scene<'_, B>,
        batch: &mut IntentBatch,
    ) {
        let handle = ghost.handle;
        if self.pool.release(handle) {
            batch.push(RenderIntent::SetVisible {
                handle,
                visible: false,
            });
        } else {
            batch.push(RenderIntent::DestroySprite { handle });
        }
        flush_batch(scene.backend, batch, (ghost.x, ghost.y, ghost.z));
    }

    fn apply_xray<B: RenderBackend>(&self, on: bool, scene: &mut Scene<'_, B>) {
        let mut batch = IntentBatch::new();
        for tile in scene.slots.iter_mut().flatten() {
            tile.set_xray(on, &mut batch);
            flush_batch(scene.backend, &mut batch, (tile.x(), tile.y(), tile.z()));
        }
    }
}

fn mark_column_top<B: RenderBackend>(x: u32, y: u32, scene: &mut Scene<'_, B>) {
    let cfg = scene.config;
    let top = (0..cfg.levels())
        .rev()
        .find(|&z| scene.slots[cfg.slot_index(x, y, z)].is_some());
    for z in 0..cfg.levels() {
        if let Some(tile) = scene.slots[cfg.slot_index(x, y, z)].as_mut() {
            tile.set_top(top == Some(z));
        }
    }
}

/// Position, depth, tint and frame a ghost the way a tile at its slot would
/// render. Emits 6 intents.
fn place_ghost(ghost: Ghost, fresh: bool, ctx: &TileContext<'_>, out: &mut IntentBatch) {
    let Ghost { handle, x, y, z } = ghost;
    let at = ctx.transformer.cell_to_screen(x, y, z, ctx.direction);
    if fresh {
        out.push(RenderIntent::CreateSprite {
            handle,
            texture: GHOST_TEXTURE_KEY.to_string(),
            at,
        });
    } else {
        out.push(RenderIntent::SetPosition { handle, at });
    }
    out.push(RenderIntent::SetDepth {
        handle,
        depth: ctx.transformer.depth(x, y, z, ctx.direction) + GHOST_DEPTH_BIAS,
    });
    out.push(RenderIntent::SetTint {
        handle,
        tint: GHOST_TINT,
    });
    out.push(RenderIntent::SetAlpha {
        handle,
        alpha: GHOST_ALPHA,
    });
    out.push(RenderIntent::SetFrame {
        handle,
        frame: ctx.direction.index(),
    });
    out.push(RenderIntent::SetVisible {
        handle,
        visible: true,
    });
}
