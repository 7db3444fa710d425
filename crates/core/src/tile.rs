//! Tile - one occupied slot of a column
//!
//! A tile is identified by `(x, y, z)`, all fixed for its lifetime. Raising or
//! lowering a cell destroys the tile and spawns a new one at the new level.
//!
//! Tiles are pure: every visual effect is pushed as a [`RenderIntent`] into an
//! [`IntentBatch`] supplied by the caller. Shared read-only services
//! (transformer, animation registry, current view) arrive per call through a
//! [`TileContext`].
//!
//! # Frame selection
//!
//! | Tile | Frame |
//! |------|-------|
//! | stair with facing | `(facing - view + 4) % 4` |
//! | other with facing | `(facing + view) % 4` |
//! | no facing | `view` |
//!
//! Animated textures never receive frame writes; the animation owns them.

use crate::anim::AnimationRegistry;
use crate::coords::{CoordinateTransformer, ScreenPoint};
use crate::render::{HandleAllocator, HandleId, IntentBatch, LabelId, RenderIntent};
use crate::types::{
    Direction, Facing, ObjectKind, Rgb, TileKind, HIGHLIGHT_LIGHTEN_PERCENT, HIGHLIGHT_TINT,
    LABEL_DEPTH_BIAS, LABEL_OFFSET_Y, OBJECT_DEPTH_BIAS, XRAY_ALPHA_CAP, XRAY_ALPHA_STEP,
    XRAY_BASE_ALPHA, Z_TINT_PALETTE,
};

/// Borrowed grid services handed to tiles for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct TileContext<'a> {
    pub transformer: &'a CoordinateTransformer,
    pub registry: &'a AnimationRegistry,
    pub direction: Direction,
}

impl<'a> TileContext<'a> {
    pub fn new(
        transformer: &'a CoordinateTransformer,
        registry: &'a AnimationRegistry,
        direction: Direction,
    ) -> Self {
        Self {
            transformer,
            registry,
            direction,
        }
    }
}

/// What occupies a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub kind: TileKind,
    pub facing: Option<Facing>,
    pub object: Option<ObjectKind>,
}

impl Occupant {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            facing: None,
            object: None,
        }
    }
}

/// Frame index for a tile under the given view.
pub fn resolve_frame(kind: TileKind, facing: Option<Facing>, view: Direction) -> u8 {
    let v = view.index();
    match facing {
        Some(f) if kind.is_stair() => (f.index() + 4 - v) % 4,
        Some(f) => (f.index() + v) % 4,
        None => v,
    }
}

/// X-ray opacity: opaque on top, otherwise graded by height and capped.
pub fn xray_alpha(z: u32, is_top: bool) -> f32 {
    if is_top {
        1.0
    } else {
        (XRAY_BASE_ALPHA + XRAY_ALPHA_STEP * z as f32).min(XRAY_ALPHA_CAP)
    }
}

/// Z-tint color for a level.
pub fn z_tint_for(z: u32) -> Rgb {
    let idx = (z as usize).min(Z_TINT_PALETTE.len() - 1);
    Z_TINT_PALETTE[idx]
}

#[derive(Debug, Clone, PartialEq)]
struct AttachedObject {
    kind: ObjectKind,
    handle: HandleId,
    animated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    x: u32,
    y: u32,
    z: u32,
    kind: TileKind,
    facing: Option<Facing>,
    handle: HandleId,
    animated: bool,
    object: Option<AttachedObject>,
    is_top: bool,
    at: ScreenPoint,
    depth: f64,

    // Overlay state.
    visible: bool,
    alpha: f32,
    highlighted: bool,
    z_tint: Option<Rgb>,
    label: Option<LabelId>,
    label_visible: bool,
    /// Visibility and opacity saved while x-ray is applied.
    xray_saved: Option<(bool, f32)>,
}

impl Tile {
    /// Create a tile and emit its initial sprite(s).
    ///
    /// Emits at most 6 intents.
    pub fn spawn(
        x: u32,
        y: u32,
        z: u32,
        occupant: Occupant,
        ctx: &TileContext<'_>,
        ids: &mut HandleAllocator,
        out: &mut IntentBatch,
    ) -> Self {
        let texture = occupant.kind.texture_key();
        let animated = ctx.registry.is_animated(&texture);
        let at = ctx.transformer.cell_to_screen(x, y, z, ctx.direction);
        let depth = ctx.transformer.depth(x, y, z, ctx.direction);
        let handle = ids.sprite();

        let mut tile = Self {
            x,
            y,
            z,
            kind: occupant.kind,
            facing: occupant.facing,
            handle,
            animated,
            object: None,
            is_top: false,
            at,
            depth,
            visible: true,
            alpha: 1.0,
            highlighted: false,
            z_tint: None,
            label: None,
            label_visible: false,
            xray_saved: None,
        };

        out.push(RenderIntent::CreateSprite {
            handle,
            texture: texture.clone(),
            at,
        });
        out.push(RenderIntent::SetDepth { handle, depth });
        if animated {
            out.push(RenderIntent::PlayAnimation {
                handle,
                key: texture,
            });
        } else {
            out.push(RenderIntent::SetFrame {
                handle,
                frame: tile.frame(ctx.direction),
            });
        }

        if let Some(kind) = occupant.object {
            tile.attach_object(kind, ctx, ids, out);
        }
        tile
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn facing(&self) -> Option<Facing> {
        self.facing
    }

    pub fn object_kind(&self) -> Option<ObjectKind> {
        self.object.as_ref().map(|o| o.kind)
    }

    pub fn object_handle(&self) -> Option<HandleId> {
        self.object.as_ref().map(|o| o.handle)
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn label(&self) -> Option<LabelId> {
        self.label
    }

    pub fn is_top_of_column(&self) -> bool {
        self.is_top
    }

    pub fn screen_position(&self) -> ScreenPoint {
        self.at
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn z_tint(&self) -> Option<Rgb> {
        self.z_tint
    }

    pub fn is_label_visible(&self) -> bool {
        self.label.is_some() && self.label_visible
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    pub fn occupant(&self) -> Occupant {
        Occupant {
            kind: self.kind,
            facing: self.facing,
            object: self.object_kind(),
        }
    }

    /// Frame this tile shows under `view`.
    pub fn frame(&self, view: Direction) -> u8 {
        resolve_frame(self.kind, self.facing, view)
    }

    /// Tint currently shown, combining highlight and z-tint.
    pub fn effective_tint(&self) -> Option<Rgb> {
        match (self.highlighted, self.z_tint) {
            (true, Some(t)) => Some(t.lighten(HIGHLIGHT_LIGHTEN_PERCENT)),
            (true, None) => Some(HIGHLIGHT_TINT),
            (false, t) => t,
        }
    }

    fn push_tint(&self, out: &mut IntentBatch) {
        let handle = self.handle;
        match self.effective_tint() {
            Some(tint) => out.push(RenderIntent::SetTint { handle, tint }),
            None => out.push(RenderIntent::ClearTint { handle }),
        }
    }

    fn object_position(&self, kind: ObjectKind, ctx: &TileContext<'_>) -> ScreenPoint {
        ScreenPoint {
            x: self.at.x,
            y: self.at.y - ctx.registry.object_offset(kind),
        }
    }

    fn label_position(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.at.x,
            y: self.at.y - LABEL_OFFSET_Y,
        }
    }

    /// Emits 3 intents.
    fn attach_object(
        &mut self,
        kind: ObjectKind,
        ctx: &TileContext<'_>,
        ids: &mut HandleAllocator,
        out: &mut IntentBatch,
    ) {
        let texture = kind.texture_key();
        let animated = ctx.registry.is_animated(&texture);
        let handle = ids.sprite();
        out.push(RenderIntent::CreateSprite {
            handle,
            texture: texture.clone(),
            at: self.object_position(kind, ctx),
        });
        out.push(RenderIntent::SetDepth {
            handle,
            depth: self.depth + OBJECT_DEPTH_BIAS,
        });
        if animated {
            out.push(RenderIntent::PlayAnimation {
                handle,
                key: texture,
            });
        } else {
            out.push(RenderIntent::SetFrame {
                handle,
                frame: ctx.direction.index(),
            });
        }
        self.object = Some(AttachedObject {
            kind,
            handle,
            animated,
        });
    }

    /// Replace kind, facing and attached object in place (z is unchanged).
    ///
    /// Emits at most 7 intents.
    pub fn update(
        &mut self,
        occupant: Occupant,
        ctx: &TileContext<'_>,
        ids: &mut HandleAllocator,
        out: &mut IntentBatch,
    ) {
        let handle = self.handle;
        if occupant.kind != self.kind {
            let texture = occupant.kind.texture_key();
            let animated = ctx.registry.is_animated(&texture);
            if self.animated && !animated {
                out.push(RenderIntent::StopAnimation { handle });
            }
            out.push(RenderIntent::SetTexture {
                handle,
                texture: texture.clone(),
            });
            if animated {
                out.push(RenderIntent::PlayAnimation {
                    handle,
                    key: texture,
                });
            }
            self.kind = occupant.kind;
            self.animated = animated;
        }
        self.facing = occupant.facing;
        if !self.animated {
            out.push(RenderIntent::SetFrame {
                handle,
                frame: self.frame(ctx.direction),
            });
        }

        if self.object_kind() != occupant.object {
            if let Some(old) = self.object.take() {
                out.push(RenderIntent::DestroySprite { handle: old.handle });
            }
            if let Some(kind) = occupant.object {
                self.attach_object(kind, ctx, ids, out);
                self.sync_object_visibility(out);
            }
        }
    }

    /// Recompute position, depth and frame after a view change.
    ///
    /// Emits at most 8 intents.
    pub fn refresh(&mut self, ctx: &TileContext<'_>, out: &mut IntentBatch) {
        let handle = self.handle;
        self.at = ctx
            .transformer
            .cell_to_screen(self.x, self.y, self.z, ctx.direction);
        self.depth = ctx.transformer.depth(self.x, self.y, self.z, ctx.direction);
        out.push(RenderIntent::SetPosition {
            handle,
            at: self.at,
        });
        out.push(RenderIntent::SetDepth {
            handle,
            depth: self.depth,
        });
        if !self.animated {
            out.push(RenderIntent::SetFrame {
                handle,
                frame: self.frame(ctx.direction),
            });
        }

        if let Some(obj) = &self.object {
            out.push(RenderIntent::SetPosition {
                handle: obj.handle,
                at: self.object_position(obj.kind, ctx),
            });
            out.push(RenderIntent::SetDepth {
                handle: obj.handle,
                depth: self.depth + OBJECT_DEPTH_BIAS,
            });
            if !obj.animated {
                out.push(RenderIntent::SetFrame {
                    handle: obj.handle,
                    frame: ctx.direction.index(),
                });
            }
        }

        if let Some(label) = self.label {
            out.push(RenderIntent::SetLabelPosition {
                label,
                at: self.label_position(),
            });
            out.push(RenderIntent::SetLabelDepth {
                label,
                depth: self.depth + LABEL_DEPTH_BIAS,
            });
        }
    }

    /// Hover/selection highlight. Emits at most 1 intent.
    pub fn set_highlight(&mut self, on: bool, out: &mut IntentBatch) {
        if self.highlighted == on {
            return;
        }
        self.highlighted = on;
        self.push_tint(out);
    }

    /// Z-tint overlay toggle. Emits at most 4 intents.
    pub fn set_z_tint(&mut self, on: bool, ids: &mut HandleAllocator, out: &mut IntentBatch) {
        if self.z_tint.is_some() == on {
            return;
        }
        if on {
            self.z_tint = Some(z_tint_for(self.z));
            self.push_tint(out);
            let at = self.label_position();
            let depth = self.depth + LABEL_DEPTH_BIAS;
            match self.label {
                Some(label) => {
                    out.push(RenderIntent::SetLabelPosition { label, at });
                    out.push(RenderIntent::SetLabelDepth { label, depth });
                    out.push(RenderIntent::SetLabelVisible {
                        label,
                        visible: true,
                    });
                }
                None => {
                    let label = ids.label();
                    out.push(RenderIntent::CreateLabel {
                        label,
                        text: format!("z{}", self.z),
                        at,
                    });
                    out.push(RenderIntent::SetLabelDepth { label, depth });
                    self.label = Some(label);
                }
            }
            self.label_visible = true;
        } else {
            self.z_tint = None;
            self.push_tint(out);
            if let Some(label) = self.label {
                out.push(RenderIntent::SetLabelVisible {
                    label,
                    visible: false,
                });
            }
            self.label_visible = false;
        }
    }

    pub(crate) fn set_top(&mut self, is_top: bool) {
        self.is_top = is_top;
    }

    /// Normal (non x-ray) visibility from stacking. Emits at most 2 intents.
    pub(crate) fn set_stack_visible(&mut self, visible: bool, out: &mut IntentBatch) {
        if let Some(saved) = self.xray_saved.as_mut() {
            // Takes effect when x-ray is lifted.
            saved.0 = visible;
            return;
        }
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        out.push(RenderIntent::SetVisible {
            handle: self.handle,
            visible,
        });
        self.sync_object_visibility(out);
    }

    fn sync_object_visibility(&self, out: &mut IntentBatch) {
        if let Some(obj) = &self.object {
            out.push(RenderIntent::SetVisible {
                handle: obj.handle,
                visible: self.visible,
            });
        }
    }

    /// X-ray overlay toggle. Emits at most 4 intents.
    pub fn set_xray(&mut self, on: bool, out: &mut IntentBatch) {
        let handle = self.handle;
        if on {
            if self.xray_saved.is_none() {
                self.xray_saved = Some((self.visible, self.alpha));
            }
            self.visible = true;
            self.alpha = xray_alpha(self.z, self.is_top);
        } else {
            let Some((visible, alpha)) = self.xray_saved.take() else {
                return;
            };
            self.visible = visible;
            self.alpha = alpha;
        }
        out.push(RenderIntent::SetVisible {
            handle,
            visible: self.visible,
        });
        out.push(RenderIntent::SetAlpha {
            handle,
            alpha: self.alpha,
        });
        if let Some(obj) = &self.object {
            out.push(RenderIntent::SetVisible {
                handle: obj.handle,
                visible: self.visible,
            });
            out.push(RenderIntent::SetAlpha {
                handle: obj.handle,
                alpha: self.alpha,
            });
        }
    }

    /// Whether x-ray state is currently applied to this tile.
    pub fn is_xrayed(&self) -> bool {
        self.xray_saved.is_some()
    }

    /// Emit teardown of every backend object this tile owns. Emits at most 3 intents.
    pub fn destroy(self, out: &mut IntentBatch) {
        out.push(RenderIntent::DestroySprite {
            handle: self.handle,
        });
        if let Some(obj) = self.object {
            out.push(RenderIntent::DestroySprite { handle: obj.handle });
        }
        if let Some(label) = self.label {
            out.push(RenderIntent::DestroyLabel { label });
        }
    }
}
