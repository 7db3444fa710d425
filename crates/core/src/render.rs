//! Render intents - the only channel from the domain layer to a renderer
//!
//! Tiles and the tactical engine never touch a renderer. They push
//! [`RenderIntent`] records into a bounded [`IntentBatch`]; the grid then
//! hands each batch to a [`RenderBackend`], one cell at a time, so a backend
//! failure on one cell cannot abort work on the others.

use arrayvec::ArrayVec;
use derive_more::{Display, Error};
use tracing::warn;

use crate::coords::ScreenPoint;
use crate::types::Rgb;

/// Identifier of a sprite-like visual handle owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u32);

/// Identifier of a text label owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u32);

/// Monotonic id source. Ids are never reused, even after destroy.
#[derive(Debug, Clone, Default)]
pub struct HandleAllocator {
    next_sprite: u32,
    next_label: u32,
}

impl HandleAllocator {
    pub fn sprite(&mut self) -> HandleId {
        let id = HandleId(self.next_sprite);
        self.next_sprite += 1;
        id
    }

    pub fn label(&mut self) -> LabelId {
        let id = LabelId(self.next_label);
        self.next_label += 1;
        id
    }

    /// Number of sprite handles handed out so far.
    pub fn sprites_allocated(&self) -> u32 {
        self.next_sprite
    }
}

/// A single drawing directive.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderIntent {
    CreateSprite {
        handle: HandleId,
        texture: String,
        at: ScreenPoint,
    },
    SetTexture {
        handle: HandleId,
        texture: String,
    },
    SetPosition {
        handle: HandleId,
        at: ScreenPoint,
    },
    SetDepth {
        handle: HandleId,
        depth: f64,
    },
    SetTint {
        handle: HandleId,
        tint: Rgb,
    },
    ClearTint {
        handle: HandleId,
    },
    SetAlpha {
        handle: HandleId,
        alpha: f32,
    },
    SetVisible {
        handle: HandleId,
        visible: bool,
    },
    SetFrame {
        handle: HandleId,
        frame: u8,
    },
    PlayAnimation {
        handle: HandleId,
        key: String,
    },
    StopAnimation {
        handle: HandleId,
    },
    DestroySprite {
        handle: HandleId,
    },
    CreateLabel {
        label: LabelId,
        text: String,
        at: ScreenPoint,
    },
    SetLabelText {
        label: LabelId,
        text: String,
    },
    SetLabelPosition {
        label: LabelId,
        at: ScreenPoint,
    },
    SetLabelDepth {
        label: LabelId,
        depth: f64,
    },
    SetLabelVisible {
        label: LabelId,
        visible: bool,
    },
    DestroyLabel {
        label: LabelId,
    },
}

impl RenderIntent {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RenderIntent::CreateSprite { .. } => "create_sprite",
            RenderIntent::SetTexture { .. } => "set_texture",
            RenderIntent::SetPosition { .. } => "set_position",
            RenderIntent::SetDepth { .. } => "set_depth",
            RenderIntent::SetTint { .. } => "set_tint",
            RenderIntent::ClearTint { .. } => "clear_tint",
            RenderIntent::SetAlpha { .. } => "set_alpha",
            RenderIntent::SetVisible { .. } => "set_visible",
            RenderIntent::SetFrame { .. } => "set_frame",
            RenderIntent::PlayAnimation { .. } => "play_animation",
            RenderIntent::StopAnimation { .. } => "stop_animation",
            RenderIntent::DestroySprite { .. } => "destroy_sprite",
            RenderIntent::CreateLabel { .. } => "create_label",
            RenderIntent::SetLabelText { .. } => "set_label_text",
            RenderIntent::SetLabelPosition { .. } => "set_label_position",
            RenderIntent::SetLabelDepth { .. } => "set_label_depth",
            RenderIntent::SetLabelVisible { .. } => "set_label_visible",
            RenderIntent::DestroyLabel { .. } => "destroy_label",
        }
    }

    /// Sprite handle targeted by this intent, if any.
    pub fn handle(&self) -> Option<HandleId> {
        match *self {
            RenderIntent::CreateSprite { handle, .. }
            | RenderIntent::SetTexture { handle, .. }
            | RenderIntent::SetPosition { handle, .. }
            | RenderIntent::SetDepth { handle, .. }
            | RenderIntent::SetTint { handle, .. }
            | RenderIntent::ClearTint { handle }
            | RenderIntent::SetAlpha { handle, .. }
            | RenderIntent::SetVisible { handle, .. }
            | RenderIntent::SetFrame { handle, .. }
            | RenderIntent::PlayAnimation { handle, .. }
            | RenderIntent::StopAnimation { handle }
            | RenderIntent::DestroySprite { handle } => Some(handle),
            _ => None,
        }
    }
}

/// Upper bound of intents any single tile/ghost operation produces.
pub const INTENT_BATCH_CAPACITY: usize = 16;

/// Fixed-capacity intent buffer for one cell operation.
pub type IntentBatch = ArrayVec<RenderIntent, INTENT_BATCH_CAPACITY>;

/// Failure reported by a backend while applying an intent.
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("{intent} failed: {message}")]
pub struct BackendError {
    pub intent: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(intent: &RenderIntent, message: impl Into<String>) -> Self {
        Self {
            intent: intent.name(),
            message: message.into(),
        }
    }
}

/// Capabilities the core consumes from a renderer.
pub trait RenderBackend {
    /// Apply one directive.
    fn apply(&mut self, intent: &RenderIntent) -> Result<(), BackendError>;

    /// Whether the screen point lies inside the handle's visual bounds.
    fn contains_point(&self, handle: HandleId, x: f64, y: f64) -> bool;

    /// Whether a texture key is bound to an asset.
    fn has_texture(&self, key: &str) -> bool;
}

/// Drain `batch` into `backend`.
///
/// Stops at the first failure for this cell and logs it; never propagates.
/// Returns whether the whole batch was applied.
pub(crate) fn flush_batch<B: RenderBackend + ?Sized>(
    backend: &mut B,
    batch: &mut IntentBatch,
    cell: (u32, u32, u32),
) -> bool {
    let mut ok = true;
    for intent in batch.iter() {
        if let Err(e) = backend.apply(intent) {
            let (x, y, z) = cell;
            warn!(x, y, z, error = %e, "render backend rejected cell update");
            ok = false;
            break;
        }
    }
    batch.clear();
    ok
}
