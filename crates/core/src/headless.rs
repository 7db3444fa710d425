//! HeadlessBackend: an in-memory [`RenderBackend`] for tests and tooling.
//!
//! It keeps the latest state of every sprite and label, counts what was
//! created and destroyed, and answers containment queries against the top
//! face diamond of each sprite. Nothing is drawn.

use std::collections::{HashMap, HashSet};

use crate::config::GridConfig;
use crate::coords::ScreenPoint;
use crate::render::{BackendError, HandleId, LabelId, RenderBackend, RenderIntent};
use crate::types::Rgb;

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteState {
    pub texture: String,
    pub at: ScreenPoint,
    pub depth: f64,
    pub tint: Option<Rgb>,
    pub alpha: f32,
    pub visible: bool,
    pub frame: u8,
    pub animation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelState {
    pub text: String,
    pub at: ScreenPoint,
    pub depth: f64,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    sprites: HashMap<HandleId, SpriteState>,
    labels: HashMap<LabelId, LabelState>,
    /// Half extents of the top-face diamond.
    half_w: f64,
    half_h: f64,
    /// `None` means every texture key exists.
    textures: Option<HashSet<String>>,
    failing: HashSet<HandleId>,
    sprites_created: usize,
    sprites_destroyed: usize,
    applied: usize,
    rejected: usize,
}

impl HeadlessBackend {
    pub fn new(cfg: &GridConfig) -> Self {
        Self {
            sprites: HashMap::new(),
            labels: HashMap::new(),
            half_w: f64::from(cfg.tile_width) / 2.0,
            half_h: f64::from(cfg.tile_height) / 4.0,
            textures: None,
            failing: HashSet::new(),
            sprites_created: 0,
            sprites_destroyed: 0,
            applied: 0,
            rejected: 0,
        }
    }

    /// Restrict the known texture keys.
    pub fn with_textures<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.textures = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Make every intent targeting `handle` fail.
    pub fn fail_on(&mut self, handle: HandleId) {
        self.failing.insert(handle);
    }

    pub fn sprite(&self, handle: HandleId) -> Option<&SpriteState> {
        self.sprites.get(&handle)
    }

    pub fn label(&self, label: LabelId) -> Option<&LabelState> {
        self.labels.get(&label)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn visible_sprite_count(&self) -> usize {
        self.sprites.values().filter(|s| s.visible).count()
    }

    pub fn sprites_created(&self) -> usize {
        self.sprites_created
    }

    pub fn sprites_destroyed(&self) -> usize {
        self.sprites_destroyed
    }

    /// Intents applied successfully.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Intents refused (injected failures or unknown handles).
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    fn sprite_mut(
        &mut self,
        handle: HandleId,
        intent: &RenderIntent,
    ) -> Result<&mut SpriteState, BackendError> {
        self.sprites
            .get_mut(&handle)
            .ok_or_else(|| BackendError::new(intent, format!("unknown sprite {}", handle.0)))
    }

    fn label_mut(
        &mut self,
        label: LabelId,
        intent: &RenderIntent,
    ) -> Result<&mut LabelState, BackendError> {
        self.labels
            .get_mut(&label)
            .ok_or_else(|| BackendError::new(intent, format!("unknown label {}", label.0)))
    }

    fn apply_inner(&mut self, intent: &RenderIntent) -> Result<(), BackendError> {
        if let Some(handle) = intent.handle() {
            if self.failing.contains(&handle) {
                return Err(BackendError::new(intent, "injected failure"));
            }
        }
        match intent {
            RenderIntent::CreateSprite {
                handle,
                texture,
                at,
            } => {
                self.sprites.insert(
                    *handle,
                    SpriteState {
                        texture: texture.clone(),
                        at: *at,
                        depth: 0.0,
                        tint: None,
                        alpha: 1.0,
                        visible: true,
                        frame: 0,
                        animation: None,
                    },
                );
                self.sprites_created += 1;
            }
            RenderIntent::SetTexture { handle, texture } => {
                self.sprite_mut(*handle, intent)?.texture = texture.clone();
            }
            RenderIntent::SetPosition { handle, at } => {
                self.sprite_mut(*handle, intent)?.at = *at;
            }
            RenderIntent::SetDepth { handle, depth } => {
                self.sprite_mut(*handle, intent)?.depth = *depth;
            }
            RenderIntent::SetTint { handle, tint } => {
                self.sprite_mut(*handle, intent)?.tint = Some(*tint);
            }
            RenderIntent::ClearTint { handle } => {
                self.sprite_mut(*handle, intent)?.tint = None;
            }
            RenderIntent::SetAlpha { handle, alpha } => {
                self.sprite_mut(*handle, intent)?.alpha = *alpha;
            }
            RenderIntent::SetVisible { handle, visible } => {
                self.sprite_mut(*handle, intent)?.visible = *visible;
            }
            RenderIntent::SetFrame { handle, frame } => {
                self.sprite_mut(*handle, intent)?.frame = *frame;
            }
            RenderIntent::PlayAnimation { handle, key } => {
                self.sprite_mut(*handle, intent)?.animation = Some(key.clone());
            }
            RenderIntent::StopAnimation { handle } => {
                self.sprite_mut(*handle, intent)?.animation = None;
            }
            RenderIntent::DestroySprite { handle } => {
                if self.sprites.remove(handle).is_none() {
                    return Err(BackendError::new(intent, "sprite already gone"));
                }
                self.sprites_destroyed += 1;
            }
            RenderIntent::CreateLabel { label, text, at } => {
                self.labels.insert(
                    *label,
                    LabelState {
                        text: text.clone(),
                        at: *at,
                        depth: 0.0,
                        visible: true,
                    },
                );
            }
            RenderIntent::SetLabelText { label, text } => {
                self.label_mut(*label, intent)?.text = text.clone();
            }
            RenderIntent::SetLabelPosition { label, at } => {
                self.label_mut(*label, intent)?.at = *at;
            }
            RenderIntent::SetLabelDepth { label, depth } => {
                self.label_mut(*label, intent)?.depth = *depth;
            }
            RenderIntent::SetLabelVisible { label, visible } => {
                self.label_mut(*label, intent)?.visible = *visible;
            }
            RenderIntent::DestroyLabel { label } => {
                self.labels.remove(label);
            }
        }
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn apply(&mut self, intent: &RenderIntent) -> Result<(), BackendError> {
        let result = self.apply_inner(intent);
        match result {
            Ok(()) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
        result
    }

    fn contains_point(&self, handle: HandleId, x: f64, y: f64) -> bool {
        let Some(s) = self.sprites.get(&handle) else {
            return false;
        };
        let dx = (x - s.at.x).abs() / self.half_w;
        let dy = (y - s.at.y).abs() / self.half_h;
        dx + dy < 1.0
    }

    fn has_texture(&self, key: &str) -> bool {
        self.textures.as_ref().map_or(true, |t| t.contains(key))
    }
}
