//! TermBackend: a [`RenderBackend`] that rasterizes intents into a terminal
//! framebuffer.
//!
//! Sprites are drawn as character diamonds approximating their top face.
//! Screen pixels map to terminal cells through a fixed scale (`px_per_col`,
//! `px_per_row`); 2:1 compensates for the usual glyph aspect ratio.
//!
//! This module is pure (no I/O). It can be unit-tested.

use std::collections::HashMap;

use tracing::trace;

use crate::core::{
    BackendError, GridConfig, HandleId, LabelId, RenderBackend, RenderIntent, ScreenPoint,
};
use crate::fb::{CellStyle, FrameBuffer, Rgb, BACKDROP};
use crate::types::GHOST_TEXTURE_KEY;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Sprite {
    texture: String,
    at: ScreenPoint,
    depth: f64,
    tint: Option<Rgb>,
    alpha: f32,
    visible: bool,
    frame: u8,
    animating: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Label {
    text: String,
    at: ScreenPoint,
    depth: f64,
    visible: bool,
}

/// Glyph and base color bound to a texture key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub color: Rgb,
}

const MISSING: Glyph = Glyph {
    ch: '?',
    color: Rgb::new(255, 0, 255),
};

const FRAME_ARROWS: [char; 4] = ['^', '>', 'v', '<'];

pub struct TermBackend {
    sprites: HashMap<HandleId, Sprite>,
    labels: HashMap<LabelId, Label>,
    glyphs: HashMap<String, Glyph>,
    half_w: f64,
    half_h: f64,
    px_per_col: f64,
    px_per_row: f64,
    /// Screen point drawn at terminal cell (0, 0).
    origin: ScreenPoint,
}

impl TermBackend {
    pub fn new(cfg: &GridConfig) -> Self {
        let mut backend = Self {
            sprites: HashMap::new(),
            labels: HashMap::new(),
            glyphs: HashMap::new(),
            half_w: f64::from(cfg.tile_width) / 2.0,
            half_h: f64::from(cfg.tile_height) / 4.0,
            px_per_col: f64::from(cfg.tile_width) / 8.0,
            px_per_row: f64::from(cfg.tile_height) / 8.0,
            origin: ScreenPoint::default(),
        };
        backend.bind_default_glyphs();
        backend
    }

    fn bind_default_glyphs(&mut self) {
        let palette = [
            ('#', Rgb::new(120, 170, 90)),
            ('%', Rgb::new(150, 120, 80)),
            ('=', Rgb::new(90, 140, 200)),
            ('&', Rgb::new(160, 160, 160)),
            ('*', Rgb::new(200, 180, 90)),
            ('+', Rgb::new(90, 190, 170)),
            ('o', Rgb::new(190, 110, 110)),
            ('x', Rgb::new(140, 110, 180)),
            ('/', Rgb::new(210, 200, 170)),
        ];
        for (i, (ch, color)) in palette.into_iter().enumerate() {
            self.bind_texture(format!("tile_{}", i + 1), Glyph { ch, color });
        }
        for (i, ch) in ['T', 'B', 'R', 'F'].into_iter().enumerate() {
            let color = Rgb::new(240, 230, 200);
            self.bind_texture(format!("object_{}", i + 1), Glyph { ch, color });
        }
        self.bind_texture(
            GHOST_TEXTURE_KEY,
            Glyph {
                ch: '.',
                color: Rgb::new(200, 200, 200),
            },
        );
    }

    pub fn bind_texture(&mut self, key: impl Into<String>, glyph: Glyph) {
        self.glyphs.insert(key.into(), glyph);
    }

    /// Pan: the screen point shown at the top-left terminal cell.
    pub fn set_origin(&mut self, origin: ScreenPoint) {
        self.origin = origin;
    }

    pub fn origin(&self) -> ScreenPoint {
        self.origin
    }

    /// Pan so that `p` lands in the middle of the viewport.
    pub fn center_on(&mut self, p: ScreenPoint, viewport: Viewport) {
        self.origin = ScreenPoint {
            x: p.x - f64::from(viewport.width) / 2.0 * self.px_per_col,
            y: p.y - f64::from(viewport.height) / 2.0 * self.px_per_row,
        };
    }

    /// Center of a terminal cell in screen space (for mouse picking).
    pub fn cell_to_screen(&self, col: u16, row: u16) -> ScreenPoint {
        ScreenPoint {
            x: self.origin.x + (f64::from(col) + 0.5) * self.px_per_col,
            y: self.origin.y + (f64::from(row) + 0.5) * self.px_per_row,
        }
    }

    fn screen_to_cell(&self, p: ScreenPoint) -> (f64, f64) {
        (
            (p.x - self.origin.x) / self.px_per_col,
            (p.y - self.origin.y) / self.px_per_row,
        )
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    fn sprite_mut(&mut self, h: HandleId, intent: &RenderIntent) -> Result<&mut Sprite, BackendError> {
        self.sprites
            .get_mut(&h)
            .ok_or_else(|| BackendError::new(intent, format!("no sprite {}", h.0)))
    }

    fn label_mut(&mut self, l: LabelId, intent: &RenderIntent) -> Result<&mut Label, BackendError> {
        self.labels
            .get_mut(&l)
            .ok_or_else(|| BackendError::new(intent, format!("no label {}", l.0)))
    }

    /// Rasterize every visible sprite and label into `fb`.
    pub fn compose(&self, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        let hw = self.half_w / self.px_per_col;
        let hh = self.half_h / self.px_per_row;
        for sprite in self.sprites.values().filter(|s| s.visible) {
            let glyph = self.glyphs.get(&sprite.texture).copied().unwrap_or(MISSING);
            let style = sprite_style(glyph.color, sprite.tint, sprite.alpha);
            let is_tile = sprite.texture.starts_with("tile_") && sprite.texture != GHOST_TEXTURE_KEY;
            let (cx, cy) = self.screen_to_cell(sprite.at);

            let (x0, x1) = ((cx - hw).floor() as i32, (cx + hw).ceil() as i32);
            let (y0, y1) = ((cy - hh).floor() as i32, (cy + hh).ceil() as i32);
            for row in y0..=y1 {
                for col in x0..=x1 {
                    let dx = ((f64::from(col) + 0.5) - cx).abs() / hw;
                    let dy = ((f64::from(row) + 0.5) - cy).abs() / hh;
                    if dx + dy >= 1.0 {
                        continue;
                    }
                    let center = col == cx.floor() as i32 && row == cy.floor() as i32;
                    let ch = if center && is_tile && !sprite.animating {
                        FRAME_ARROWS[(sprite.frame % 4) as usize]
                    } else {
                        glyph.ch
                    };
                    fb.plot(col, row, ch, style, sprite.depth);
                }
            }
        }

        for label in self.labels.values().filter(|l| l.visible) {
            let (cx, cy) = self.screen_to_cell(label.at);
            let width = label.text.chars().count() as f64;
            let style = CellStyle {
                fg: Rgb::new(255, 255, 255),
                bg: Rgb::new(0, 0, 0),
                bold: true,
                dim: false,
            };
            fb.put_str(
                (cx - width / 2.0).round() as i32,
                cy.floor() as i32,
                &label.text,
                style,
                label.depth,
            );
        }
    }
}

fn blend(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f32::from(x) * (1.0 - t) + f32::from(y) * t).round() as u8;
    Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

fn sprite_style(base: Rgb, tint: Option<Rgb>, alpha: f32) -> CellStyle {
    let tinted = match tint {
        Some(t) => Rgb::new(
            (u16::from(base.r) * u16::from(t.r) / 255) as u8,
            (u16::from(base.g) * u16::from(t.g) / 255) as u8,
            (u16::from(base.b) * u16::from(t.b) / 255) as u8,
        ),
        None => base,
    };
    let bg = blend(BACKDROP, tinted, alpha);
    CellStyle {
        fg: blend(bg, Rgb::new(255, 255, 255), 0.6),
        bg,
        bold: false,
        dim: alpha < 0.5,
    }
}

impl RenderBackend for TermBackend {
    fn apply(&mut self, intent: &RenderIntent) -> Result<(), BackendError> {
        trace!(intent = intent.name(), "term backend");
        match intent {
            RenderIntent::CreateSprite {
                handle,
                texture,
                at,
            } => {
                self.sprites.insert(
                    *handle,
                    Sprite {
                        texture: texture.clone(),
                        at: *at,
                        depth: 0.0,
                        tint: None,
                        alpha: 1.0,
                        visible: true,
                        frame: 0,
                        animating: false,
                    },
                );
            }
            RenderIntent::SetTexture { handle, texture } => {
                self.sprite_mut(*handle, intent)?.texture = texture.clone();
            }
            RenderIntent::SetPosition { handle, at } => self.sprite_mut(*handle, intent)?.at = *at,
            RenderIntent::SetDepth { handle, depth } => {
                self.sprite_mut(*handle, intent)?.depth = *depth;
            }
            RenderIntent::SetTint { handle, tint } => {
                self.sprite_mut(*handle, intent)?.tint = Some(*tint);
            }
            RenderIntent::ClearTint { handle } => self.sprite_mut(*handle, intent)?.tint = None,
            RenderIntent::SetAlpha { handle, alpha } => {
                self.sprite_mut(*handle, intent)?.alpha = *alpha;
            }
            RenderIntent::SetVisible { handle, visible } => {
                self.sprite_mut(*handle, intent)?.visible = *visible;
            }
            RenderIntent::SetFrame { handle, frame } => {
                self.sprite_mut(*handle, intent)?.frame = *frame;
            }
            RenderIntent::PlayAnimation { handle, .. } => {
                self.sprite_mut(*handle, intent)?.animating = true;
            }
            RenderIntent::StopAnimation { handle } => {
                self.sprite_mut(*handle, intent)?.animating = false;
            }
            RenderIntent::DestroySprite { handle } => {
                self.sprites.remove(handle);
            }
            RenderIntent::CreateLabel { label, text, at } => {
                self.labels.insert(
                    *label,
                    Label {
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

    fn contains_point(&self, handle: HandleId, x: f64, y: f64) -> bool {
        self.sprites.get(&handle).is_some_and(|s| {
            (x - s.at.x).abs() / self.half_w + (y - s.at.y).abs() / self.half_h < 1.0
        })
    }

    fn has_texture(&self, key: &str) -> bool {
        self.glyphs.contains_key(key)
    }
}
