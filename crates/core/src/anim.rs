//! Animation registry: animated texture keys and per-object vertical offsets.

use std::collections::{HashMap, HashSet};

use crate::types::ObjectKind;

#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    animated: HashSet<String>,
    object_offsets: HashMap<ObjectKind, f64>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a texture key as having a looping multi-frame animation.
    pub fn register_animation(&mut self, key: impl Into<String>) {
        self.animated.insert(key.into());
    }

    pub fn is_animated(&self, key: &str) -> bool {
        self.animated.contains(key)
    }

    /// Screen pixels an object of `kind` is raised above its tile's anchor.
    pub fn set_object_offset(&mut self, kind: ObjectKind, offset: f64) {
        self.object_offsets.insert(kind, offset);
    }

    pub fn object_offset(&self, kind: ObjectKind) -> f64 {
        self.object_offsets.get(&kind).copied().unwrap_or(0.0)
    }
}
