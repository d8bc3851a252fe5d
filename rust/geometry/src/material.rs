// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface materials attached to rig meshes

/// Minimal material state the preview cares about: a base colour and an
/// upload flag for the rendering backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Packed `0xRRGGBB`
    pub color: u32,
    /// Set when the backend must re-upload this material
    pub needs_update: bool,
    /// Bumped on every change, lets a backend detect stale uploads
    pub version: u64,
    disposed: bool,
}

impl Material {
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Self {
            name: name.into(),
            color: color & 0xFF_FFFF,
            needs_update: false,
            version: 0,
            disposed: false,
        }
    }

    /// Set the colour and flag the material for re-upload.
    pub fn set_color(&mut self, color: u32) {
        self.color = color & 0xFF_FFFF;
        self.needs_update = true;
        self.version += 1;
    }

    /// Clear and return the upload flag.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", 0xFF_FFFF)
    }
}

/// A mesh carries either one material or one per primitive group.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSlot {
    Single(Material),
    Multi(Vec<Material>),
}

impl MaterialSlot {
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        match self {
            MaterialSlot::Single(material) => std::slice::from_ref(material).iter(),
            MaterialSlot::Multi(materials) => materials.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Material> {
        match self {
            MaterialSlot::Single(material) => std::slice::from_mut(material).iter_mut(),
            MaterialSlot::Multi(materials) => materials.iter_mut(),
        }
    }

    /// Apply a colour uniformly, returning how many materials changed.
    pub fn set_color(&mut self, color: u32) -> usize {
        let mut changed = 0;
        for material in self.iter_mut() {
            material.set_color(color);
            changed += 1;
        }
        changed
    }
}

impl Default for MaterialSlot {
    fn default() -> Self {
        MaterialSlot::Single(Material::default())
    }
}
