// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Morph channels and shape-key application
//!
//! A morph channel stores one displacement per vertex. The renderer blends
//! `base + Σ displacement × influence`; only the influence array is written
//! here, base geometry is never touched.

use crate::error::{Error, Result};
use crate::rig::MeshTarget;
use mannequin_core::{BodyParameters, MannequinConfig, ShapeKey, ShapeKeyWeights};
use nalgebra::Vector3;
use rustc_hash::FxHashMap;

/// A single named displacement channel
#[derive(Debug, Clone)]
pub struct MorphChannel {
    pub name: String,
    /// Per-vertex displacement (dx, dy, dz)
    pub displacements: Vec<f32>,
}

impl MorphChannel {
    #[inline]
    pub fn displacement(&self, vertex: usize) -> Vector3<f32> {
        match self.displacements.get(vertex * 3..vertex * 3 + 3) {
            Some(d) => Vector3::new(d[0], d[1], d[2]),
            None => Vector3::zeros(),
        }
    }
}

/// Morph-channel dictionary of a mesh with its influence slots
#[derive(Debug, Clone, Default)]
pub struct MorphChannels {
    channels: Vec<MorphChannel>,
    index: FxHashMap<String, usize>,
    influences: Vec<f32>,
}

impl MorphChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel with zero influence, returning its slot.
    ///
    /// A duplicate name keeps the first slot in the dictionary.
    pub fn push(&mut self, name: impl Into<String>, displacements: Vec<f32>) -> usize {
        let name = name.into();
        let slot = self.channels.len();
        self.index.entry(name.clone()).or_insert(slot);
        self.channels.push(MorphChannel {
            name,
            displacements,
        });
        self.influences.push(0.0);
        slot
    }

    /// Add a channel after checking it covers `vertex_count` vertices.
    pub fn push_checked(
        &mut self,
        name: impl Into<String>,
        displacements: Vec<f32>,
        vertex_count: usize,
    ) -> Result<usize> {
        let name = name.into();
        if displacements.len() != vertex_count * 3 {
            return Err(Error::MorphLength {
                channel: name,
                expected: vertex_count * 3,
                actual: displacements.len(),
            });
        }
        Ok(self.push(name, displacements))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[inline]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    #[inline]
    pub fn influences(&self) -> &[f32] {
        &self.influences
    }

    #[inline]
    pub fn influence(&self, slot: usize) -> Option<f32> {
        self.influences.get(slot).copied()
    }

    /// Write the influence of a slot; out-of-range slots are ignored.
    #[inline]
    pub fn set_influence(&mut self, slot: usize, weight: f32) {
        if let Some(value) = self.influences.get_mut(slot) {
            *value = weight;
        }
    }

    /// Channels whose influence is non-zero, with that influence
    pub fn active(&self) -> impl Iterator<Item = (&MorphChannel, f32)> {
        self.channels
            .iter()
            .zip(self.influences.iter().copied())
            .filter(|(_, influence)| *influence != 0.0)
    }

    #[inline]
    pub fn has_active(&self) -> bool {
        self.influences.iter().any(|i| *i != 0.0)
    }

    /// Sum of weighted displacements at `vertex`
    pub fn offset(&self, vertex: usize) -> Vector3<f32> {
        self.active()
            .fold(Vector3::zeros(), |acc, (channel, influence)| {
                acc + channel.displacement(vertex) * influence
            })
    }

    pub fn clear(&mut self) {
        self.channels = Vec::new();
        self.index = FxHashMap::default();
        self.influences = Vec::new();
    }
}

/// Write precomputed weights into a mesh's influence slots.
///
/// Returns how many of the five shape keys found a channel.
pub fn apply_shape_weights(
    mesh: &mut MeshTarget,
    weights: &ShapeKeyWeights,
    config: &MannequinConfig,
) -> usize {
    let Some(morph) = mesh.morph.as_mut() else {
        return 0;
    };

    let mut applied = 0;
    for key in ShapeKey::ALL {
        if let Some(slot) = config.aliases.resolve(key, |name| morph.slot(name)) {
            morph.set_influence(slot, weights.get(key) as f32);
            applied += 1;
        }
    }
    applied
}

/// Map body parameters to weights and write them into `mesh`.
///
/// Idempotent: the same parameters always leave the same influences.
pub fn apply_weights(mesh: &mut MeshTarget, params: &BodyParameters, config: &MannequinConfig) -> usize {
    let weights = config.weights(params);
    let applied = apply_shape_weights(mesh, &weights, config);
    tracing::trace!(mesh = %mesh.name, applied, "Applied shape-key weights");
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use mannequin_core::BodyField;

    fn morph_mesh(names: &[&str]) -> MeshTarget {
        let mut morph = MorphChannels::new();
        for name in names {
            morph.push(*name, vec![0.0, 1.0, 0.0]);
        }
        MeshTarget::new("Body", Mesh::from_positions(vec![0.0, 0.0, 0.0])).with_morph(morph)
    }

    #[test]
    fn test_applies_all_five_channels() {
        let mut mesh = morph_mesh(&["Height", "Shoulders", "Chest", "Waist", "Hips"]);
        let config = MannequinConfig::default();
        let params = BodyParameters::default().with(BodyField::Height, 200.0);
        assert_eq!(apply_weights(&mut mesh, &params, &config), 5);
        let morph = mesh.morph.as_ref().unwrap();
        assert_eq!(morph.influence(morph.slot("Height").unwrap()), Some(1.0));
        assert_eq!(morph.influence(morph.slot("Waist").unwrap()), Some(0.5));
    }

    #[test]
    fn test_aliases_and_partial_match() {
        let mut mesh = morph_mesh(&["height", "shoulder_width", "Smile"]);
        let config = MannequinConfig::default();
        assert_eq!(apply_weights(&mut mesh, &BodyParameters::default(), &config), 2);
        let morph = mesh.morph.as_ref().unwrap();
        assert_eq!(morph.influence(morph.slot("Smile").unwrap()), Some(0.0));
    }

    #[test]
    fn test_mesh_without_morphs_is_noop() {
        let mut mesh = MeshTarget::new("Body", Mesh::from_positions(vec![0.0, 0.0, 0.0]));
        let config = MannequinConfig::default();
        assert_eq!(apply_weights(&mut mesh, &BodyParameters::default(), &config), 0);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut mesh = morph_mesh(&["Height", "Chest", "Hips"]);
        let config = MannequinConfig::default();
        let params = BodyParameters {
            height: 171.0,
            chest: 93.5,
            waist: 66.0,
            hips: 119.0,
            shoulder_width: 41.0,
        };
        apply_weights(&mut mesh, &params, &config);
        let first = mesh.morph.as_ref().unwrap().influences().to_vec();
        apply_weights(&mut mesh, &params, &config);
        assert_eq!(mesh.morph.as_ref().unwrap().influences(), first.as_slice());
    }

    #[test]
    fn test_offset_sums_active_channels() {
        let mut morph = MorphChannels::new();
        let a = morph.push("A", vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        let b = morph.push("B", vec![0.0, 0.0, 4.0]);
        morph.set_influence(a, 0.5);
        morph.set_influence(b, 0.25);
        assert_eq!(morph.offset(0), Vector3::new(0.5, 0.0, 1.0));
        // channel B is short, vertex 1 only sees A
        assert_eq!(morph.offset(1), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_push_checked_rejects_wrong_length() {
        let mut morph = MorphChannels::new();
        assert!(morph.push_checked("Chest", vec![0.0; 6], 2).is_ok());
        assert!(matches!(
            morph.push_checked("Waist", vec![0.0; 5], 2),
            Err(Error::MorphLength { expected: 6, actual: 5, .. })
        ));
    }
}
