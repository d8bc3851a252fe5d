// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loaded mannequin scene graph and mesh-role detection
//!
//! A rig holds every mesh of the loaded asset. One of them is the body, which
//! drives floor placement and camera framing; at most one other is the
//! garment slot. Which is which is decided by a [`MeshClassifier`].

use crate::material::MaterialSlot;
use crate::mesh::Mesh;
use crate::morph::MorphChannels;
use crate::transform::Transform;

/// A renderable surface with optional morph channels
#[derive(Debug, Clone)]
pub struct MeshTarget {
    pub name: String,
    pub geometry: Mesh,
    /// `None` when the asset exposes no morph dictionary for this mesh
    pub morph: Option<MorphChannels>,
    pub material: MaterialSlot,
    pub visible: bool,
    /// Transform relative to the rig root
    pub transform: Transform,
    disposed: bool,
}

impl MeshTarget {
    pub fn new(name: impl Into<String>, geometry: Mesh) -> Self {
        Self {
            name: name.into(),
            geometry,
            morph: None,
            material: MaterialSlot::default(),
            visible: true,
            transform: Transform::identity(),
            disposed: false,
        }
    }

    pub fn with_morph(mut self, morph: MorphChannels) -> Self {
        self.morph = Some(morph);
        self
    }

    pub fn with_material(mut self, material: MaterialSlot) -> Self {
        self.material = material;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    pub fn has_morphs(&self) -> bool {
        self.morph.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Free geometry, morph data and materials. Returns the number of
    /// materials disposed.
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        self.geometry.clear();
        if let Some(morph) = self.morph.as_mut() {
            morph.clear();
        }
        let mut materials = 0;
        for material in self.material.iter_mut() {
            material.dispose();
            materials += 1;
        }
        self.disposed = true;
        materials
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Indices of the meshes playing the body and garment roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRoles {
    pub body: Option<usize>,
    pub garment: Option<usize>,
}

impl MeshRoles {
    /// Drop indices outside `0..mesh_count` and a garment that is also the body.
    pub fn sanitized(self, mesh_count: usize) -> Self {
        let in_range = |i: Option<usize>| i.filter(|i| *i < mesh_count);
        let body = in_range(self.body);
        Self {
            body,
            garment: in_range(self.garment).filter(|g| Some(*g) != body),
        }
    }
}

/// Strategy deciding which meshes of a rig are body and garment
pub trait MeshClassifier: Send + Sync {
    fn classify(&self, names: &[&str]) -> MeshRoles;
}

/// Default classifier: substring matching on mesh names with positional fallback
///
/// A name containing `body` is the body. Otherwise `cloth`, `shirt` or
/// `tshirt` marks the garment, and a generic `mesh` marks the body. Matching
/// is case-insensitive and the first hit per role wins. Roles left unresolved
/// are filled from the remaining meshes in order: body first, then garment.
#[derive(Debug, Clone)]
pub struct NameHeuristic {
    pub body_keywords: Vec<String>,
    pub garment_keywords: Vec<String>,
    pub generic_body_keywords: Vec<String>,
}

impl Default for NameHeuristic {
    fn default() -> Self {
        Self {
            body_keywords: vec!["body".into()],
            garment_keywords: vec!["cloth".into(), "shirt".into(), "tshirt".into()],
            generic_body_keywords: vec!["mesh".into()],
        }
    }
}

fn contains_any(name: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| name.contains(k.as_str()))
}

impl MeshClassifier for NameHeuristic {
    fn classify(&self, names: &[&str]) -> MeshRoles {
        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let mut roles = MeshRoles::default();

        for (i, name) in lowered.iter().enumerate() {
            if roles.body.is_none() && contains_any(name, &self.body_keywords) {
                roles.body = Some(i);
            }
        }
        for (i, name) in lowered.iter().enumerate() {
            if Some(i) == roles.body {
                continue;
            }
            if roles.garment.is_none() && contains_any(name, &self.garment_keywords) {
                roles.garment = Some(i);
            } else if roles.body.is_none() && contains_any(name, &self.generic_body_keywords) {
                roles.body = Some(i);
            }
        }

        let matched = roles;
        let mut unmatched =
            (0..names.len()).filter(move |i| Some(*i) != matched.body && Some(*i) != matched.garment);
        if roles.body.is_none() {
            roles.body = unmatched.next();
        }
        if roles.garment.is_none() {
            roles.garment = unmatched.next();
        }
        roles
    }
}

/// Classifier with fixed indices, for fixtures and assets with known layout
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRoles(pub MeshRoles);

impl MeshClassifier for FixedRoles {
    fn classify(&self, names: &[&str]) -> MeshRoles {
        self.0.sanitized(names.len())
    }
}

/// The loaded mannequin: root transform plus meshes with resolved roles
#[derive(Debug, Clone)]
pub struct ModelRig {
    /// Root transform; floor placement writes its translation
    pub root: Transform,
    meshes: Vec<MeshTarget>,
    roles: MeshRoles,
}

impl ModelRig {
    /// Build a rig with the default name heuristic.
    pub fn new(meshes: Vec<MeshTarget>) -> Self {
        Self::with_classifier(meshes, &NameHeuristic::default())
    }

    /// Build a rig, resolving roles through `classifier`.
    ///
    /// Whatever the classifier returns is sanitized against the mesh list.
    pub fn with_classifier(meshes: Vec<MeshTarget>, classifier: &dyn MeshClassifier) -> Self {
        let names: Vec<&str> = meshes.iter().map(|m| m.name.as_str()).collect();
        let classified = classifier.classify(&names);
        let roles = classified.sanitized(meshes.len());
        if roles != classified {
            tracing::warn!(?classified, meshes = meshes.len(), "Classifier returned invalid mesh roles");
        }

        let name_of = |i: Option<usize>| i.and_then(|i| meshes.get(i)).map(|m| m.name.as_str());
        tracing::debug!(
            meshes = meshes.len(),
            body = ?name_of(roles.body),
            garment = ?name_of(roles.garment),
            "Classified rig meshes"
        );
        Self {
            root: Transform::identity(),
            meshes,
            roles,
        }
    }

    #[inline]
    pub fn roles(&self) -> MeshRoles {
        self.roles
    }

    pub fn meshes(&self) -> &[MeshTarget] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [MeshTarget] {
        &mut self.meshes
    }

    pub fn body(&self) -> Option<&MeshTarget> {
        self.roles.body.and_then(|i| self.meshes.get(i))
    }

    pub fn body_mut(&mut self) -> Option<&mut MeshTarget> {
        self.roles.body.and_then(|i| self.meshes.get_mut(i))
    }

    pub fn garment(&self) -> Option<&MeshTarget> {
        self.roles.garment.and_then(|i| self.meshes.get(i))
    }

    pub fn garment_mut(&mut self) -> Option<&mut MeshTarget> {
        self.roles.garment.and_then(|i| self.meshes.get_mut(i))
    }

    /// Clear the upload flag of every material, returning how many were set.
    pub fn take_material_updates(&mut self) -> usize {
        self.meshes
            .iter_mut()
            .flat_map(|mesh| mesh.material.iter_mut())
            .map(|material| material.take_needs_update())
            .filter(|updated| *updated)
            .count()
    }

    /// Dispose every mesh. Returns `(meshes, materials)` released.
    pub fn dispose(&mut self) -> (usize, usize) {
        let mut meshes = 0;
        let mut materials = 0;
        for mesh in &mut self.meshes {
            if !mesh.is_disposed() {
                materials += mesh.dispose();
                meshes += 1;
            }
        }
        (meshes, materials)
    }
}
