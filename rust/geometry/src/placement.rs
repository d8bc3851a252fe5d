// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor placement after deformation
//!
//! The morphed body is measured in the rig's local space, then the rig root is
//! translated so the model is centred on the vertical axis with its lowest
//! point on `y = 0`.

use crate::bounds::Aabb;
use crate::rig::{MeshTarget, ModelRig};
use crate::transform::Transform;
use nalgebra::{Point3, Vector3};

/// Fraction of the model height used as the camera look-at height.
pub const EYE_LINE_FRACTION: f32 = 0.45;

/// Result of a successful floor placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorPlacement {
    /// Morphed body bounds in rig space, before the root offset
    pub bounds: Aabb,
    /// Translation written to the rig root
    pub offset: Vector3<f32>,
    pub model_height: f32,
    pub look_at_height: f32,
}

/// Bounds of a mesh in its own space with current morph influences applied.
///
/// Falls back to the static bounds when the mesh has no morph channels or all
/// influences are zero. `None` when the mesh has no positions.
pub fn morphed_bounds(mesh: &MeshTarget) -> Option<Aabb> {
    if mesh.geometry.is_empty() {
        return None;
    }

    let morph = match mesh.morph.as_ref() {
        Some(morph) if morph.has_active() => morph,
        _ => return Some(mesh.geometry.bounds()),
    };

    let mut bounds = Aabb::empty();
    for (vertex, chunk) in mesh.geometry.positions.chunks_exact(3).enumerate() {
        let base = Point3::new(chunk[0], chunk[1], chunk[2]);
        bounds.expand(base + morph.offset(vertex));
    }
    Some(bounds)
}

/// Reposition the rig so the morphed body stands on the floor.
///
/// Silent no-op returning `None` when there is no body mesh or it has no
/// positions; the rig keeps its previous placement in that case.
pub fn position_on_floor(rig: &mut ModelRig) -> Option<FloorPlacement> {
    let local = morphed_bounds(rig.body()?)?;
    rig.root = Transform::identity();

    let body_matrix = rig.body()?.transform.to_matrix();
    let bounds = local.transformed(&body_matrix);

    let center = bounds.center();
    let offset = Vector3::new(-center.x, -bounds.min.y, -center.z);
    rig.root = Transform::from_translation(offset);

    let model_height = bounds.size().y;
    let placement = FloorPlacement {
        bounds,
        offset,
        model_height,
        look_at_height: EYE_LINE_FRACTION * model_height,
    };

    tracing::debug!(
        model_height = placement.model_height,
        offset_y = placement.offset.y,
        "Placed model on floor"
    );
    Some(placement)
}
