// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mannequin asset loading
//!
//! Loaders turn an asset reference into flat [`MeshTarget`]s; role detection
//! happens later, when the viewer builds the rig.

use crate::error::{Error, Result};
use crate::material::{Material, MaterialSlot};
use crate::mesh::Mesh;
use crate::morph::MorphChannels;
use crate::rig::MeshTarget;
use crate::transform::Transform;
use nalgebra::Matrix4;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a rig comes from
#[derive(Debug, Clone)]
pub enum AssetSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// Something that can produce the meshes of a mannequin rig
pub trait RigLoader: Send + Sync {
    fn load(&self, source: &AssetSource) -> Result<Vec<MeshTarget>>;
}

/// glTF 2.0 / GLB loader with morph-target support
///
/// Morph channel names come from the mesh's `extras.targetNames`, the
/// convention used by Blender and three.js exporters.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfLoader;

#[derive(Deserialize)]
struct MeshExtras {
    #[serde(rename = "targetNames", default)]
    target_names: Vec<String>,
}

impl RigLoader for GltfLoader {
    fn load(&self, source: &AssetSource) -> Result<Vec<MeshTarget>> {
        let (document, buffers, _images) = match source {
            AssetSource::Path(path) => gltf::import(path)?,
            AssetSource::Bytes(bytes) => gltf::import_slice(bytes)?,
        };

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(Error::NoScene)?;

        let mut meshes = Vec::new();
        for node in scene.nodes() {
            collect_node(&node, &Matrix4::identity(), &buffers, &mut meshes);
        }

        if meshes.is_empty() {
            return Err(Error::EmptyAsset);
        }

        let triangles: usize = meshes.iter().map(|m| m.geometry.triangle_count()).sum();
        tracing::info!(source = %source, meshes = meshes.len(), triangles, "Loaded mannequin asset");
        Ok(meshes)
    }
}

fn collect_node(
    node: &gltf::Node,
    parent: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshTarget>,
) {
    let local = Matrix4::from(node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let base_name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

        let target_names = mesh
            .extras()
            .as_ref()
            .and_then(|raw| serde_json::from_str::<MeshExtras>(raw.get()).ok())
            .map(|extras| extras.target_names)
            .unwrap_or_default();
        let default_weights = mesh.weights().unwrap_or(&[]);

        let primitive_count = mesh.primitives().len();
        for primitive in mesh.primitives() {
            let name = if primitive_count > 1 {
                format!("{}_{}", base_name, primitive.index())
            } else {
                base_name.clone()
            };

            match read_primitive(&primitive, buffers, &target_names, default_weights) {
                Some((geometry, morph)) => {
                    let material = primitive.material();
                    let [r, g, b, _] = material.pbr_metallic_roughness().base_color_factor();
                    let color = pack_rgb(r, g, b);
                    let material_name = material.name().unwrap_or("default").to_string();

                    let mut target = MeshTarget::new(name, geometry)
                        .with_material(MaterialSlot::Single(Material::new(material_name, color)))
                        .with_transform(Transform::from_matrix(&world));
                    target.morph = morph;
                    out.push(target);
                }
                None => tracing::warn!(mesh = %name, "Skipping primitive without positions"),
            }
        }
    }

    for child in node.children() {
        collect_node(&child, &world, buffers, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    target_names: &[String],
    default_weights: &[f32],
) -> Option<(Mesh, Option<MorphChannels>)> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<f32> = reader.read_positions()?.flatten().collect();
    let vertex_count = positions.len() / 3;

    let mut geometry = Mesh::with_capacity(vertex_count, 0);
    geometry.positions = positions;
    if let Some(normals) = reader.read_normals() {
        geometry.normals = normals.flatten().collect();
    }
    if let Some(indices) = reader.read_indices() {
        geometry.indices = indices.into_u32().collect();
    }

    let mut morph = MorphChannels::new();
    for (i, (displacements, _normals, _tangents)) in reader.read_morph_targets().enumerate() {
        let displacements: Vec<f32> = displacements
            .map(|d| d.flatten().collect())
            .unwrap_or_else(|| vec![0.0; vertex_count * 3]);
        let name = target_names
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("target_{}", i));

        match morph.push_checked(name, displacements, vertex_count) {
            Ok(slot) => {
                if let Some(weight) = default_weights.get(i) {
                    morph.set_influence(slot, *weight);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Dropping malformed morph target"),
        }
    }

    if !morph.is_empty() {
        tracing::debug!(
            vertices = vertex_count,
            channels = ?morph.names().collect::<Vec<_>>(),
            "Read morph targets"
        );
    }
    let morph = (!morph.is_empty()).then_some(morph);
    Some((geometry, morph))
}

fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(1.0, 1.0, 1.0), 0xFFFFFF);
        assert_eq!(pack_rgb(0.0, 0.5, 2.0), 0x0080FF);
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let source = AssetSource::Bytes(Arc::from(&b"not a gltf"[..]));
        assert!(GltfLoader.load(&source).is_err());
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let source = AssetSource::Path(PathBuf::from("/nonexistent/mannequin.glb"));
        assert!(matches!(GltfLoader.load(&source), Err(Error::AssetLoad(_))));
    }

    #[test]
    fn test_source_display() {
        let bytes = AssetSource::Bytes(Arc::from(&[0u8; 4][..]));
        assert_eq!(bytes.to_string(), "<4 bytes>");
    }
}
