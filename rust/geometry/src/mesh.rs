// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::bounds::Aabb;
use nalgebra::Point3;

/// Triangle mesh in its base (un-morphed) pose
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Build a mesh from flat position data without normals or indices
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Base position of vertex `index`
    #[inline]
    pub fn position(&self, index: usize) -> Option<Point3<f32>> {
        let chunk = self.positions.get(index * 3..index * 3 + 3)?;
        Some(Point3::new(chunk[0], chunk[1], chunk[2]))
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Static bounds of the base pose
    #[inline]
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        self.positions.chunks_exact(3).for_each(|chunk| {
            bounds.expand(Point3::new(chunk[0], chunk[1], chunk[2]));
        });
        bounds
    }

    /// Release vertex buffers
    #[inline]
    pub fn clear(&mut self) {
        self.positions = Vec::new();
        self.normals = Vec::new();
        self.indices = Vec::new();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(!mesh.bounds().is_valid());
    }

    #[test]
    fn test_position_lookup() {
        let mesh = Mesh::from_positions(vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.position(0), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(mesh.position(1), None);
    }

    #[test]
    fn test_bounds() {
        let mesh = Mesh::from_positions(vec![
            -1.0, 0.5, 2.0,
            3.0, -4.0, 0.0,
            0.0, 1.0, -2.0,
        ]);
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Point3::new(-1.0, -4.0, -2.0));
        assert_eq!(bounds.max, Point3::new(3.0, 1.0, 2.0));
    }
}
