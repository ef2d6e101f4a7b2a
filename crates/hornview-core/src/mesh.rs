//! Triangle-strip meshes and mesh groups.

use std::ops::Range;

use glam::{Vec2, Vec3};

use crate::error::{HornError, Result};

/// Largest vertex count a mesh or mesh group may hold.
pub const MAX_VERTICES: usize = 1 << 24;

/// Vertices emitted by a doubled-vertex strip over a `rows x columns` grid,
/// `2 * rows * (columns + 1)`, saturating instead of overflowing.
#[must_use]
pub fn strip_vertex_count(rows: u32, columns: u32) -> usize {
    let count = 2u64
        .saturating_mul(u64::from(rows))
        .saturating_mul(u64::from(columns) + 1);
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// A triangle-strip mesh with one texture coordinate per position.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
}

impl Mesh {
    /// Creates a mesh, checking that both streams have the same length and
    /// that there are enough vertices for at least one triangle.
    pub fn new(positions: Vec<Vec3>, uvs: Vec<Vec2>) -> Result<Self> {
        if positions.len() != uvs.len() {
            return Err(HornError::SizeMismatch {
                expected: positions.len(),
                actual: uvs.len(),
            });
        }
        if positions.len() < 3 {
            return Err(HornError::DegenerateMesh(positions.len()));
        }
        if positions.len() > MAX_VERTICES {
            return Err(HornError::TooManyVertices {
                count: positions.len(),
                max: MAX_VERTICES,
            });
        }
        Ok(Self { positions, uvs })
    }

    /// Vertex positions in strip order.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Texture coordinates in strip order.
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A contiguous range of vertices drawn with one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    /// First vertex of the range.
    pub offset: u32,
    /// Number of vertices in the range.
    pub count: u32,
}

impl DrawRange {
    /// The range as vertex indices.
    #[must_use]
    pub fn vertices(&self) -> Range<u32> {
        self.offset..self.offset + self.count
    }
}

/// An ordered set of meshes that share one packed vertex buffer.
#[derive(Debug, Clone, Default)]
pub struct MeshGroup {
    meshes: Vec<Mesh>,
}

impl MeshGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mesh; its draw range follows the previous mesh's.
    #[must_use]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Appends a mesh in place.
    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    /// The meshes in draw order.
    #[must_use]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Total vertex count of all meshes.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    /// Draw ranges, one per mesh, partitioning `0..vertex_count()`.
    ///
    /// Fails when the group holds more than [`MAX_VERTICES`] vertices.
    pub fn draw_ranges(&self) -> Result<Vec<DrawRange>> {
        let total = self.vertex_count();
        if total > MAX_VERTICES {
            return Err(HornError::TooManyVertices {
                count: total,
                max: MAX_VERTICES,
            });
        }

        let mut offset = 0u32;
        let mut ranges = Vec::with_capacity(self.meshes.len());
        for mesh in &self.meshes {
            // Bounded by MAX_VERTICES above.
            let count = mesh.vertex_count() as u32;
            ranges.push(DrawRange { offset, count });
            offset += count;
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strip(n: usize) -> Mesh {
        let positions = (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let uvs = (0..n).map(|i| Vec2::new(i as f32 / n as f32, 0.0)).collect();
        Mesh::new(positions, uvs).unwrap()
    }

    #[test]
    fn test_mesh_rejects_mismatched_streams() {
        let result = Mesh::new(vec![Vec3::ZERO; 4], vec![Vec2::ZERO; 3]);
        assert!(matches!(
            result,
            Err(HornError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_mesh_rejects_too_few_vertices() {
        let result = Mesh::new(vec![Vec3::ZERO; 2], vec![Vec2::ZERO; 2]);
        assert!(matches!(result, Err(HornError::DegenerateMesh(2))));
    }

    #[test]
    fn test_strip_vertex_count_saturates() {
        assert_eq!(strip_vertex_count(20, 72), 2 * 20 * 73);
        assert_eq!(strip_vertex_count(u32::MAX, u32::MAX), usize::MAX);
    }

    #[test]
    fn test_draw_ranges_follow_each_other() {
        let group = MeshGroup::new().with_mesh(strip(5)).with_mesh(strip(7));
        let ranges = group.draw_ranges().unwrap();
        assert_eq!(ranges[0], DrawRange { offset: 0, count: 5 });
        assert_eq!(ranges[1], DrawRange { offset: 5, count: 7 });
        assert_eq!(ranges[1].vertices(), 5..12);
        assert_eq!(group.vertex_count(), 12);
    }

    proptest! {
        #[test]
        fn draw_ranges_partition_vertex_space(sizes in prop::collection::vec(3usize..64, 1..6)) {
            let mut group = MeshGroup::new();
            for &n in &sizes {
                group.push(strip(n));
            }
            let ranges = group.draw_ranges().unwrap();
            let mut expected_offset = 0u32;
            for (range, &n) in ranges.iter().zip(&sizes) {
                prop_assert_eq!(range.offset, expected_offset);
                prop_assert_eq!(range.count as usize, n);
                expected_offset += range.count;
            }
            prop_assert_eq!(expected_offset as usize, group.vertex_count());
        }
    }
}
