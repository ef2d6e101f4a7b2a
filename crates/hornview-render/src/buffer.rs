//! Vertex buffer packing and GPU buffer helpers.

use hornview_core::{DrawRange, MeshGroup};
use wgpu::util::DeviceExt;

/// Name of the position attribute in the surface program.
pub const POSITION_ATTRIBUTE: &str = "a_vertex";
/// Name of the texture coordinate attribute in the surface program.
pub const UV_ATTRIBUTE: &str = "a_tex_coord_uv";

/// How one attribute reads a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    /// Floats per vertex, 1 to 4.
    pub component_count: u32,
    /// Bytes between consecutive vertices, 0 for tightly packed.
    pub byte_stride: u32,
    /// Byte offset of the first vertex.
    pub byte_offset: u32,
}

impl AttributeBinding {
    /// A tightly packed float attribute starting at `byte_offset`.
    #[must_use]
    pub fn tightly_packed(component_count: u32, byte_offset: u32) -> Self {
        Self {
            component_count,
            byte_stride: component_count * 4,
            byte_offset,
        }
    }

    /// Stride with 0 resolved to the packed size.
    #[must_use]
    pub fn effective_stride(&self) -> u32 {
        if self.byte_stride == 0 {
            self.component_count * 4
        } else {
            self.byte_stride
        }
    }

    /// Bytes a buffer needs so this attribute can read `vertex_count` vertices.
    #[must_use]
    pub fn required_bytes(&self, vertex_count: usize) -> usize {
        if vertex_count == 0 {
            return 0;
        }
        let element = self.component_count as usize * 4;
        self.byte_offset as usize + (vertex_count - 1) * self.effective_stride() as usize + element
    }

    /// Whole vertices this attribute can read from a buffer of `buffer_len` bytes.
    #[must_use]
    pub fn vertex_capacity(&self, buffer_len: usize) -> usize {
        let element = self.component_count as usize * 4;
        match buffer_len.checked_sub(self.byte_offset as usize) {
            Some(available) if available >= element => {
                (available - element) / self.effective_stride() as usize + 1
            }
            _ => 0,
        }
    }

    pub(crate) fn vertex_format(&self) -> wgpu::VertexFormat {
        match self.component_count {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// A mesh group flattened into one float buffer.
///
/// All positions come first, then all texture coordinates, so each stream is
/// contiguous and the two attributes only differ in stride and offset.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedMeshGroup {
    floats: Vec<f32>,
    position: AttributeBinding,
    uv: AttributeBinding,
    draw_ranges: Vec<DrawRange>,
}

/// Packs every mesh of `group` into a single buffer.
pub fn pack_mesh_group(group: &MeshGroup) -> hornview_core::Result<PackedMeshGroup> {
    let draw_ranges = group.draw_ranges()?;
    let vertex_count = group.vertex_count();
    let mut floats = Vec::with_capacity(vertex_count * 5);

    for mesh in group.meshes() {
        for p in mesh.positions() {
            floats.extend_from_slice(&p.to_array());
        }
    }
    let position_floats = floats.len();
    for mesh in group.meshes() {
        for uv in mesh.uvs() {
            floats.extend_from_slice(&uv.to_array());
        }
    }

    let uv_byte_offset = (position_floats * 4) as u32;
    log::debug!(
        "packed {} meshes: {vertex_count} vertices, {} floats, uv stream at byte {uv_byte_offset}",
        group.meshes().len(),
        floats.len()
    );

    Ok(PackedMeshGroup {
        floats,
        position: AttributeBinding::tightly_packed(3, 0),
        uv: AttributeBinding::tightly_packed(2, uv_byte_offset),
        draw_ranges,
    })
}

impl PackedMeshGroup {
    /// The packed floats.
    #[must_use]
    pub fn floats(&self) -> &[f32] {
        &self.floats
    }

    /// The packed data as bytes, ready for upload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.floats)
    }

    #[must_use]
    pub fn position_binding(&self) -> AttributeBinding {
        self.position
    }

    #[must_use]
    pub fn uv_binding(&self) -> AttributeBinding {
        self.uv
    }

    /// Byte offset where texture coordinates start.
    #[must_use]
    pub fn uv_byte_offset(&self) -> u32 {
        self.uv.byte_offset
    }

    /// One draw range per packed mesh, in order.
    #[must_use]
    pub fn draw_ranges(&self) -> &[DrawRange] {
        &self.draw_ranges
    }

    /// Bindings for the surface program's attributes.
    #[must_use]
    pub fn attribute_bindings(&self) -> [(&'static str, AttributeBinding); 2] {
        [(POSITION_ATTRIBUTE, self.position), (UV_ATTRIBUTE, self.uv)]
    }
}

/// Creates a vertex buffer from data.
pub fn create_vertex_buffer(device: &wgpu::Device, data: &[u8], label: Option<&str>) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: data,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use hornview_core::Mesh;
    use proptest::prelude::*;

    fn strip(n: usize, base: f32) -> Mesh {
        let positions = (0..n).map(|i| Vec3::splat(base + i as f32)).collect();
        let uvs = (0..n).map(|i| Vec2::splat(base + i as f32 * 0.5)).collect();
        Mesh::new(positions, uvs).unwrap()
    }

    #[test]
    fn test_positions_precede_uvs() {
        let group = MeshGroup::new().with_mesh(strip(3, 0.0)).with_mesh(strip(4, 10.0));
        let packed = pack_mesh_group(&group).unwrap();

        // 7 positions * 3 floats, then 7 uvs * 2 floats.
        assert_eq!(packed.floats().len(), 21 + 14);
        assert_eq!(packed.uv_byte_offset(), 21 * 4);
        assert_eq!(&packed.floats()[..3], &[0.0, 0.0, 0.0]);
        // First position of the second mesh follows the first mesh directly.
        assert_eq!(&packed.floats()[9..12], &[10.0, 10.0, 10.0]);
        // First uv of the second mesh.
        assert_eq!(&packed.floats()[21 + 6..21 + 8], &[10.0, 10.0]);
        assert_eq!(packed.bytes().len(), 35 * 4);
    }

    #[test]
    fn test_draw_ranges_follow_mesh_order() {
        let group = MeshGroup::new().with_mesh(strip(5, 0.0)).with_mesh(strip(3, 0.0));
        let packed = pack_mesh_group(&group).unwrap();
        let ranges: Vec<_> = packed.draw_ranges().iter().map(DrawRange::vertices).collect();
        assert_eq!(ranges, vec![0..5, 5..8]);
    }

    #[test]
    fn test_bindings_are_tightly_packed() {
        let packed = pack_mesh_group(&MeshGroup::new().with_mesh(strip(3, 0.0))).unwrap();
        let [(pos_name, pos), (uv_name, uv)] = packed.attribute_bindings();
        assert_eq!(pos_name, "a_vertex");
        assert_eq!(uv_name, "a_tex_coord_uv");
        assert_eq!(pos, AttributeBinding::tightly_packed(3, 0));
        assert_eq!(uv.byte_stride, 8);
        assert_eq!(uv.byte_offset, 36);
    }

    #[test]
    fn test_zero_stride_means_packed() {
        let binding = AttributeBinding {
            component_count: 2,
            byte_stride: 0,
            byte_offset: 0,
        };
        assert_eq!(binding.effective_stride(), 8);
        assert_eq!(binding.vertex_format(), wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_capacity_of_packed_streams() {
        let packed = pack_mesh_group(&MeshGroup::new().with_mesh(strip(4, 0.0))).unwrap();
        let len = packed.bytes().len();
        assert_eq!(packed.position_binding().vertex_capacity(len), 4);
        assert_eq!(packed.uv_binding().vertex_capacity(len), 4);
        assert_eq!(packed.uv_binding().required_bytes(4), len);

        // Truncating inside the last uv loses exactly that vertex.
        assert_eq!(packed.uv_binding().vertex_capacity(len - 4), 3);
        // A buffer ending before the uv stream holds none.
        let uv_start = packed.uv_byte_offset() as usize;
        assert_eq!(packed.uv_binding().vertex_capacity(uv_start - 4), 0);
        assert_eq!(packed.uv_binding().required_bytes(0), 0);
    }

    proptest! {
        #[test]
        fn prop_packed_sizes(counts in prop::collection::vec(3usize..40, 1..5)) {
            let mut group = MeshGroup::new();
            for &n in &counts {
                group.push(strip(n, 1.0));
            }
            let total: usize = counts.iter().sum();
            let packed = pack_mesh_group(&group).unwrap();

            prop_assert_eq!(packed.floats().len(), total * 3 + total * 2);
            prop_assert_eq!(packed.uv_byte_offset() as usize, total * 3 * 4);
            let last = packed.draw_ranges().last().unwrap();
            prop_assert_eq!((last.offset + last.count) as usize, total);
        }
    }
}
