//! Typed uniform values and the CPU-side uniform block they are written into.

use std::fmt;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::error::{RenderError, RenderResult};

/// A value for one uniform, tagged by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// The shape of a uniform value or declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Number of bytes the value occupies in the block.
    #[must_use]
    pub fn byte_size(self) -> usize {
        match self {
            UniformKind::Scalar => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    /// WGSL spelling of the type.
    #[must_use]
    pub fn wgsl_name(self) -> &'static str {
        match self {
            UniformKind::Scalar => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

impl UniformValue {
    /// The value's tag.
    #[must_use]
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Scalar(_) => UniformKind::Scalar,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Writes the value's floats (matrices column-major) into `out`.
    fn write_to(&self, out: &mut [u8]) {
        match self {
            UniformValue::Scalar(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => {
                out.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
            }
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Scalar(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

/// Where a named uniform lives inside the uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    /// Byte offset of the member.
    pub offset: u32,
    /// Shape of the member, `None` for types values cannot be written to.
    pub kind: Option<UniformKind>,
    /// WGSL spelling of the declared type.
    pub declared: String,
}

/// CPU copy of the program's uniform buffer.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    /// Creates a zeroed block of `size` bytes.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            dirty: true,
        }
    }

    /// Writes `value` into `slot`, checking the declared shape.
    pub fn write(&mut self, name: &str, slot: &UniformSlot, value: UniformValue) -> RenderResult<()> {
        let kind = value.kind();
        if slot.kind != Some(kind) {
            return Err(RenderError::UnsupportedUniformType {
                name: name.to_string(),
                declared: slot.declared.clone(),
                given: kind,
            });
        }

        let start = slot.offset as usize;
        let end = start + kind.byte_size();
        let Some(target) = self.bytes.get_mut(start..end) else {
            return Err(RenderError::BufferSizeMismatch {
                expected: end,
                actual: self.bytes.len(),
            });
        };
        value.write_to(target);
        self.dirty = true;
        Ok(())
    }

    /// The raw block contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns whether the block changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(offset: u32, kind: UniformKind) -> UniformSlot {
        UniformSlot {
            offset,
            kind: Some(kind),
            declared: kind.wgsl_name().to_string(),
        }
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_matrix_is_written_column_major_at_offset() {
        let mut block = UniformBlock::new(128);
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block
            .write("m", &slot(64, UniformKind::Mat4), UniformValue::Mat4(m))
            .unwrap();

        let written = floats(&block.as_bytes()[64..128]);
        assert_eq!(written, m.to_cols_array().to_vec());
        // Translation sits in the fourth column.
        assert_eq!(&written[12..15], &[1.0, 2.0, 3.0]);
        assert!(block.as_bytes()[..64].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_scalar_and_vector_writes() {
        let mut block = UniformBlock::new(32);
        block
            .write("s", &slot(12, UniformKind::Scalar), 2.5.into())
            .unwrap();
        block
            .write("v", &slot(16, UniformKind::Vec2), Vec2::new(0.25, 0.75).into())
            .unwrap();

        let f = floats(block.as_bytes());
        assert_eq!(f[3], 2.5);
        assert_eq!(&f[4..6], &[0.25, 0.75]);
    }

    #[test]
    fn test_mismatched_tag_is_rejected() {
        let mut block = UniformBlock::new(64);
        let err = block
            .write("light", &slot(0, UniformKind::Vec3), UniformValue::Vec4(Vec4::ONE))
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnsupportedUniformType {
                given: UniformKind::Vec4,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_declaration_is_rejected() {
        let mut block = UniformBlock::new(64);
        let int_slot = UniformSlot {
            offset: 0,
            kind: None,
            declared: "i32".into(),
        };
        assert!(block.write("count", &int_slot, 1.0.into()).is_err());
    }

    #[test]
    fn test_dirty_flag() {
        let mut block = UniformBlock::new(16);
        assert!(block.take_dirty());
        assert!(!block.take_dirty());
        block
            .write("s", &slot(0, UniformKind::Scalar), 1.0.into())
            .unwrap();
        assert!(block.take_dirty());
    }
}
