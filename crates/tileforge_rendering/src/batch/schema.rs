//! Runtime description of an instance record's attribute layout.

use crate::error::RenderError;

/// Format of one per-instance attribute field.
///
/// A `Mat4` occupies four consecutive shader locations, one `vec4`
/// column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// A 4x4 float matrix, column major.
    Mat4,
}

impl AttributeFormat {
    /// Byte size of the field inside the instance record.
    #[must_use]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
            Self::Mat4 => 64,
        }
    }

    /// Number of shader locations the field consumes.
    #[must_use]
    pub const fn location_count(self) -> u32 {
        match self {
            Self::Mat4 => 4,
            _ => 1,
        }
    }
}

/// Ordered list of per-instance attribute fields, resolvable into a
/// GPU vertex layout once shader locations are assigned.
///
/// Field offsets follow record order with no implicit padding; the
/// record struct pushed by callers must match exactly.
pub struct InstanceSchema {
    fields: Vec<AttributeFormat>,
    stride: usize,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl InstanceSchema {
    /// Builds a schema from an ordered field list.
    ///
    /// # Errors
    ///
    /// [`RenderError::EmptySchema`] if `fields` is empty.
    pub fn new(fields: &[AttributeFormat]) -> Result<Self, RenderError> {
        if fields.is_empty() {
            return Err(RenderError::EmptySchema);
        }
        let stride = fields.iter().map(|field| field.byte_size()).sum();
        Ok(Self {
            fields: fields.to_vec(),
            stride,
            attributes: Vec::new(),
        })
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Byte stride of one full instance record.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Whether [`assign_locations`](Self::assign_locations) ran.
    #[must_use]
    pub fn locations_assigned(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Assigns one shader location per field, in field order. A
    /// `Mat4` field takes its given location plus the three following
    /// ones, so callers still pass exactly one location per field.
    ///
    /// # Errors
    ///
    /// [`RenderError::AttribLocationCount`] if the count differs from
    /// the field count. The schema is unchanged in that case.
    pub fn assign_locations(&mut self, locations: &[u32]) -> Result<(), RenderError> {
        if locations.len() != self.fields.len() {
            return Err(RenderError::AttribLocationCount {
                expected: self.fields.len(),
                provided: locations.len(),
            });
        }

        let mut attributes = Vec::new();
        let mut offset = 0u64;
        for (field, &location) in self.fields.iter().zip(locations) {
            match field {
                AttributeFormat::Mat4 => {
                    for column in 0..4 {
                        attributes.push(wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: offset + u64::from(column) * 16,
                            shader_location: location + column,
                        });
                    }
                }
                AttributeFormat::Float32 => attributes.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset,
                    shader_location: location,
                }),
                AttributeFormat::Float32x2 => attributes.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset,
                    shader_location: location,
                }),
                AttributeFormat::Float32x3 => attributes.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset,
                    shader_location: location,
                }),
                AttributeFormat::Float32x4 => attributes.push(wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset,
                    shader_location: location,
                }),
            }
            offset += field.byte_size() as u64;
        }
        self.attributes = attributes;
        Ok(())
    }

    /// The per-instance vertex buffer layout for pipeline creation.
    ///
    /// # Panics
    ///
    /// If locations were never assigned.
    #[must_use]
    pub fn vertex_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        assert!(
            self.locations_assigned(),
            "instance schema has no shader locations; call assign_locations first"
        );
        wgpu::VertexBufferLayout {
            array_stride: self.stride as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &self.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_sums_field_sizes() {
        let schema =
            InstanceSchema::new(&[AttributeFormat::Float32x3, AttributeFormat::Mat4]).unwrap();
        assert_eq!(schema.stride(), 12 + 64);
        assert_eq!(schema.field_count(), 2);
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        assert!(matches!(
            InstanceSchema::new(&[]),
            Err(RenderError::EmptySchema)
        ));
    }

    #[test]
    fn test_mat4_expands_to_four_column_locations() {
        let mut schema =
            InstanceSchema::new(&[AttributeFormat::Float32x3, AttributeFormat::Mat4]).unwrap();
        schema.assign_locations(&[2, 3]).unwrap();

        let layout = schema.vertex_layout();
        assert_eq!(layout.array_stride, 76);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);

        let locations: Vec<u32> = layout
            .attributes
            .iter()
            .map(|attr| attr.shader_location)
            .collect();
        assert_eq!(locations, vec![2, 3, 4, 5, 6]);

        let offsets: Vec<u64> = layout.attributes.iter().map(|attr| attr.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28, 44, 60]);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn test_location_count_mismatch_is_rejected() {
        let mut schema =
            InstanceSchema::new(&[AttributeFormat::Float32x3, AttributeFormat::Mat4]).unwrap();
        let err = schema.assign_locations(&[2]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::AttribLocationCount { expected: 2, provided: 1 }
        ));
        assert!(!schema.locations_assigned());
    }
}
