//! Typed access to the GLB binary payload.
//!
//! Reading resolves accessor → buffer view → byte range and decodes the
//! little-endian components. Writing goes through [`PayloadBuffer::append`],
//! the only way the payload grows, which keeps every new region 4-byte
//! aligned and disjoint from earlier ones.

use super::document::{GltfAccessor, GltfBufferView, GltfDocument};
use crate::error::{Error, Result};

/// `ARRAY_BUFFER` buffer-view target, used for vertex attributes.
pub const TARGET_ARRAY_BUFFER: u32 = 34962;

/// Alignment of every appended region and of the finished payload.
pub const PAYLOAD_ALIGNMENT: usize = 4;

/// glTF `componentType` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::I8),
            5121 => Some(Self::U8),
            5122 => Some(Self::I16),
            5123 => Some(Self::U16),
            5125 => Some(Self::U32),
            5126 => Some(Self::F32),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
        }
    }

    /// Width of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }

    /// Decode one little-endian component, applying glTF normalization rules
    /// for integer types when `normalized` is set.
    fn decode(self, bytes: &[u8], normalized: bool) -> f32 {
        match self {
            Self::I8 => {
                let v = f32::from(bytes[0] as i8);
                if normalized { (v / 127.0).max(-1.0) } else { v }
            }
            Self::U8 => {
                let v = f32::from(bytes[0]);
                if normalized { v / 255.0 } else { v }
            }
            Self::I16 => {
                let v = f32::from(i16::from_le_bytes([bytes[0], bytes[1]]));
                if normalized { (v / 32767.0).max(-1.0) } else { v }
            }
            Self::U16 => {
                let v = f32::from(u16::from_le_bytes([bytes[0], bytes[1]]));
                if normalized { v / 65535.0 } else { v }
            }
            Self::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            Self::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

/// glTF accessor `type`: the element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl AccessorShape {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat4 => "MAT4",
        }
    }

    /// Number of components per element.
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat4 => 16,
        }
    }
}

/// Decoded accessor contents, one entry per element.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorData {
    Scalar(Vec<f32>),
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
    Mat4(Vec<[f32; 16]>),
}

impl AccessorData {
    pub fn shape(&self) -> AccessorShape {
        match self {
            Self::Scalar(_) => AccessorShape::Scalar,
            Self::Vec2(_) => AccessorShape::Vec2,
            Self::Vec3(_) => AccessorShape::Vec3,
            Self::Vec4(_) => AccessorShape::Vec4,
            Self::Mat4(_) => AccessorShape::Mat4,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
            Self::Mat4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_flat(shape: AccessorShape, flat: &[f32]) -> Self {
        fn tuples<const N: usize>(flat: &[f32]) -> Vec<[f32; N]> {
            flat.chunks_exact(N)
                .map(|c| {
                    let mut out = [0.0; N];
                    out.copy_from_slice(c);
                    out
                })
                .collect()
        }

        match shape {
            AccessorShape::Scalar => Self::Scalar(flat.to_vec()),
            AccessorShape::Vec2 => Self::Vec2(tuples(flat)),
            AccessorShape::Vec3 => Self::Vec3(tuples(flat)),
            AccessorShape::Vec4 => Self::Vec4(tuples(flat)),
            AccessorShape::Mat4 => Self::Mat4(tuples(flat)),
        }
    }
}

/// Read and decode accessor `index` from the payload.
///
/// Honors the accessor's `byteOffset` and the view's `byteStride`. Matrix
/// column padding rules for 1- and 2-byte MAT2/MAT3 do not apply since only
/// MAT4 is supported.
pub fn read_accessor(doc: &GltfDocument, payload: &[u8], index: usize) -> Result<AccessorData> {
    let accessor = doc.accessors.get(index).ok_or_else(|| Error::DanglingIndex {
        referrer: "read request".to_string(),
        kind: "accessor",
        index,
        len: doc.accessors.len(),
    })?;

    let component = ComponentType::from_code(accessor.component_type).ok_or(
        Error::UnsupportedComponentType {
            accessor: index,
            code: accessor.component_type,
        },
    )?;
    let shape = AccessorShape::parse(&accessor.accessor_type).ok_or_else(|| {
        Error::UnsupportedAccessorType {
            accessor: index,
            shape: accessor.accessor_type.clone(),
        }
    })?;

    let view_idx = accessor
        .buffer_view
        .ok_or(Error::AccessorMissingBufferView { accessor: index })?;
    let view = doc.buffer_views.get(view_idx).ok_or_else(|| Error::DanglingIndex {
        referrer: format!("accessor {index}"),
        kind: "bufferView",
        index: view_idx,
        len: doc.buffer_views.len(),
    })?;
    let external = doc.buffers.get(view.buffer).is_some_and(|b| b.uri.is_some());
    if view.buffer != 0 || external {
        return Err(Error::ExternalBuffer {
            accessor: index,
            buffer: view.buffer,
        });
    }

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|&end| end <= payload.len())
        .ok_or(Error::AccessorOutOfBounds {
            accessor: index,
            start: view.byte_offset,
            end: view.byte_offset.saturating_add(view.byte_length),
            available: payload.len(),
        })?;
    let region = &payload[view.byte_offset..view_end];

    let element_size = component.size() * shape.components();
    // A zero stride means tightly packed, as in glTF 1.0 exporters.
    let stride = view.byte_stride.filter(|&s| s > 0).unwrap_or(element_size);
    if let Some(last) = accessor.count.checked_sub(1) {
        let end = stride
            .checked_mul(last)
            .and_then(|span| span.checked_add(element_size))
            .and_then(|span| span.checked_add(accessor.byte_offset));
        if end.is_none_or(|end| end > region.len()) {
            return Err(Error::AccessorOutOfBounds {
                accessor: index,
                start: view.byte_offset.saturating_add(accessor.byte_offset),
                end: end.map_or(usize::MAX, |end| view.byte_offset.saturating_add(end)),
                available: view_end,
            });
        }
    }

    // Bounded by the region length now that the last element fits.
    let mut flat = Vec::with_capacity(accessor.count * shape.components());
    for element in 0..accessor.count {
        let start = accessor.byte_offset + element * stride;
        for bytes in region[start..start + element_size].chunks_exact(component.size()) {
            flat.push(component.decode(bytes, accessor.normalized));
        }
    }

    Ok(AccessorData::from_flat(shape, &flat))
}

/// A value type that can be appended to the payload.
pub trait Component: Copy {
    const TYPE: ComponentType;

    fn write_le(self, out: &mut Vec<u8>);

    fn to_f32(self) -> f32;
}

macro_rules! impl_component {
    ($ty:ty, $variant:ident) => {
        impl Component for $ty {
            const TYPE: ComponentType = ComponentType::$variant;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn to_f32(self) -> f32 {
                self as f32
            }
        }
    };
}

impl_component!(i8, I8);
impl_component!(u8, U8);
impl_component!(i16, I16);
impl_component!(u16, U16);
impl_component!(u32, U32);

impl Component for f32 {
    const TYPE: ComponentType = ComponentType::F32;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn to_f32(self) -> f32 {
        self
    }
}

/// A freshly appended byte range plus the accessor describing it.
///
/// The accessor's `buffer_view` is left unset; [`AppendedRegion::insert`]
/// wires both records into a document.
#[derive(Debug, Clone)]
pub struct AppendedRegion {
    pub buffer_view: GltfBufferView,
    pub accessor: GltfAccessor,
}

impl AppendedRegion {
    /// Push the view and accessor into `doc`, returning the accessor index.
    pub fn insert(self, doc: &mut GltfDocument) -> usize {
        let view_idx = doc.push_buffer_view(self.buffer_view);
        doc.push_accessor(GltfAccessor {
            buffer_view: Some(view_idx),
            ..self.accessor
        })
    }
}

/// The growing GLB binary payload (buffer 0).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadBuffer {
    bytes: Vec<u8>,
}

impl PayloadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    /// Zero-pad the end of the payload to `alignment`.
    pub(crate) fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.bytes.len() % alignment)) % alignment;
        self.bytes.extend(std::iter::repeat_n(0u8, padding));
    }

    /// Append `values` as `shape` elements of `T`'s component type.
    ///
    /// Scalar regions carry `min`/`max`, as required for animation inputs.
    pub fn append<T: Component>(&mut self, values: &[T], shape: AccessorShape) -> Result<AppendedRegion> {
        let per_element = shape.components();
        if values.len() % per_element != 0 {
            return Err(Error::RaggedValues {
                len: values.len(),
                shape: shape.as_str(),
            });
        }

        self.align(PAYLOAD_ALIGNMENT);
        let byte_offset = self.bytes.len();
        for &v in values {
            v.write_le(&mut self.bytes);
        }
        let byte_length = self.bytes.len() - byte_offset;

        let (min, max) = if shape == AccessorShape::Scalar && !values.is_empty() {
            let (lo, hi) = values.iter().fold((f32::MAX, f32::MIN), |(lo, hi), v| {
                let v = v.to_f32();
                (lo.min(v), hi.max(v))
            });
            (Some(vec![f64::from(lo)]), Some(vec![f64::from(hi)]))
        } else {
            (None, None)
        };

        Ok(AppendedRegion {
            buffer_view: GltfBufferView {
                buffer: 0,
                byte_offset,
                byte_length,
                ..GltfBufferView::default()
            },
            accessor: GltfAccessor {
                component_type: T::TYPE.code(),
                count: values.len() / per_element,
                accessor_type: shape.as_str().to_string(),
                min,
                max,
                ..GltfAccessor::default()
            },
        })
    }

    /// Append a vertex attribute: a tightly packed `ARRAY_BUFFER` view with
    /// an explicit stride.
    pub fn append_vertex_attribute<T: Component>(
        &mut self,
        values: &[T],
        shape: AccessorShape,
    ) -> Result<AppendedRegion> {
        let mut region = self.append(values, shape)?;
        region.buffer_view.byte_stride = Some(T::TYPE.size() * shape.components());
        region.buffer_view.target = Some(TARGET_ARRAY_BUFFER);
        Ok(region)
    }
}

impl From<Vec<u8>> for PayloadBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}
