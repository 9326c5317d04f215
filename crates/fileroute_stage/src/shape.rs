//! Record shapes, field descriptors and resolved field references.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::record::{EnumFieldValue, Record, RecordBuilder};
use crate::spec::ShapeError;

////////////////////////////////////////////////////////////////////////////////
// #region FieldDescriptors

/// Semantic type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFieldType {
    Bool,
    Int64,
    Double,
    String,
    WString,
    Date,
    DateTime,
    Blob,
}

impl EnumFieldType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Double => "double",
            Self::String => "string",
            Self::WString => "wstring",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Blob => "blob",
        }
    }

    /// Types whose values are carried as text.
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            Self::String | Self::WString | Self::Date | Self::DateTime
        )
    }
}

impl fmt::Display for EnumFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named, typed field of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecField {
    pub name: String,
    pub field_type: EnumFieldType,
    /// Optional size bound; characters for textual types, bytes for blobs.
    pub size: Option<usize>,
}

impl SpecField {
    pub fn new(name: impl Into<String>, field_type: EnumFieldType, size: Option<usize>) -> Self {
        Self {
            name: name.into(),
            field_type,
            size,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordShape

/// Ordered set of uniquely named fields. Immutable once built.
#[derive(Debug, Clone)]
pub struct RecordShape {
    fields: Vec<SpecField>,
    dict_index: HashMap<String, usize>,
}

impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for RecordShape {}

impl RecordShape {
    /// Build a shape, rejecting duplicate field names.
    pub fn new(fields: Vec<SpecField>) -> Result<Self, ShapeError> {
        let mut dict_index = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if dict_index.insert(field.name.clone(), idx).is_some() {
                return Err(ShapeError::DuplicateFieldName(field.name.clone()));
            }
        }
        Ok(Self { fields, dict_index })
    }

    pub fn fields(&self) -> &[SpecField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&SpecField> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.dict_index.get(name).copied()
    }

    /// Resolve `name` into a reference bound to this shape.
    pub fn resolve(self: &Arc<Self>, name: &str) -> Option<FieldRef> {
        self.index_of(name).map(|index| FieldRef {
            shape: Arc::clone(self),
            index,
        })
    }
}

/// Append one field to `shape_in`, keeping every existing field in place.
///
/// Fails when `name` already exists in the input shape.
pub fn derive_output_shape(
    shape_in: &RecordShape,
    name: &str,
    field_type: EnumFieldType,
    size: usize,
) -> Result<RecordShape, ShapeError> {
    if shape_in.index_of(name).is_some() {
        return Err(ShapeError::FieldNameCollision(name.to_string()));
    }
    let mut l_fields = Vec::with_capacity(shape_in.len() + 1);
    l_fields.extend_from_slice(shape_in.fields());
    l_fields.push(SpecField::new(name, field_type, Some(size)));
    RecordShape::new(l_fields)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FieldRef

/// A field resolved against one specific shape.
///
/// Only records built from that shape can be read or written through it.
#[derive(Debug, Clone)]
pub struct FieldRef {
    shape: Arc<RecordShape>,
    index: usize,
}

impl FieldRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn spec(&self) -> &SpecField {
        &self.shape.fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    pub fn is_bound_to(&self, shape: &Arc<RecordShape>) -> bool {
        Arc::ptr_eq(&self.shape, shape) || *self.shape == **shape
    }

    /// Read the field as text. `None` for null values or foreign records.
    pub fn get_as_string(&self, record: &Record) -> Option<String> {
        if !self.is_bound_to(record.shape()) {
            return None;
        }
        record.value(self.index).and_then(EnumFieldValue::to_text)
    }

    /// Write text into a builder, truncated to the field's size bound.
    ///
    /// Returns `false` when the builder belongs to another shape.
    pub fn set_from_string(&self, builder: &mut RecordBuilder, value: &str) -> bool {
        if !self.is_bound_to(builder.shape()) {
            return false;
        }
        let txt = match self.spec().size {
            Some(n_size_max) => truncate_chars(value, n_size_max),
            None => value,
        };
        builder.set(self.index, EnumFieldValue::Text(txt.to_string()))
    }
}

fn truncate_chars(value: &str, n_chars_max: usize) -> &str {
    match value.char_indices().nth(n_chars_max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
