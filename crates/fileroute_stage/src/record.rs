//! Field values, immutable records and the reusable record builder.

use std::sync::Arc;

use crate::shape::{EnumFieldType, RecordShape};
use crate::spec::ShapeError;

/// One field value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl EnumFieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value as text; blobs and nulls have no text form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bytes(_) => None,
            Self::Bool(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Double(v) => Some(v.to_string()),
            Self::Text(v) => Some(v.clone()),
        }
    }

    pub fn is_compatible_with(&self, field_type: EnumFieldType) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => field_type == EnumFieldType::Bool,
            Self::Int(_) => field_type == EnumFieldType::Int64,
            Self::Double(_) => field_type == EnumFieldType::Double,
            Self::Text(_) => field_type.is_textual(),
            Self::Bytes(_) => field_type == EnumFieldType::Blob,
        }
    }
}

impl From<&str> for EnumFieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Option<&str>> for EnumFieldValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

/// A finalized record bound to the shape it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: Arc<RecordShape>,
    values: Vec<EnumFieldValue>,
}

impl Record {
    pub fn new(shape: Arc<RecordShape>, values: Vec<EnumFieldValue>) -> Result<Self, ShapeError> {
        if values.len() != shape.len() {
            return Err(ShapeError::ValueCount {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    pub fn values(&self) -> &[EnumFieldValue] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&EnumFieldValue> {
        self.values.get(index)
    }

    pub fn value_by_name(&self, name: &str) -> Option<&EnumFieldValue> {
        self.shape.index_of(name).and_then(|idx| self.value(idx))
    }

    pub fn into_values(self) -> Vec<EnumFieldValue> {
        self.values
    }
}

/// Reusable buffer for building outgoing records.
///
/// `finalize` moves the populated values out and leaves a fresh null buffer,
/// so no finalized record shares storage with the next one.
#[derive(Debug)]
pub struct RecordBuilder {
    shape: Arc<RecordShape>,
    values: Vec<EnumFieldValue>,
}

impl RecordBuilder {
    pub fn new(shape: Arc<RecordShape>) -> Self {
        let values = vec![EnumFieldValue::Null; shape.len()];
        Self { shape, values }
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    /// Set every value back to null.
    pub fn reset(&mut self) {
        self.values.clear();
        self.values.resize(self.shape.len(), EnumFieldValue::Null);
    }

    /// Returns `false` when `index` is outside the shape.
    pub fn set(&mut self, index: usize, value: EnumFieldValue) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&EnumFieldValue> {
        self.values.get(index)
    }

    pub fn finalize(&mut self) -> Record {
        let values = std::mem::replace(
            &mut self.values,
            vec![EnumFieldValue::Null; self.shape.len()],
        );
        Record {
            shape: Arc::clone(&self.shape),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{EnumFieldValue, Record, RecordBuilder};
    use crate::shape::{EnumFieldType, RecordShape, SpecField};
    use crate::spec::ShapeError;

    fn shape_two() -> Arc<RecordShape> {
        Arc::new(
            RecordShape::new(vec![
                SpecField::new("name", EnumFieldType::String, None),
                SpecField::new("count", EnumFieldType::Int64, None),
            ])
            .expect("shape"),
        )
    }

    #[test]
    fn record_rejects_wrong_value_count() {
        let err = Record::new(shape_two(), vec![EnumFieldValue::Null]).expect_err("must fail");
        assert_eq!(
            err,
            ShapeError::ValueCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn builder_finalize_leaves_fresh_buffer() {
        let mut builder = RecordBuilder::new(shape_two());
        assert!(builder.set(0, EnumFieldValue::from("a")));
        assert!(builder.set(1, EnumFieldValue::Int(3)));
        assert!(!builder.set(2, EnumFieldValue::Int(9)));

        let record = builder.finalize();
        assert_eq!(
            record.values(),
            &[EnumFieldValue::from("a"), EnumFieldValue::Int(3)]
        );
        assert_eq!(builder.get(0), Some(&EnumFieldValue::Null));
        assert_eq!(record.value_by_name("count"), Some(&EnumFieldValue::Int(3)));
    }

    #[test]
    fn value_text_rendering() {
        assert_eq!(EnumFieldValue::Int(7).to_text(), Some("7".to_string()));
        assert_eq!(EnumFieldValue::Null.to_text(), None);
        assert_eq!(EnumFieldValue::Bytes(vec![1]).to_text(), None);
        assert!(EnumFieldValue::from("x").is_compatible_with(EnumFieldType::WString));
        assert!(!EnumFieldValue::Int(1).is_compatible_with(EnumFieldType::Double));
    }
}
