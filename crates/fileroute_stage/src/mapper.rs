//! Position mapping from input fields to output fields.

use std::sync::Arc;

use crate::record::{Record, RecordBuilder};
use crate::shape::RecordShape;
use crate::spec::StageError;

/// Input position -> output position for every input field.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    shape_in: Arc<RecordShape>,
    shape_out: Arc<RecordShape>,
    l_pairs: Vec<(usize, usize)>,
}

impl FieldMapper {
    /// Map every input field onto the same-named output field.
    ///
    /// Mapped fields must agree on type; nothing is coerced at copy time.
    pub fn build(
        shape_in: &Arc<RecordShape>,
        shape_out: &Arc<RecordShape>,
    ) -> Result<Self, StageError> {
        let mut l_pairs = Vec::with_capacity(shape_in.len());
        for (idx_in, field_in) in shape_in.fields().iter().enumerate() {
            let Some(idx_out) = shape_out.index_of(&field_in.name) else {
                return Err(StageError::FieldNotFound {
                    name: field_in.name.clone(),
                });
            };
            let field_out = &shape_out.fields()[idx_out];
            if field_out.field_type != field_in.field_type {
                return Err(StageError::IncompatibleFieldType {
                    name: field_in.name.clone(),
                });
            }
            l_pairs.push((idx_in, idx_out));
        }
        Ok(Self {
            shape_in: Arc::clone(shape_in),
            shape_out: Arc::clone(shape_out),
            l_pairs,
        })
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.l_pairs
    }

    /// Copy every mapped value from `record_in` into `builder`.
    pub fn copy(&self, record_in: &Record, builder: &mut RecordBuilder) -> Result<(), StageError> {
        if !shape_matches(&self.shape_in, record_in.shape())
            || !shape_matches(&self.shape_out, builder.shape())
        {
            return Err(StageError::ShapeMismatch);
        }
        for &(idx_in, idx_out) in &self.l_pairs {
            if let Some(value) = record_in.value(idx_in) {
                builder.set(idx_out, value.clone());
            }
        }
        Ok(())
    }
}

fn shape_matches(expected: &Arc<RecordShape>, actual: &Arc<RecordShape>) -> bool {
    Arc::ptr_eq(expected, actual) || **expected == **actual
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FieldMapper;
    use crate::record::{EnumFieldValue, Record, RecordBuilder};
    use crate::shape::{EnumFieldType, RecordShape, SpecField, derive_output_shape};
    use crate::spec::StageError;

    fn shape_in() -> Arc<RecordShape> {
        Arc::new(
            RecordShape::new(vec![
                SpecField::new("id", EnumFieldType::Int64, None),
                SpecField::new("path_src", EnumFieldType::String, Some(255)),
                SpecField::new("ratio", EnumFieldType::Double, None),
            ])
            .expect("shape"),
        )
    }

    #[test]
    fn mapper_is_identity_over_derived_shape() {
        let shape_in = shape_in();
        let shape_out = Arc::new(
            derive_output_shape(&shape_in, "file_result", EnumFieldType::String, 1000)
                .expect("derive"),
        );
        let mapper = FieldMapper::build(&shape_in, &shape_out).expect("mapper");
        assert_eq!(mapper.pairs(), &[(0, 0), (1, 1), (2, 2)]);

        let record_in = Record::new(
            Arc::clone(&shape_in),
            vec![
                EnumFieldValue::Int(42),
                EnumFieldValue::from("/tmp/a"),
                EnumFieldValue::Null,
            ],
        )
        .expect("record");
        let mut builder = RecordBuilder::new(Arc::clone(&shape_out));
        mapper.copy(&record_in, &mut builder).expect("copy");
        let record_out = builder.finalize();
        assert_eq!(&record_out.values()[..3], record_in.values());
        assert_eq!(record_out.values()[3], EnumFieldValue::Null);
    }

    #[test]
    fn mapper_rejects_type_drift() {
        let shape_in = shape_in();
        let shape_out = Arc::new(
            RecordShape::new(vec![
                SpecField::new("id", EnumFieldType::String, None),
                SpecField::new("path_src", EnumFieldType::String, Some(255)),
                SpecField::new("ratio", EnumFieldType::Double, None),
            ])
            .expect("shape"),
        );
        let err = FieldMapper::build(&shape_in, &shape_out).expect_err("must fail");
        assert_eq!(
            err,
            StageError::IncompatibleFieldType {
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn mapper_rejects_foreign_record() {
        let shape_in = shape_in();
        let shape_out = Arc::new(
            derive_output_shape(&shape_in, "file_result", EnumFieldType::String, 1000)
                .expect("derive"),
        );
        let mapper = FieldMapper::build(&shape_in, &shape_out).expect("mapper");
        let shape_foreign = Arc::new(
            RecordShape::new(vec![SpecField::new("x", EnumFieldType::Int64, None)])
                .expect("shape"),
        );
        let record_foreign =
            Record::new(shape_foreign, vec![EnumFieldValue::Int(1)]).expect("record");
        let mut builder = RecordBuilder::new(shape_out);
        assert_eq!(
            mapper.copy(&record_foreign, &mut builder),
            Err(StageError::ShapeMismatch)
        );
    }
}
