//! Typed column access on record batches

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::error::ArrowError;

/// Look up a column by name and downcast it to the concrete array type
pub fn typed_column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, ArrowError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| ArrowError::SchemaError(format!("Column {} not found", name)))?;

    col.as_any().downcast_ref::<A>().ok_or_else(|| {
        ArrowError::SchemaError(format!(
            "Column {} has type {}, not {}",
            name,
            col.data_type(),
            std::any::type_name::<A>()
        ))
    })
}

pub fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array, ArrowError> {
    typed_column::<Float64Array>(batch, name)
}

pub fn i64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, ArrowError> {
    typed_column::<Int64Array>(batch, name)
}

pub fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, ArrowError> {
    typed_column::<StringArray>(batch, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("price", DataType::Float64, false),
            Field::new("room_type", DataType::Utf8, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from(vec![40.0, 90.0])),
                Arc::new(StringArray::from(vec!["Private room", "Hotel room"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_typed_lookup() {
        let batch = batch();
        assert_eq!(f64_column(&batch, "price").unwrap().value(1), 90.0);
        assert_eq!(str_column(&batch, "room_type").unwrap().value(0), "Private room");
    }

    #[test]
    fn test_missing_and_mistyped_columns() {
        let batch = batch();
        assert!(f64_column(&batch, "latitude").is_err());
        assert!(i64_column(&batch, "price").is_err());
    }
}
