//! Vectorized derived columns using Arrow kernels

use arrow::array::{Float64Array, RecordBatch, Scalar, AsArray};
use arrow::compute::cast;
use arrow::compute::kernels::numeric;
use arrow::datatypes::{DataType, Float64Type};
use arrow::error::ArrowError;

use crate::listing::AVAILABILITY_365;
use crate::utils::i64_column;

/// Fixed denominator for the yearly availability ratio, whatever window
/// a listing was actually tracked over
pub const DAYS_PER_YEAR: f64 = 365.0;

/// availability_365 / 365 for every row
pub fn availability_ratio(batch: &RecordBatch) -> Result<Float64Array, ArrowError> {
    let days = i64_column(batch, AVAILABILITY_365)?;
    let days = cast(days, &DataType::Float64)?;

    let year = Scalar::new(Float64Array::from(vec![DAYS_PER_YEAR]));
    let ratio = numeric::div(&days, &year)?;

    Ok(ratio.as_primitive::<Float64Type>().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::listing_schema;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_availability_ratio() {
        let schema = listing_schema();
        let n = 3;
        let columns: Vec<ArrayRef> = schema
            .fields()
            .iter()
            .map(|f| -> ArrayRef {
                match f.data_type() {
                    DataType::Int64 if f.name() == AVAILABILITY_365 => {
                        Arc::new(Int64Array::from(vec![0, 365, 256]))
                    }
                    DataType::Int64 => Arc::new(Int64Array::from(vec![1; n])),
                    DataType::Float64 => Arc::new(Float64Array::from(vec![1.0; n])),
                    _ => Arc::new(StringArray::from(vec!["x"; n])),
                }
            })
            .collect();
        let batch = RecordBatch::try_new(schema, columns).unwrap();

        let ratio = availability_ratio(&batch).unwrap();
        assert_eq!(ratio.value(0), 0.0);
        assert_eq!(ratio.value(1), 1.0);
        assert!(ratio.value(2) > 0.70);
    }
}
