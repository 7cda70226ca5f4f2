//! Dataset loading with column projection (CSV or Parquet)

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch};
use arrow::compute::{cast, concat_batches};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tracing::{debug, info};

use crate::dataset::{Dataset, ListingTable};
use crate::error::LoadError;
use crate::listing::{listing_schema, NAME};

/// Rows decoded per batch
pub const BATCH_SIZE: usize = 8192;

/// Load the listings table.
///
/// The format is picked from the file extension. Columns beyond the ten the
/// listing layout needs are skipped while decoding.
pub fn load(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (schema, batches) = match extension.as_str() {
        "csv" => read_csv(path)?,
        "parquet" => read_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };
    debug!(batches = batches.len(), "decoded dataset file");

    let schema = batches.first().map(RecordBatch::schema).unwrap_or(schema);
    let batch = normalize(&concat_batches(&schema, &batches)?)?;
    let dataset = Dataset::from_batch(batch)?;

    info!(
        path = %path.display(),
        listings = dataset.len(),
        neighbourhoods = dataset.neighbourhoods().len(),
        room_types = dataset.room_types().len(),
        "loaded listings"
    );
    Ok(dataset)
}

/// Positions of the required columns among `names`, in file order
fn projection<'a>(names: impl Iterator<Item = &'a str> + Clone) -> Result<Vec<usize>, LoadError> {
    let mut indices = listing_schema()
        .fields()
        .iter()
        .map(|field| {
            names
                .clone()
                .position(|name| name == field.name())
                .ok_or_else(|| LoadError::MissingColumn(field.name().clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    indices.sort_unstable();
    Ok(indices)
}

fn read_csv(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), LoadError> {
    let mut file = File::open(path)?;

    // Header only: we supply the types of the columns we keep
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    file.seek(SeekFrom::Start(0))?;

    let target = listing_schema();
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| match target.field_with_name(f.name()) {
            Ok(typed) => Field::new(f.name(), typed.data_type().clone(), true),
            Err(_) => Field::new(f.name(), DataType::Utf8, true),
        })
        .collect();
    let indices = projection(fields.iter().map(|f| f.name().as_str()))?;
    let schema = Schema::new(fields);
    let projected = Arc::new(schema.project(&indices)?);

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .with_projection(indices)
        .build(file)?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((projected, batches))
}

fn read_parquet(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>), LoadError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let arrow_schema = builder.schema().clone();
    let indices = projection(arrow_schema.fields().iter().map(|f| f.name().as_str()))?;
    let projected = Arc::new(arrow_schema.project(&indices)?);
    let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

    let reader = builder
        .with_projection(mask)
        .with_batch_size(BATCH_SIZE)
        .build()?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((projected, batches))
}

/// Cast the decoded columns to the canonical layout, rejecting blanks
/// anywhere but `name`
fn normalize(batch: &RecordBatch) -> Result<RecordBatch, LoadError> {
    let target = listing_schema();
    let columns = target
        .fields()
        .iter()
        .map(|field| -> Result<ArrayRef, LoadError> {
            let column = batch
                .column_by_name(field.name())
                .ok_or_else(|| LoadError::MissingColumn(field.name().clone()))?;
            let column = cast(column, field.data_type())?;

            if field.name() != NAME && column.null_count() > 0 {
                let row = (0..column.len()).find(|&i| column.is_null(i)).unwrap_or(0);
                return Err(LoadError::NullValue {
                    column: field.name().clone(),
                    row,
                });
            }
            Ok(column)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecordBatch::try_new(target, columns)?)
}
