//! Listing records and the canonical columnar layout they are stored in

use std::sync::{Arc, OnceLock};

use arrow_array::{Array, ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::utils::{f64_column, i64_column, str_column};

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const HOST_ID: &str = "host_id";
pub const NEIGHBOURHOOD: &str = "neighbourhood";
pub const ROOM_TYPE: &str = "room_type";
pub const PRICE: &str = "price";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const NUMBER_OF_REVIEWS: &str = "number_of_reviews";
pub const AVAILABILITY_365: &str = "availability_365";

/// The four room categories, in alphabetical order
pub const ROOM_TYPES: [&str; 4] = ["Entire home/apt", "Hotel room", "Private room", "Shared room"];

/// Schema every loaded dataset is normalised to.
///
/// Only `name` may be null; listings without a title are still listings.
pub fn listing_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new(ID, DataType::Int64, false),
                Field::new(NAME, DataType::Utf8, true),
                Field::new(HOST_ID, DataType::Int64, false),
                Field::new(NEIGHBOURHOOD, DataType::Utf8, false),
                Field::new(ROOM_TYPE, DataType::Utf8, false),
                Field::new(PRICE, DataType::Float64, false),
                Field::new(LATITUDE, DataType::Float64, false),
                Field::new(LONGITUDE, DataType::Float64, false),
                Field::new(NUMBER_OF_REVIEWS, DataType::Int64, false),
                Field::new(AVAILABILITY_365, DataType::Int64, false),
            ]))
        })
        .clone()
}

/// One rentable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub name: String,
    pub host_id: i64,
    pub neighbourhood: String,
    pub room_type: String,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub number_of_reviews: i64,
    pub availability_365: i64,
}

impl Listing {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Build a batch in the canonical layout from row records
pub fn batch_from_listings(listings: &[Listing]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.id))),
        Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.name.as_str()))),
        Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.host_id))),
        Arc::new(StringArray::from_iter_values(
            listings.iter().map(|l| l.neighbourhood.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(listings.iter().map(|l| l.room_type.as_str()))),
        Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.price))),
        Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.latitude))),
        Arc::new(Float64Array::from_iter_values(listings.iter().map(|l| l.longitude))),
        Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.number_of_reviews))),
        Arc::new(Int64Array::from_iter_values(listings.iter().map(|l| l.availability_365))),
    ];
    RecordBatch::try_new(listing_schema(), columns)
}

/// Materialise every row of a canonical batch
pub fn listings_from_batch(batch: &RecordBatch) -> Result<Vec<Listing>, ArrowError> {
    let id = i64_column(batch, ID)?;
    let name = str_column(batch, NAME)?;
    let host_id = i64_column(batch, HOST_ID)?;
    let neighbourhood = str_column(batch, NEIGHBOURHOOD)?;
    let room_type = str_column(batch, ROOM_TYPE)?;
    let price = f64_column(batch, PRICE)?;
    let latitude = f64_column(batch, LATITUDE)?;
    let longitude = f64_column(batch, LONGITUDE)?;
    let reviews = i64_column(batch, NUMBER_OF_REVIEWS)?;
    let availability = i64_column(batch, AVAILABILITY_365)?;

    let listings = (0..batch.num_rows())
        .map(|i| Listing {
            id: id.value(i),
            name: if name.is_null(i) { String::new() } else { name.value(i).to_string() },
            host_id: host_id.value(i),
            neighbourhood: neighbourhood.value(i).to_string(),
            room_type: room_type.value(i).to_string(),
            price: price.value(i),
            latitude: latitude.value(i),
            longitude: longitude.value(i),
            number_of_reviews: reviews.value(i),
            availability_365: availability.value(i),
        })
        .collect();
    Ok(listings)
}
