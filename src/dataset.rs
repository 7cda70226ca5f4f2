//! The immutable in-memory listings table

use std::collections::BTreeSet;

use arrow::array::RecordBatch;
use arrow::error::ArrowError;

use crate::listing::{batch_from_listings, listings_from_batch, Listing, NEIGHBOURHOOD, ROOM_TYPE};
use crate::utils::str_column;

/// Anything backed by a batch in the canonical listing layout.
///
/// Aggregations accept either the whole dataset or a filtered view.
pub trait ListingTable {
    fn batch(&self) -> &RecordBatch;

    fn len(&self) -> usize {
        self.batch().num_rows()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn listings(&self) -> Result<Vec<Listing>, ArrowError> {
        listings_from_batch(self.batch())
    }
}

/// Every listing for the region, loaded once and never mutated.
///
/// Cloning is cheap: the column buffers are reference counted.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    neighbourhoods: Vec<String>,
    room_types: Vec<String>,
}

impl Dataset {
    /// Wrap a batch already in the canonical layout
    pub fn from_batch(batch: RecordBatch) -> Result<Self, ArrowError> {
        let neighbourhoods = distinct_sorted(&batch, NEIGHBOURHOOD)?;
        let room_types = distinct_sorted(&batch, ROOM_TYPE)?;
        Ok(Self {
            batch,
            neighbourhoods,
            room_types,
        })
    }

    pub fn from_listings(listings: &[Listing]) -> Result<Self, ArrowError> {
        Self::from_batch(batch_from_listings(listings)?)
    }

    /// Distinct neighbourhood names, alphabetical
    pub fn neighbourhoods(&self) -> &[String] {
        &self.neighbourhoods
    }

    /// Distinct room types, alphabetical
    pub fn room_types(&self) -> &[String] {
        &self.room_types
    }
}

impl ListingTable for Dataset {
    fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

fn distinct_sorted(batch: &RecordBatch, column: &str) -> Result<Vec<String>, ArrowError> {
    let values = str_column(batch, column)?;
    let distinct: BTreeSet<&str> = values.iter().flatten().collect();
    Ok(distinct.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i64, neighbourhood: &str, room_type: &str) -> Listing {
        Listing {
            id,
            name: String::new(),
            host_id: 1,
            neighbourhood: neighbourhood.to_string(),
            room_type: room_type.to_string(),
            price: 50.0,
            latitude: 51.5,
            longitude: -0.1,
            number_of_reviews: 0,
            availability_365: 0,
        }
    }

    #[test]
    fn test_distinct_lists_sorted() {
        let dataset = Dataset::from_listings(&[
            listing(1, "Westminster", "Private room"),
            listing(2, "Camden", "Entire home/apt"),
            listing(3, "Westminster", "Entire home/apt"),
            listing(4, "Barnet", "Shared room"),
        ])
        .unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.neighbourhoods(), ["Barnet", "Camden", "Westminster"]);
        assert_eq!(
            dataset.room_types(),
            ["Entire home/apt", "Private room", "Shared room"]
        );
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::from_listings(&[]).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.neighbourhoods().is_empty());
        assert!(dataset.listings().unwrap().is_empty());
    }
}
