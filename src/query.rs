//! Query orchestration - ties together filtering, ordering and summary metrics

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch, UInt32Array};
use arrow::compute::{lexsort_to_indices, take_record_batch, SortColumn};
use arrow::error::ArrowError;
use arrow_schema::SortOptions;
use arrow_select::filter::filter_record_batch;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{report, AggregateReport};
use crate::dataset::{Dataset, ListingTable};
use crate::error::QueryError;
use crate::filter::{build_mask, FilterCriteria};
use crate::listing::{ID, NAME, NEIGHBOURHOOD, PRICE, ROOM_TYPE};
use crate::utils::{f64_column, i64_column, str_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Dataset order, which is ascending listing id
    #[default]
    ById,
    PriceAscending,
    PriceDescending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::ById => "Listing ID Asc.",
            SortOrder::PriceAscending => "Price Lowest to Highest",
            SortOrder::PriceDescending => "Price Highest to Lowest",
        })
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "id" | "by-id" => Ok(SortOrder::ById),
            "price-asc" | "price" => Ok(SortOrder::PriceAscending),
            "price-desc" => Ok(SortOrder::PriceDescending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Listings matching a query, in the requested order.
///
/// Always a subset of the dataset it was computed from.
#[derive(Debug, Clone)]
pub struct FilteredView {
    batch: RecordBatch,
}

/// One line of the listings table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: i64,
    pub name: String,
    pub neighbourhood: String,
    pub room_type: String,
    pub price: f64,
}

impl FilteredView {
    pub fn ids(&self) -> Result<Vec<i64>, ArrowError> {
        Ok(i64_column(&self.batch, ID)?.values().to_vec())
    }

    pub fn rows(&self) -> Result<Vec<TableRow>, ArrowError> {
        let id = i64_column(&self.batch, ID)?;
        let name = str_column(&self.batch, NAME)?;
        let neighbourhood = str_column(&self.batch, NEIGHBOURHOOD)?;
        let room_type = str_column(&self.batch, ROOM_TYPE)?;
        let price = f64_column(&self.batch, PRICE)?;

        Ok((0..self.batch.num_rows())
            .map(|i| TableRow {
                id: id.value(i),
                name: name.is_valid(i).then(|| name.value(i)).unwrap_or_default().to_string(),
                neighbourhood: neighbourhood.value(i).to_string(),
                room_type: room_type.value(i).to_string(),
                price: price.value(i),
            })
            .collect())
    }
}

impl ListingTable for FilteredView {
    fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}

/// Apply every filter in `criteria`, then order the survivors.
///
/// An empty result is a valid answer, not an error.
pub fn filter_and_sort(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    order: SortOrder,
) -> Result<FilteredView, QueryError> {
    let batch = dataset.batch();

    // One boolean per row, true where every criterion holds
    let mask = build_mask(batch, criteria)?;

    // Materialise the surviving rows before reordering them
    let filtered = filter_record_batch(batch, &mask)?;
    debug!(
        matched = filtered.num_rows(),
        total = batch.num_rows(),
        %order,
        "filtered listings"
    );

    Ok(FilteredView {
        batch: sort_batch(filtered, order)?,
    })
}

/// Filter, sort and aggregate in one pass.
///
/// The report describes the view, not the whole dataset.
pub fn compute(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    order: SortOrder,
) -> Result<(FilteredView, AggregateReport), QueryError> {
    let view = filter_and_sort(dataset, criteria, order)?;
    let report = report(&view)?;
    Ok((view, report))
}

/// Price orders break ties by position, so equal prices keep dataset order
fn sort_batch(batch: RecordBatch, order: SortOrder) -> Result<RecordBatch, ArrowError> {
    let descending = match order {
        SortOrder::ById => return Ok(batch),
        SortOrder::PriceAscending => false,
        SortOrder::PriceDescending => true,
    };
    if batch.num_rows() < 2 {
        return Ok(batch);
    }

    // Row position as a secondary key makes the sort stable
    let price: ArrayRef = Arc::new(f64_column(&batch, PRICE)?.clone());
    let position: ArrayRef = Arc::new(UInt32Array::from_iter_values(0..batch.num_rows() as u32));

    // Permutation of row indices, then gather every column through it
    let indices = lexsort_to_indices(
        &[
            SortColumn {
                values: price,
                options: Some(SortOptions {
                    descending,
                    nulls_first: false,
                }),
            },
            SortColumn {
                values: position,
                options: None,
            },
        ],
        None,
    )?;

    take_record_batch(&batch, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AreaSelection;
    use crate::geo::DistanceUnit;
    use crate::listing::{Listing, ROOM_TYPES};

    fn listing(id: i64, price: f64) -> Listing {
        Listing {
            id,
            name: format!("flat {}", id),
            host_id: 100 + id % 3,
            neighbourhood: "Camden".to_string(),
            room_type: "Entire home/apt".to_string(),
            price,
            latitude: 51.5413,
            longitude: -0.1433,
            number_of_reviews: 5,
            availability_365: 200,
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_listings(&[
            listing(1, 120.0),
            listing(2, 80.0),
            listing(3, 120.0),
            listing(4, 300.0),
            listing(5, 80.0),
        ])
        .unwrap()
    }

    fn everything() -> FilterCriteria {
        FilterCriteria::new(AreaSelection::neighbourhoods(["Camden"]), ROOM_TYPES)
    }

    #[test]
    fn test_by_id_keeps_dataset_order() {
        let view = filter_and_sort(&dataset(), &everything(), SortOrder::ById).unwrap();
        assert_eq!(view.ids().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_price_orders_are_stable() {
        let asc = filter_and_sort(&dataset(), &everything(), SortOrder::PriceAscending).unwrap();
        assert_eq!(asc.ids().unwrap(), vec![2, 5, 1, 3, 4]);

        let desc = filter_and_sort(&dataset(), &everything(), SortOrder::PriceDescending).unwrap();
        assert_eq!(desc.ids().unwrap(), vec![4, 1, 3, 2, 5]);
    }

    #[test]
    fn test_orders_mirror_without_ties() {
        let dataset = Dataset::from_listings(&[
            listing(1, 90.0),
            listing(2, 15.0),
            listing(3, 400.0),
            listing(4, 55.0),
        ])
        .unwrap();
        let asc = filter_and_sort(&dataset, &everything(), SortOrder::PriceAscending).unwrap();
        let desc = filter_and_sort(&dataset, &everything(), SortOrder::PriceDescending).unwrap();

        let mut reversed = asc.ids().unwrap();
        reversed.reverse();
        assert_eq!(reversed, desc.ids().unwrap());
    }

    #[test]
    fn test_empty_room_selection() {
        let criteria =
            FilterCriteria::new(AreaSelection::neighbourhoods(["Camden"]), Vec::<String>::new());
        let (view, report) = compute(&dataset(), &criteria, SortOrder::PriceAscending).unwrap();
        assert!(view.is_empty());
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.average_price, None);
        assert!(report.composition.is_empty());
        assert!(report.prices.is_empty());
    }

    #[test]
    fn test_rows_and_summary() {
        let criteria = FilterCriteria::new(
            AreaSelection::near("Big Ben", 10.0, DistanceUnit::Miles).unwrap(),
            ["Entire home/apt"],
        );
        let (view, report) = compute(&dataset(), &criteria, SortOrder::PriceDescending).unwrap();
        assert_eq!(report.summary.total, view.len());
        assert_eq!(report.summary.host_count, 3);
        assert_eq!(report.neighbourhoods.len(), 1);
        assert_eq!(report.neighbourhoods[0].listings, view.len());
        assert_eq!(report.composition[0].counts, [view.len(), 0, 0, 0]);

        let rows = view.rows().unwrap();
        assert_eq!(rows[0].id, 4);
        assert_eq!(rows[0].name, "flat 4");
        assert_eq!(rows[0].price, 300.0);
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!("price-desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDescending);
        assert!("name".parse::<SortOrder>().is_err());
    }
}
