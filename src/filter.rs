//! Filter criteria and vectorized mask construction using Arrow compute kernels

use std::collections::BTreeSet;

use arrow::array::{BooleanArray, Float64Array, Int64Array, RecordBatch, Scalar, StringArray};
use arrow::compute;
use arrow::error::ArrowError;
use tracing::debug;

use crate::error::QueryError;
use crate::expressions::availability_ratio;
use crate::geo::{within_radius, DistanceUnit};
use crate::landmark::{self, Landmark};
use crate::listing::{NEIGHBOURHOOD, NUMBER_OF_REVIEWS, PRICE, ROOM_TYPE};
use crate::price::PriceRange;
use crate::utils::{f64_column, i64_column, str_column};

/// Share of the year a listing must be open to pass the availability flag
pub const AVAILABILITY_THRESHOLD: f64 = 0.70;

/// Where listings must be
#[derive(Debug, Clone, PartialEq)]
pub enum AreaSelection {
    /// Any of these neighbourhoods. An empty set matches nothing.
    Neighbourhoods(BTreeSet<String>),
    /// Within `radius` of a landmark
    NearLandmark {
        landmark: Landmark,
        radius: f64,
        unit: DistanceUnit,
    },
}

impl AreaSelection {
    pub fn neighbourhoods<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AreaSelection::Neighbourhoods(names.into_iter().map(Into::into).collect())
    }

    pub fn near(name: &str, radius: f64, unit: DistanceUnit) -> Result<Self, QueryError> {
        let landmark =
            landmark::find(name).ok_or_else(|| QueryError::UnknownLandmark(name.to_string()))?;
        Ok(AreaSelection::NearLandmark {
            landmark: *landmark,
            radius,
            unit,
        })
    }

    /// The anchor landmark, when selecting by proximity
    pub fn landmark(&self) -> Option<&Landmark> {
        match self {
            AreaSelection::NearLandmark { landmark, .. } => Some(landmark),
            AreaSelection::Neighbourhoods(_) => None,
        }
    }
}

/// A complete set of user selections
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub area: AreaSelection,
    /// Allowed room types. An empty set matches nothing.
    pub room_types: BTreeSet<String>,
    pub price: PriceRange,
    /// Keep only listings with at least one review
    pub require_reviews: bool,
    /// Keep only listings open more than 70% of the year
    pub high_availability: bool,
}

impl FilterCriteria {
    pub fn new<I, S>(area: AreaSelection, room_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            area,
            room_types: room_types.into_iter().map(Into::into).collect(),
            price: PriceRange::default(),
            require_reviews: false,
            high_availability: false,
        }
    }

    pub fn with_price(mut self, price: PriceRange) -> Self {
        self.price = price;
        self
    }

    pub fn with_reviews(mut self, required: bool) -> Self {
        self.require_reviews = required;
        self
    }

    pub fn with_high_availability(mut self, required: bool) -> Self {
        self.high_availability = required;
        self
    }
}

/// Combine every criterion into a single selection mask
pub fn build_mask(batch: &RecordBatch, criteria: &FilterCriteria) -> Result<BooleanArray, ArrowError> {
    // Neighbourhood membership or great-circle distance, whichever was chosen
    let area = area_mask(batch, &criteria.area)?;
    let rooms = membership_mask(str_column(batch, ROOM_TYPE)?, &criteria.room_types);
    let price = price_mask(batch, &criteria.price)?;

    // AND the masks together; nulls never survive the final filter
    let mut mask = compute::and(&compute::and(&area, &rooms)?, &price)?;

    // Optional flags only narrow the selection further
    if criteria.require_reviews {
        mask = compute::and(&mask, &review_mask(batch)?)?;
    }
    if criteria.high_availability {
        mask = compute::and(&mask, &availability_mask(batch)?)?;
    }

    debug!(
        area = area.true_count(),
        room_type = rooms.true_count(),
        price = price.true_count(),
        combined = mask.true_count(),
        "built filter mask"
    );
    Ok(mask)
}

fn area_mask(batch: &RecordBatch, area: &AreaSelection) -> Result<BooleanArray, ArrowError> {
    match area {
        AreaSelection::Neighbourhoods(names) => {
            Ok(membership_mask(str_column(batch, NEIGHBOURHOOD)?, names))
        }
        AreaSelection::NearLandmark {
            landmark,
            radius,
            unit,
        } => within_radius(landmark.coordinate, *radius, *unit, batch),
    }
}

/// True where the value is one of `allowed`
fn membership_mask(values: &StringArray, allowed: &BTreeSet<String>) -> BooleanArray {
    values
        .iter()
        .map(|v| Some(v.is_some_and(|v| allowed.contains(v))))
        .collect()
}

/// price BETWEEN min AND max
fn price_mask(batch: &RecordBatch, range: &PriceRange) -> Result<BooleanArray, ArrowError> {
    let price = f64_column(batch, PRICE)?;

    let min = Scalar::new(Float64Array::from(vec![range.min]));
    let max = Scalar::new(Float64Array::from(vec![range.max]));

    // Inclusive on both ends, compared column-wide against broadcast scalars
    let above = compute::kernels::cmp::gt_eq(price, &min)?;
    let below = compute::kernels::cmp::lt_eq(price, &max)?;
    compute::and(&above, &below)
}

/// number_of_reviews > 0
fn review_mask(batch: &RecordBatch) -> Result<BooleanArray, ArrowError> {
    let reviews = i64_column(batch, NUMBER_OF_REVIEWS)?;
    let zero = Scalar::new(Int64Array::from(vec![0]));
    compute::kernels::cmp::gt(reviews, &zero)
}

/// availability_365 / 365 > 0.70
fn availability_mask(batch: &RecordBatch) -> Result<BooleanArray, ArrowError> {
    let ratio = availability_ratio(batch)?;
    let threshold = Scalar::new(Float64Array::from(vec![AVAILABILITY_THRESHOLD]));
    compute::kernels::cmp::gt(&ratio, &threshold)
}
