//! Price range selection through labelled buckets
//!
//! The range slider offers nine labels. Interior labels are exact prices.
//! The two outer labels are open-ended, so each bucket carries the bound it
//! contributes when picked as the range minimum (`lower`) and when picked as
//! the range maximum (`upper`):
//!
//! | label   | as minimum | as maximum |
//! |---------|-----------:|-----------:|
//! | `<50`   |          0 |         50 |
//! | `5000+` |       5000 |      99999 |
//!
//! Both bounds of the resulting range are inclusive.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBucket {
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
}

const fn exact(label: &'static str, price: f64) -> PriceBucket {
    PriceBucket {
        label,
        lower: price,
        upper: price,
    }
}

/// Ordered from cheapest to dearest
pub const PRICE_BUCKETS: [PriceBucket; 9] = [
    PriceBucket {
        label: "<50",
        lower: 0.0,
        upper: 50.0,
    },
    exact("100", 100.0),
    exact("150", 150.0),
    exact("200", 200.0),
    exact("300", 300.0),
    exact("500", 500.0),
    exact("1000", 1000.0),
    exact("2000", 2000.0),
    PriceBucket {
        label: "5000+",
        lower: 5000.0,
        upper: 99999.0,
    },
];

fn bucket_index(label: &str) -> Result<usize, QueryError> {
    let label = label.trim();
    PRICE_BUCKETS
        .iter()
        .position(|b| b.label == label)
        .ok_or_else(|| QueryError::UnknownPriceBucket(label.to_string()))
}

/// Inclusive price interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Resolve a pair of slider labels into numeric bounds
    pub fn from_labels(min_label: &str, max_label: &str) -> Result<Self, QueryError> {
        let lo = bucket_index(min_label)?;
        let hi = bucket_index(max_label)?;
        if lo > hi {
            return Err(QueryError::InvertedPriceRange {
                min: PRICE_BUCKETS[lo].label.to_string(),
                max: PRICE_BUCKETS[hi].label.to_string(),
            });
        }
        Ok(Self::new(PRICE_BUCKETS[lo].lower, PRICE_BUCKETS[hi].upper))
    }
}

impl Default for PriceRange {
    /// The full slider span, `<50` to `5000+`
    fn default() -> Self {
        Self::new(PRICE_BUCKETS[0].lower, PRICE_BUCKETS[PRICE_BUCKETS.len() - 1].upper)
    }
}
