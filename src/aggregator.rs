//! Descriptive statistics over the whole dataset or a filtered view
//!
//! Every function here is a pure function of the table it is given.

use std::collections::{BTreeMap, HashSet};

use arrow::array::{Array, RecordBatch, StringArray};
use arrow::compute;
use arrow::error::ArrowError;
use serde::Serialize;

use crate::dataset::ListingTable;
use crate::listing::{HOST_ID, NEIGHBOURHOOD, PRICE, ROOM_TYPE, ROOM_TYPES};
use crate::utils::{f64_column, i64_column, str_column};

/// Headline metrics for a set of listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// `None` when there are no listings to average
    pub average_price: Option<f64>,
    pub host_count: usize,
}

pub fn summarize(table: &impl ListingTable) -> Result<Summary, ArrowError> {
    let batch = table.batch();
    let price = f64_column(batch, PRICE)?;
    let hosts = i64_column(batch, HOST_ID)?;

    let total = batch.num_rows();
    let average_price = match (total, compute::sum(price)) {
        (0, _) | (_, None) => None,
        (n, Some(sum)) => Some(sum / n as f64),
    };
    let host_count = hosts.iter().flatten().collect::<HashSet<_>>().len();

    Ok(Summary {
        total,
        average_price,
        host_count,
    })
}

/// Running price statistics for one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceState {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for PriceState {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl PriceState {
    pub fn update(&mut self, price: f64) {
        self.count += 1;
        self.sum += price;
        self.min = self.min.min(price);
        self.max = self.max.max(price);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// One row of the price pivot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub neighbourhood: String,
    pub room_type: String,
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Price count/mean/min/max per (neighbourhood, room type).
///
/// Sorted by neighbourhood then room type. Combinations without listings
/// are left out rather than reported as zeros.
pub fn price_table(table: &impl ListingTable) -> Result<Vec<PriceStats>, ArrowError> {
    let batch = table.batch();
    let neighbourhood = str_column(batch, NEIGHBOURHOOD)?;
    let room_type = str_column(batch, ROOM_TYPE)?;
    let price = f64_column(batch, PRICE)?;

    let mut groups: BTreeMap<(&str, &str), PriceState> = BTreeMap::new();
    for i in 0..batch.num_rows() {
        if neighbourhood.is_null(i) || room_type.is_null(i) || price.is_null(i) {
            continue;
        }
        groups
            .entry((neighbourhood.value(i), room_type.value(i)))
            .or_default()
            .update(price.value(i));
    }

    Ok(groups
        .into_iter()
        .filter(|(_, state)| !state.is_empty())
        .filter_map(|((n, r), state)| {
            Some(PriceStats {
                neighbourhood: n.to_string(),
                room_type: r.to_string(),
                count: state.count,
                mean: state.mean()?,
                min: state.min,
                max: state.max,
            })
        })
        .collect())
}

/// Room-type make-up of one neighbourhood, for the stacked bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighbourhoodComposition {
    pub neighbourhood: String,
    /// Aligned with [`ROOM_TYPES`]
    pub counts: [usize; 4],
    pub total: usize,
}

/// Room-type counts for every neighbourhood present, busiest first.
///
/// Neighbourhoods with the same total stay in alphabetical order.
pub fn composition(table: &impl ListingTable) -> Result<Vec<NeighbourhoodComposition>, ArrowError> {
    let batch = table.batch();
    let mut counts: BTreeMap<&str, [usize; 4]> = BTreeMap::new();

    let neighbourhood = str_column(batch, NEIGHBOURHOOD)?;
    let room_type = str_column(batch, ROOM_TYPE)?;
    for (n, r) in neighbourhood.iter().zip(room_type.iter()) {
        let (Some(n), Some(r)) = (n, r) else { continue };
        let slot = counts.entry(n).or_default();
        if let Some(idx) = ROOM_TYPES.iter().position(|t| *t == r) {
            slot[idx] += 1;
        }
    }

    let mut result: Vec<_> = counts
        .into_iter()
        .map(|(n, counts)| NeighbourhoodComposition {
            neighbourhood: n.to_string(),
            counts,
            total: counts.iter().sum(),
        })
        .collect();
    result.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighbourhoodCount {
    pub neighbourhood: String,
    pub listings: usize,
}

/// Listings per neighbourhood, busiest first (ties alphabetical)
pub fn neighbourhood_counts(table: &impl ListingTable) -> Result<Vec<NeighbourhoodCount>, ArrowError> {
    let neighbourhood = str_column(table.batch(), NEIGHBOURHOOD)?;
    let ranked = ranked_counts(neighbourhood)
        .into_iter()
        .map(|(neighbourhood, listings)| NeighbourhoodCount {
            neighbourhood,
            listings,
        })
        .collect();
    Ok(ranked)
}

fn ranked_counts(values: &StringArray) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomTypeCount {
    pub room_type: String,
    pub listings: usize,
}

/// Room-type counts within a single neighbourhood
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomTypeBreakdown {
    pub neighbourhood: String,
    /// Every room type in alphabetical order, zeros included
    pub counts: Vec<RoomTypeCount>,
}

impl RoomTypeBreakdown {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.listings).sum()
    }

    /// Percentage of the neighbourhood's listings of this room type
    pub fn share(&self, room_type: &str) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        self.counts
            .iter()
            .find(|c| c.room_type == room_type)
            .map(|c| c.listings as f64 * 100.0 / total as f64)
    }

    /// Room types present, most common first
    pub fn ranked(&self) -> Vec<RoomTypeCount> {
        let mut ranked: Vec<_> = self.counts.iter().filter(|c| c.listings > 0).cloned().collect();
        ranked.sort_by(|a, b| b.listings.cmp(&a.listings));
        ranked
    }
}

pub fn room_type_breakdown(
    table: &impl ListingTable,
    neighbourhood: &str,
) -> Result<RoomTypeBreakdown, ArrowError> {
    let batch = table.batch();
    let neighbourhoods = str_column(batch, NEIGHBOURHOOD)?;
    let room_types = str_column(batch, ROOM_TYPE)?;

    let mut counts = [0usize; 4];
    for (n, r) in neighbourhoods.iter().zip(room_types.iter()) {
        if n != Some(neighbourhood) {
            continue;
        }
        if let Some(idx) = r.and_then(|r| ROOM_TYPES.iter().position(|t| *t == r)) {
            counts[idx] += 1;
        }
    }

    Ok(RoomTypeBreakdown {
        neighbourhood: neighbourhood.to_string(),
        counts: ROOM_TYPES
            .iter()
            .zip(counts)
            .map(|(room_type, listings)| RoomTypeCount {
                room_type: room_type.to_string(),
                listings,
            })
            .collect(),
    })
}

/// Equal-width price histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Price distribution of one room type in one neighbourhood over
/// `[0, max_price]`.
///
/// Prices outside the range are not counted. The bin width is the smaller of
/// the Freedman-Diaconis and Sturges estimates (Sturges alone when the
/// interquartile range is zero), capped at [`MAX_HISTOGRAM_BINS`]; a single
/// bin is used when there is no data or no spread.
pub fn price_histogram(
    table: &impl ListingTable,
    neighbourhood: &str,
    room_type: &str,
    max_price: f64,
) -> Result<Histogram, ArrowError> {
    let prices = prices_for(table.batch(), neighbourhood, room_type, max_price)?;

    let bins = auto_bin_count(&prices, max_price);
    let width = max_price / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| i as f64 * width).collect();

    let mut counts = vec![0usize; bins];
    for price in &prices {
        let idx = ((price / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}

fn prices_for(
    batch: &RecordBatch,
    neighbourhood: &str,
    room_type: &str,
    max_price: f64,
) -> Result<Vec<f64>, ArrowError> {
    let neighbourhoods = str_column(batch, NEIGHBOURHOOD)?;
    let room_types = str_column(batch, ROOM_TYPE)?;
    let price = f64_column(batch, PRICE)?;

    let mut prices: Vec<f64> = (0..batch.num_rows())
        .filter(|&i| {
            neighbourhoods.is_valid(i)
                && room_types.is_valid(i)
                && price.is_valid(i)
                && neighbourhoods.value(i) == neighbourhood
                && room_types.value(i) == room_type
        })
        .map(|i| price.value(i))
        .filter(|p| (0.0..=max_price).contains(p))
        .collect();
    prices.sort_by(f64::total_cmp);
    Ok(prices)
}

/// Upper bound on histogram bins; near-identical prices would otherwise ask
/// for an unbounded number of bins
pub const MAX_HISTOGRAM_BINS: usize = 200;

/// `sorted` must be in ascending order
fn auto_bin_count(sorted: &[f64], span: f64) -> usize {
    let n = sorted.len();
    if n == 0 || span <= 0.0 {
        return 1;
    }

    let spread = sorted[n - 1] - sorted[0];
    let sturges = spread / ((n as f64).log2() + 1.0);
    let iqr = percentile(sorted, 75.0) - percentile(sorted, 25.0);
    let fd = 2.0 * iqr * (n as f64).powf(-1.0 / 3.0);

    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };
    if width > 0.0 {
        // Clamp in floating point so huge ratios never overflow the cast
        (span / width).ceil().clamp(1.0, MAX_HISTOGRAM_BINS as f64) as usize
    } else {
        1
    }
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Composition, per-neighbourhood counts, price pivot and headline metrics
/// for one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub summary: Summary,
    pub neighbourhoods: Vec<NeighbourhoodCount>,
    pub composition: Vec<NeighbourhoodComposition>,
    pub prices: Vec<PriceStats>,
}

pub fn report(table: &impl ListingTable) -> Result<AggregateReport, ArrowError> {
    Ok(AggregateReport {
        summary: summarize(table)?,
        neighbourhoods: neighbourhood_counts(table)?,
        composition: composition(table)?,
        prices: price_table(table)?,
    })
}
