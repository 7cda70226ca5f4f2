//! Filter, sort and summarise a city's short-let listings.
//!
//! The table is loaded once into a single Arrow record batch; every query
//! builds a selection mask with compute kernels, takes the matching rows and
//! reorders them, and aggregations run over the result.

pub mod aggregator;
pub mod config;
pub mod dataset;
pub mod error;
pub mod expressions;
pub mod filter;
pub mod geo;
pub mod landmark;
pub mod listing;
pub mod map;
pub mod price;
pub mod query;
pub mod reader;
pub mod utils;

pub use dataset::{Dataset, ListingTable};
pub use error::{LoadError, QueryError};
pub use filter::{AreaSelection, FilterCriteria};
pub use listing::Listing;
pub use query::{compute, filter_and_sort, FilteredView, SortOrder};
pub use reader::load;
