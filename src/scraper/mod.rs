//! Property Scraper Module
//!
//! Thin client for the external property scraping backend. The backend owns
//! all listing-site logic; this module only builds queries and turns the
//! tabular answer into JSON records.

mod provider;
mod types;

pub use provider::{HttpScraper, PropertyScraper};
pub use types::{
    Cell, ListingType, PropertyQuery, PropertyTable, PropertyType, ScraperError, DEFAULT_LIMIT,
    MAX_LIMIT,
};
