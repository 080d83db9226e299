//! Scraper Types
//!
//! Query parameters sent to the scraping backend and the tabular result
//! it returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Listing category understood by the scraping backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    #[default]
    ForSale,
    ForRent,
    Sold,
    Pending,
}

impl ListingType {
    pub const ALL: [ListingType; 4] = [Self::ForSale, Self::ForRent, Self::Sold, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForSale => "for_sale",
            Self::ForRent => "for_rent",
            Self::Sold => "sold",
            Self::Pending => "pending",
        }
    }
}

/// Property type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    MultiFamily,
    Condos,
    CondoTownhomeRowhomeCoop,
    CondoTownhome,
    Townhomes,
    DuplexTriplex,
    Farm,
    Land,
    Mobile,
}

impl PropertyType {
    pub const ALL: [PropertyType; 10] = [
        Self::SingleFamily,
        Self::MultiFamily,
        Self::Condos,
        Self::CondoTownhomeRowhomeCoop,
        Self::CondoTownhome,
        Self::Townhomes,
        Self::DuplexTriplex,
        Self::Farm,
        Self::Land,
        Self::Mobile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleFamily => "single_family",
            Self::MultiFamily => "multi_family",
            Self::Condos => "condos",
            Self::CondoTownhomeRowhomeCoop => "condo_townhome_rowhome_coop",
            Self::CondoTownhome => "condo_townhome",
            Self::Townhomes => "townhomes",
            Self::DuplexTriplex => "duplex_triplex",
            Self::Farm => "farm",
            Self::Land => "land",
            Self::Mobile => "mobile",
        }
    }
}

/// Default number of results requested per search
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest result count the backend accepts
pub const MAX_LIMIT: u32 = 10_000;

/// A validated property search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyQuery {
    pub location: String,
    pub listing_type: ListingType,
    pub past_days: Option<u32>,
    pub radius: Option<f64>,
    pub mls_only: bool,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<Vec<PropertyType>>,
}

impl PropertyQuery {
    /// Query for `location` with every optional filter at its default
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            listing_type: ListingType::default(),
            past_days: None,
            radius: None,
            mls_only: false,
            limit: DEFAULT_LIMIT,
            property_type: None,
        }
    }
}

/// A single cell of scrape output
///
/// Floats keep NaN and infinities so that normalization happens in one
/// place, [`PropertyTable::into_records`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Nested(Value),
}

impl Cell {
    fn into_json(self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(b),
            Cell::Int(i) => Value::from(i),
            // from_f64 yields None for NaN and +/-inf
            Cell::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s),
            Cell::Nested(v) => v,
        }
    }
}

/// Column-oriented scrape result (split layout: column names plus rows)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PropertyTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, alias = "data")]
    pub rows: Vec<Vec<Cell>>,
}

impl PropertyTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert rows into JSON objects keyed by column name.
    ///
    /// Missing trailing cells and non-finite floats become `null`; cells
    /// beyond the last named column are dropped.
    pub fn into_records(self) -> Vec<Map<String, Value>> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                columns
                    .iter()
                    .map(|column| {
                        let value = cells.next().map(Cell::into_json).unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Scraper error types
#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    /// The backend rejected the query parameters
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to reach scraping backend: {0}")]
    Request(String),

    #[error("Scraping backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Failed to decode scrape result: {0}")]
    Decode(String),
}
