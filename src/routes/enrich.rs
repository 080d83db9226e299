//! Property enrichment routes
//!
//! Endpoints:
//! - POST /enrich - Look up listings for an address via the scraping backend
//! - GET /search-options - Supported filters and parameter documentation

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{AppError, Result};
use crate::scraper::{ListingType, PropertyQuery, PropertyType, DEFAULT_LIMIT, MAX_LIMIT};
use crate::state::AppState;

/// Create the enrichment router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enrich", post(enrich_property))
        .route("/search-options", get(search_options))
}

/// Body of `POST /enrich`
///
/// Optional fields may be absent or `null`; both mean the default.
#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    /// Location to search: street address, city/state or ZIP
    pub address: String,
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    /// Only properties sold/listed in the last N days
    #[serde(default)]
    pub past_days: Option<u32>,
    /// Search radius in miles around a single address
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub mls_only: Option<bool>,
    /// Maximum number of results (default 100, at most 10000)
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub property_type: Option<Vec<PropertyType>>,
}

impl EnrichRequest {
    /// Parse a raw request body, reporting every problem as a 400
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let mut value: Value = serde_json::from_slice(body)
            .map_err(|_| AppError::BadRequest("Request body must be a JSON object".to_string()))?;

        let object = value
            .as_object_mut()
            .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".to_string()))?;

        let numeric_address = match object.get("address") {
            None | Some(Value::Null) => {
                return Err(AppError::BadRequest(
                    "Missing 'address' in request body".to_string(),
                ))
            }
            // ZIP codes are often sent as bare numbers
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => None,
        };
        if let Some(address) = numeric_address {
            object.insert("address".to_string(), Value::String(address));
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::BadRequest(format!("Invalid request: {}", e)))
    }

    /// Validate ranges and build the scraper query
    pub fn into_query(self) -> Result<PropertyQuery> {
        let location = self.address.trim();
        if location.is_empty() {
            return Err(AppError::BadRequest("'address' must not be empty".to_string()));
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(AppError::BadRequest(format!(
                "'limit' must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        if let Some(radius) = self.radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(AppError::BadRequest(
                    "'radius' must be a positive number of miles".to_string(),
                ));
            }
        }

        Ok(PropertyQuery {
            location: location.to_string(),
            listing_type: self.listing_type.unwrap_or_default(),
            past_days: self.past_days,
            radius: self.radius,
            mls_only: self.mls_only.unwrap_or(false),
            limit,
            property_type: self.property_type.filter(|types| !types.is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub success: bool,
    pub count: usize,
    pub properties: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /enrich
async fn enrich_property(State(state): State<AppState>, body: Bytes) -> Result<Json<EnrichResponse>> {
    let query = EnrichRequest::from_body(&body)?.into_query()?;

    let table = state.scraper().scrape(&query).await?;

    if table.is_empty() {
        tracing::info!(location = %query.location, "No properties found");
        return Ok(Json(EnrichResponse {
            success: true,
            count: 0,
            properties: Vec::new(),
            message: Some("No properties found for the given address".to_string()),
        }));
    }

    let properties = table.into_records();
    tracing::info!(
        location = %query.location,
        listing_type = query.listing_type.as_str(),
        count = properties.len(),
        "Enrichment complete"
    );

    Ok(Json(EnrichResponse {
        success: true,
        count: properties.len(),
        properties,
        message: None,
    }))
}

/// GET /search-options
async fn search_options() -> Json<Value> {
    let listing_types: Vec<&str> = ListingType::ALL.iter().map(ListingType::as_str).collect();
    let property_types: Vec<&str> = PropertyType::ALL.iter().map(PropertyType::as_str).collect();

    Json(json!({
        "listing_types": listing_types,
        "property_types": property_types,
        "parameters": {
            "address": "Required. Location to search (e.g. 'Dallas, TX', '85281', '2530 Al Lipscomb Way')",
            "listing_type": "Optional. Type of listing (default: 'for_sale')",
            "past_days": "Optional. Get properties sold/listed in the last N days",
            "radius": "Optional. Search radius in miles (for individual addresses)",
            "mls_only": "Optional. Boolean to fetch only MLS listings",
            "limit": format!("Optional. Maximum results to return (default: {}, max: {})", DEFAULT_LIMIT, MAX_LIMIT),
            "property_type": "Optional. List of property types to include (see 'property_types')"
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = EnrichRequest::from_body(br#"{"address": "Dallas, TX"}"#)
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query, PropertyQuery::new("Dallas, TX"));
    }

    #[test]
    fn test_null_optional_fields_use_defaults() {
        let query = EnrichRequest::from_body(
            br#"{"address": "Dallas, TX", "listing_type": null, "past_days": null,
                 "radius": null, "mls_only": null, "limit": null, "property_type": null}"#,
        )
        .unwrap()
        .into_query()
        .unwrap();
        assert_eq!(query, PropertyQuery::new("Dallas, TX"));
    }

    #[test]
    fn test_missing_address() {
        let bodies: [&[u8]; 3] = [br#"{}"#, br#"{"address": null}"#, br#"{"limit": 5}"#];
        for body in bodies {
            let err = EnrichRequest::from_body(body).unwrap_err();
            assert_eq!(err.to_string(), "Missing 'address' in request body");
        }
    }

    #[test]
    fn test_non_object_body() {
        assert!(matches!(
            EnrichRequest::from_body(b"not json"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            EnrichRequest::from_body(b"[1, 2]"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_numeric_zip() {
        let query = EnrichRequest::from_body(br#"{"address": 85281}"#)
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query.location, "85281");
    }

    #[test]
    fn test_unknown_listing_type() {
        let err = EnrichRequest::from_body(br#"{"address": "x", "listing_type": "leased"}"#)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_range_checks() {
        let parse = |body: &[u8]| EnrichRequest::from_body(body).unwrap().into_query();
        assert!(parse(br#"{"address": "x", "limit": 0}"#).is_err());
        assert!(parse(br#"{"address": "x", "limit": 10001}"#).is_err());
        assert!(parse(br#"{"address": "x", "limit": 10000}"#).is_ok());
        assert!(parse(br#"{"address": "x", "radius": -1.5}"#).is_err());
        assert!(parse(br#"{"address": "   "}"#).is_err());
    }

    #[test]
    fn test_full_request() {
        let query = EnrichRequest::from_body(
            br#"{"address": " 2530 Al Lipscomb Way ", "listing_type": "sold", "past_days": 30,
                 "radius": 0.5, "mls_only": true, "limit": 25,
                 "property_type": ["single_family", "condos"]}"#,
        )
        .unwrap()
        .into_query()
        .unwrap();

        assert_eq!(query.location, "2530 Al Lipscomb Way");
        assert_eq!(query.listing_type, ListingType::Sold);
        assert_eq!(query.past_days, Some(30));
        assert_eq!(query.radius, Some(0.5));
        assert!(query.mls_only);
        assert_eq!(query.limit, 25);
        assert_eq!(
            query.property_type,
            Some(vec![PropertyType::SingleFamily, PropertyType::Condos])
        );
    }
}
