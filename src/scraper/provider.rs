//! Scraping backends
//!
//! Defines the scraper trait and the HTTP implementation that talks to a
//! property scraping service.

use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::types::{PropertyQuery, PropertyTable, ScraperError};

/// Property scraping backend
#[async_trait]
pub trait PropertyScraper: Send + Sync {
    /// Run a search and return the raw tabular result
    async fn scrape(&self, query: &PropertyQuery) -> Result<PropertyTable, ScraperError>;
}

/// Scraper backed by an HTTP service exposing `POST /scrape`
///
/// The service receives the query as JSON and answers with a split-layout
/// table (`columns` + `data`). Validation failures come back as 400/422
/// with an `error` or `detail` message. Bare `NaN` and `Infinity` tokens, as
/// written by Python's `json` module, are read as `null`.
pub struct HttpScraper {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScraper {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn scrape_url(&self) -> String {
        format!("{}/scrape", self.base_url)
    }
}

#[async_trait]
impl PropertyScraper for HttpScraper {
    async fn scrape(&self, query: &PropertyQuery) -> Result<PropertyTable, ScraperError> {
        tracing::debug!(
            location = %query.location,
            listing_type = query.listing_type.as_str(),
            limit = query.limit,
            "Forwarding property search"
        );

        let response = self
            .client
            .post(self.scrape_url())
            .json(query)
            .send()
            .await
            .map_err(|e| ScraperError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::Request(e.to_string()))?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(ScraperError::InvalidInput(validation_message(&body)));
        }

        if !status.is_success() {
            return Err(ScraperError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        parse_table(&body)
    }
}

/// Decode a backend body; an empty body or `null` is an empty result set
fn parse_table(body: &str) -> Result<PropertyTable, ScraperError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(PropertyTable::default());
    }
    let cleaned = null_non_finite(trimmed);
    serde_json::from_str(&cleaned).map_err(|e| ScraperError::Decode(e.to_string()))
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Rewrite non-finite float tokens outside string literals to `null`
fn null_non_finite(body: &str) -> Cow<'_, str> {
    if !NON_FINITE_TOKENS.iter().any(|token| body.contains(token)) {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = body;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

/// Pull a human readable message out of a validation error body
fn validation_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("detail")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode as HttpStatus,
        response::{IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    /// Stand-in scraping service: rejects "nowhere", fails on "crash" and
    /// otherwise echoes the query back as a one-row table
    async fn scrape_backend(Json(query): Json<Value>) -> Response {
        match query["location"].as_str() {
            Some("nowhere") => (
                HttpStatus::UNPROCESSABLE_ENTITY,
                Json(json!({"detail": "Invalid location"})),
            )
                .into_response(),
            Some("crash") => (HttpStatus::INTERNAL_SERVER_ERROR, "scraper exploded").into_response(),
            _ => format!(
                r#"{{"columns":["location","listing_type","limit","mls_only","hoa_fee"],"data":[[{},{},{},{},NaN]]}}"#,
                query["location"], query["listing_type"], query["limit"], query["mls_only"]
            )
            .into_response(),
        }
    }

    async fn spawn_backend() -> String {
        let app = Router::new().route("/scrape", post(scrape_backend));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_scrape_posts_query_and_decodes_table() {
        let scraper = HttpScraper::new(&spawn_backend().await);

        let table = scraper.scrape(&PropertyQuery::new("Dallas, TX")).await.unwrap();
        let records = table.into_records();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["location"], "Dallas, TX");
        assert_eq!(records[0]["listing_type"], "for_sale");
        assert_eq!(records[0]["limit"], 100);
        assert_eq!(records[0]["mls_only"], false);
        assert_eq!(records[0]["hoa_fee"], Value::Null);
    }

    #[tokio::test]
    async fn test_scrape_validation_error_is_invalid_input() {
        let scraper = HttpScraper::new(&spawn_backend().await);

        let result = scraper.scrape(&PropertyQuery::new("nowhere")).await;

        match result {
            Err(ScraperError::InvalidInput(message)) => assert_eq!(message, "Invalid location"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scrape_server_error_is_backend_error() {
        let scraper = HttpScraper::new(&spawn_backend().await);

        let result = scraper.scrape(&PropertyQuery::new("crash")).await;

        match result {
            Err(ScraperError::Backend { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "scraper exploded");
            }
            other => panic!("expected Backend, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scrape_unreachable_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scraper = HttpScraper::new(&format!("http://{}", addr));
        let result = scraper.scrape(&PropertyQuery::new("Dallas, TX")).await;

        assert!(matches!(result, Err(ScraperError::Request(_))));
    }

    #[test]
    fn test_parse_table_python_non_finite_tokens() {
        let table = parse_table(
            r#"{"columns":["price","sqft","note"],"data":[[1,NaN,"NaN"],[-Infinity,Infinity,"say \"NaN\""]]}"#,
        )
        .unwrap();
        let records = table.into_records();

        assert_eq!(records[0]["price"], 1);
        assert_eq!(records[0]["sqft"], Value::Null);
        assert_eq!(records[0]["note"], "NaN");
        assert_eq!(records[1]["price"], Value::Null);
        assert_eq!(records[1]["sqft"], Value::Null);
        assert_eq!(records[1]["note"], "say \"NaN\"");
    }

    #[test]
    fn test_null_non_finite_leaves_clean_bodies_alone() {
        let body = r#"{"columns":["a"],"data":[[1.5]]}"#;
        assert!(matches!(null_non_finite(body), Cow::Borrowed(_)));
    }

    #[test]
    fn test_scrape_url_strips_trailing_slash() {
        let scraper = HttpScraper::new("http://scraper:8000/");
        assert_eq!(scraper.scrape_url(), "http://scraper:8000/scrape");
    }

    #[test]
    fn test_parse_table_empty_bodies() {
        assert!(parse_table("").unwrap().is_empty());
        assert!(parse_table("null").unwrap().is_empty());
        assert!(parse_table(r#"{"columns":["a"],"data":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_table_rejects_garbage() {
        assert!(matches!(parse_table("<html>"), Err(ScraperError::Decode(_))));
    }

    #[test]
    fn test_validation_message() {
        assert_eq!(
            validation_message(r#"{"error":"Invalid listing type"}"#),
            "Invalid listing type"
        );
        assert_eq!(validation_message(r#"{"detail":"bad radius"}"#), "bad radius");
        assert_eq!(validation_message("plain text\n"), "plain text");
    }
}
