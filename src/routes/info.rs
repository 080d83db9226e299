//! Service directory endpoint

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [Endpoint],
}

const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/",
        description: "Health check",
    },
    Endpoint {
        method: "POST",
        path: "/enrich",
        description: "Look up property listings for an address (JSON body, 'address' required)",
    },
    Endpoint {
        method: "GET",
        path: "/search-options",
        description: "Supported listing types, property types and /enrich parameters",
    },
    Endpoint {
        method: "POST",
        path: "/predict",
        description: "Classify each page of an uploaded PDF (multipart field 'file')",
    },
    Endpoint {
        method: "GET",
        path: "/model-info",
        description: "Details of the loaded document classification model",
    },
    Endpoint {
        method: "GET",
        path: "/api-info",
        description: "This endpoint directory",
    },
];

pub async fn api_info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "PropertyData API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS,
    })
}
