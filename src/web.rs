//! HTTP routing layer.
//!
//! Translates the `{resource}/{level}` path parameters into calls against
//! the data-source layer and serializes the returned tables as JSON. The
//! level parameter is validated here: anything but 1/2/3 is rejected with
//! HTTP 400 before the backend is consulted. The internal `NUTS 1/2/3`
//! filter columns are dropped from data responses before serialization.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, json};
use tower_http::cors::{Any, CorsLayer};

use crate::error::DataSourceError;
use crate::source::{AnyDataSource, DataLevel, DataSource};

/// Served datasets: URL resource name, table identity, description.
const DATASETS: &[(&str, &str, &str)] = &[
    (
        "bruttoinlandsprodukt",
        "1.1",
        "Bruttoinlandsprodukt in jeweiligen Preisen",
    ),
    ("erwerbstaetige", "3.1", "Erwerbstätige"),
];

/// Columns used internally for level filtering, never serialized.
const FILTER_COLUMNS: &[&str] = &["NUTS 1", "NUTS 2", "NUTS 3"];

/// State shared across handlers.
pub struct AppState {
    /// The backend constructed by the factory at startup.
    pub data_source: AnyDataSource,
}

/// Build the router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/{resource}/metadata", get(get_metadata))
        .route("/api/{resource}/{level}", get(get_data))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct DataResponse {
    status: &'static str,
    data: Vec<Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct MetadataResponse {
    status: &'static str,
    metadata: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error",
            message: message.into(),
        }),
    )
        .into_response()
}

fn table_for_resource(resource: &str) -> Option<&'static str> {
    DATASETS
        .iter()
        .find(|(name, _, _)| *name == resource)
        .map(|(_, table, _)| *table)
}

fn source_error_status(error: &DataSourceError) -> StatusCode {
    match error {
        DataSourceError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GET /`: JSON index describing the available endpoints.
async fn index() -> Json<serde_json::Value> {
    let endpoints: Map<String, serde_json::Value> = DATASETS
        .iter()
        .map(|(name, _, description)| {
            let levels: Map<String, serde_json::Value> = DataLevel::ALL
                .iter()
                .map(|level| {
                    (
                        level.as_str().to_string(),
                        json!(format!("/api/{name}/{}", level.as_str())),
                    )
                })
                .collect();
            (
                name.to_string(),
                json!({
                    "description": description,
                    "data": levels,
                    "metadata": format!("/api/{name}/metadata"),
                }),
            )
        })
        .collect();

    Json(json!({
        "message": "Welcome to the Data API!",
        "endpoints": endpoints,
    }))
}

/// `GET /api/{resource}/{level}`: one dataset at one NUTS level.
async fn get_data(
    State(state): State<Arc<AppState>>,
    Path((resource, level)): Path<(String, String)>,
) -> Response {
    let Some(table) = table_for_resource(&resource) else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown dataset '{resource}'"));
    };
    let level: DataLevel = match level.parse() {
        Ok(level) => level,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid data level"),
    };

    match state.data_source.get_data(table, level) {
        Ok(data) => Json(DataResponse {
            status: "success",
            data: data.project_out(FILTER_COLUMNS).to_records(),
        })
        .into_response(),
        Err(e) => error_response(source_error_status(&e), e.to_string()),
    }
}

/// `GET /api/{resource}/metadata`: the dataset metadata block.
async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
) -> Response {
    let Some(table) = table_for_resource(&resource) else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown dataset '{resource}'"));
    };

    match state.data_source.get_metadata(table) {
        Ok(metadata) => Json(MetadataResponse {
            status: "success",
            metadata,
        })
        .into_response(),
        Err(e) => error_response(source_error_status(&e), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{source_error_status, table_for_resource};
    use crate::error::DataSourceError;
    use axum::http::StatusCode;

    #[test]
    fn resources_map_to_their_table_identities() {
        assert_eq!(table_for_resource("bruttoinlandsprodukt"), Some("1.1"));
        assert_eq!(table_for_resource("erwerbstaetige"), Some("3.1"));
        assert_eq!(table_for_resource("unbekannt"), None);
    }

    #[test]
    fn unsupported_maps_to_501_and_the_rest_to_500() {
        assert_eq!(
            source_error_status(&DataSourceError::unsupported("metadata")),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            source_error_status(&DataSourceError::data_not_found("empty")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            source_error_status(&DataSourceError::metadata_not_found("missing")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
