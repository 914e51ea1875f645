use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use catalog_core::{ListParams, Product, ProductId, ProductInput, ProductPatch, ProductQuery};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState, DataResponse, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductListResponse {
    success: bool,
    products: Vec<Product>,
    has_more: bool,
}

/// `GET /api/products`: repairs legacy prices, then returns one page.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ProductListResponse>, ApiError> {
    // Undecodable query strings fall back to defaults like any other bad value.
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let query = ProductQuery::from_params(&params);

    let repaired = state
        .store
        .repair_prices()
        .await
        .map_err(|e| map_db_error(&req_id.0, "repair_prices", &e))?;
    if repaired > 0 {
        tracing::info!(request_id = %req_id.0, repaired, "converted legacy text prices");
    }

    let page = state
        .store
        .list_products(&query)
        .await
        .map_err(|e| map_db_error(&req_id.0, "list_products", &e))?;

    Ok(Json(ProductListResponse {
        success: true,
        has_more: query.has_more(page.total),
        products: page.products,
    }))
}

/// `POST /api/products`
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<Product>>), ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let draft = input
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let product = state
        .store
        .create_product(&draft)
        .await
        .map_err(|e| map_db_error(&req_id.0, "create_product", &e))?;

    tracing::debug!(request_id = %req_id.0, id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(DataResponse::ok(product))))
}

/// `PUT /api/products/{id}`
///
/// Applies only the supplied fields. An unknown id yields `data: null`.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<DataResponse<Option<Product>>>, ApiError> {
    let id = ProductId::parse(&id).ok_or_else(ApiError::invalid_id)?;
    let Json(patch) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let changes = patch
        .to_changes()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let product = state
        .store
        .update_product(id, &changes)
        .await
        .map_err(|e| map_db_error(&req_id.0, "update_product", &e))?;

    Ok(Json(DataResponse::ok(product)))
}

/// `DELETE /api/products/{id}`. Succeeds whether or not the record existed.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ProductId::parse(&id).ok_or_else(ApiError::invalid_id)?;

    let removed = state
        .store
        .delete_product(id)
        .await
        .map_err(|e| map_db_error(&req_id.0, "delete_product", &e))?;
    if !removed {
        tracing::debug!(request_id = %req_id.0, %id, "delete of unknown product");
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Product deleted".to_string(),
    }))
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
