use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use posterflow_store::{Customer, NewCustomer};

use crate::app::AppState;
use crate::http::{store_error, ApiError};

/// POST /customers
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state.customers.insert(&new).map_err(store_error)?;
    tracing::info!(customer_id = %customer.id, "customer registered");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.customers.list().map_err(store_error)?;
    Ok(Json(customers))
}
