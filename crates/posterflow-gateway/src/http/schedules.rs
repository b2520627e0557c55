//! Schedule lifecycle endpoints.
//!
//! The create request expands the `categories × dates` cross product of each
//! entry into individual schedule records, all sharing the customer. Dates
//! accept RFC 3339 or a naive `YYYY-MM-DDTHH:MM[:SS]` interpreted in the
//! configured delivery timezone.
//!
//! `customerPhoneNumber` and `selectedPosterUrls` are part of the wire shape
//! and are accepted, but neither is persisted: the phone is resolved from the
//! customer record at dispatch time, and the media URL is derived from the
//! poster ID when the send happens.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use posterflow_store::{NewScheduleRecord, ScheduleRecord, ScheduleView, StoreError};

use crate::app::AppState;
use crate::http::{bad_request, message, not_found, store_error, ApiError, MessageBody};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub customer_id: String,
    #[serde(default)]
    pub customer_phone_number: Option<String>,
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub poster_id: String,
    pub categories: Vec<String>,
    pub dates: Vec<String>,
    #[serde(default)]
    pub selected_poster_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateScheduleResponse {
    pub message: String,
    pub schedules: Vec<ScheduleRecord>,
}

/// Expand the `categories × dates` cross product of every entry into
/// individual records, all sharing the request's customer.
fn expand_entries(
    req: &CreateScheduleRequest,
    window: &posterflow_scheduler::TickWindow,
) -> Result<Vec<NewScheduleRecord>, ApiError> {
    let mut entries = Vec::new();
    for item in &req.schedules {
        for category in &item.categories {
            for date in &item.dates {
                let scheduled_at = window
                    .parse_schedule_time(date)
                    .map_err(|e| bad_request(e.to_string()))?;
                entries.push(NewScheduleRecord {
                    customer_id: req.customer_id.clone(),
                    poster_id: item.poster_id.clone(),
                    category: category.clone(),
                    scheduled_at,
                });
            }
        }
    }
    Ok(entries)
}

/// POST /schedules/create — expand and persist a batch of schedule records.
pub async fn create_schedules(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<CreateScheduleResponse>), ApiError> {
    tracing::debug!(
        customer_id = %req.customer_id,
        phone = ?req.customer_phone_number,
        selected_urls = req
            .schedules
            .iter()
            .map(|s| s.selected_poster_urls.len())
            .sum::<usize>(),
        "create schedule request received"
    );

    if req.schedules.is_empty() {
        return Err(bad_request("Schedules must be a non-empty array"));
    }

    let entries = expand_entries(&req, &state.window)?;
    let created = state.schedules.insert_many(&entries).map_err(store_error)?;
    tracing::info!(count = created.len(), customer_id = %req.customer_id, "schedules created");

    Ok((
        StatusCode::CREATED,
        Json(CreateScheduleResponse {
            message: "Posters scheduled successfully".to_string(),
            schedules: created,
        }),
    ))
}

/// GET /schedules/ — all records with denormalized display names.
pub async fn list_schedules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScheduleView>>, ApiError> {
    let views = state.schedules.list_views().map_err(store_error)?;
    Ok(Json(views))
}

/// DELETE /schedules/{id}
pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    match state.schedules.delete_by_id(&id) {
        Ok(()) => Ok(message("Schedule deleted successfully")),
        Err(StoreError::NotFound { .. }) => Err(not_found("Schedule not found")),
        Err(e) => Err(store_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wire-shape tests: the camelCase field names are the contract the
    // (excluded) UI was built against and must never drift.

    #[test]
    fn create_request_parses_the_original_wire_shape() {
        let json = r#"{
            "customerId": "cust-1",
            "customerPhoneNumber": "9876543210",
            "schedules": [{
                "posterId": "poster-1",
                "categories": ["Offers", "Events"],
                "dates": ["2025-01-01T10:00"],
                "selectedPosterUrls": ["https://example.com/p1.jpg"]
            }]
        }"#;

        let req: CreateScheduleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.customer_id, "cust-1");
        assert_eq!(req.customer_phone_number.as_deref(), Some("9876543210"));
        assert_eq!(req.schedules.len(), 1);
        assert_eq!(req.schedules[0].categories, vec!["Offers", "Events"]);
        assert_eq!(req.schedules[0].dates, vec!["2025-01-01T10:00"]);
    }

    #[test]
    fn optional_wire_fields_may_be_absent() {
        let json = r#"{
            "customerId": "cust-1",
            "schedules": [{"posterId": "p", "categories": [], "dates": []}]
        }"#;
        let req: CreateScheduleRequest = serde_json::from_str(json).unwrap();
        assert!(req.customer_phone_number.is_none());
        assert!(req.schedules[0].selected_poster_urls.is_empty());
    }

    #[test]
    fn create_expands_categories_times_dates() {
        use posterflow_core::config::DeliveryConfig;
        use posterflow_scheduler::TickWindow;

        let req: CreateScheduleRequest = serde_json::from_str(
            r#"{
                "customerId": "cust-1",
                "schedules": [{
                    "posterId": "P",
                    "categories": ["Offers", "Events"],
                    "dates": ["2025-01-01T10:00"]
                }]
            }"#,
        )
        .unwrap();

        let window = TickWindow::from_config(&DeliveryConfig::default()).unwrap();
        let entries = expand_entries(&req, &window).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            (entries[0].poster_id.as_str(), entries[0].category.as_str()),
            ("P", "Offers")
        );
        assert_eq!(
            (entries[1].poster_id.as_str(), entries[1].category.as_str()),
            ("P", "Events")
        );
        assert!(entries.iter().all(|e| e.customer_id == "cust-1"));
        // Both combinations share the one parsed instant.
        assert_eq!(entries[0].scheduled_at, entries[1].scheduled_at);
    }

    #[test]
    fn invalid_date_rejects_the_whole_request() {
        use posterflow_core::config::DeliveryConfig;
        use posterflow_scheduler::TickWindow;

        let req: CreateScheduleRequest = serde_json::from_str(
            r#"{
                "customerId": "cust-1",
                "schedules": [{
                    "posterId": "P",
                    "categories": ["Offers"],
                    "dates": ["not-a-date"]
                }]
            }"#,
        )
        .unwrap();

        let window = TickWindow::from_config(&DeliveryConfig::default()).unwrap();
        assert!(expand_entries(&req, &window).is_err());
    }

    #[test]
    fn schedule_record_serializes_in_camel_case() {
        use chrono::{TimeZone, Utc};
        use posterflow_store::ScheduleStatus;

        let record = ScheduleRecord {
            id: "s1".into(),
            customer_id: "c1".into(),
            poster_id: "p1".into(),
            category: "Offers".into(),
            scheduled_at: Utc.with_ymd_and_hms(2025, 1, 1, 4, 30, 0).unwrap(),
            status: ScheduleStatus::Pending,
            created_at: "2025-01-01T00:00:00.000Z".into(),
            updated_at: "2025-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""customerId":"c1""#));
        assert!(json.contains(r#""posterId":"p1""#));
        assert!(json.contains(r#""scheduledAt":"#));
        assert!(json.contains(r#""status":"Pending""#));
    }
}
