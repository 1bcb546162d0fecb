//! Typed parameter objects, one per operation.
//!
//! Every field is optional and serializes only when set, so the resulting
//! mapping carries exactly the fields the caller supplied. `Some(false)`,
//! `Some(0)` and `Some(vec![])` are explicit values and are sent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EmsError, Result};
use crate::request::Params;

/// Conversion into the executor's parameter mapping.
pub trait ToParams {
    fn to_params(&self) -> Result<Params>;
}

impl<T: Serialize> ToParams for T {
    fn to_params(&self) -> Result<Params> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(EmsError::configuration(format!(
                "parameters must serialize to an object, got {other}"
            ))),
            Err(e) => Err(EmsError::configuration(format!(
                "parameters could not be serialized: {e}"
            ))),
        }
    }
}

/// Paging plus free-text search: areas, buildings, categories, groups,
/// setup types and web users.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

/// Paging only.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_on_web: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_web_request: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

/// Filters for `GET bookings`. `web_user_id` is required by the API.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsParams {
    pub web_user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_reserve_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reserve_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_event_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_bookings_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_component_rooms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_override_description_rooms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_profile_id: Option<i64>,
}

/// Request payload for `POST bookings/actions/search`.
///
/// If `web_user_id` is omitted and a user token is in use, the API uses the
/// token's user. `user_bookings_only` defaults server-side to `true` for user
/// tokens and `false` for client tokens.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBookingsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_override_description_rooms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_component_rooms: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_profile_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reserve_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_reserve_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_event_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udf_search: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_bookings_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_user_id: Option<i64>,
}

/// Request payload for `POST reservations/actions/create`.
///
/// `send_confirmation` travels in the query string. Fields the API accepts
/// beyond the named ones go in `extra` and are sent in the body verbatim.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_confirmation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookings: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_defined_fields: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_absent() {
        let params = SearchParams {
            page: Some(2),
            ..Default::default()
        }
        .to_params()
        .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("page"), Some(&json!(2)));
        assert!(SearchParams::default().to_params().unwrap().is_empty());
    }

    #[test]
    fn zero_values_are_present() {
        let params = SearchBookingsParams {
            include_cancelled: Some(false),
            kiosk_profile_id: Some(0),
            building_ids: Some(vec![]),
            search_text: Some(String::new()),
            ..Default::default()
        }
        .to_params()
        .unwrap();
        assert_eq!(params.get("includeCancelled"), Some(&json!(false)));
        assert_eq!(params.get("kioskProfileId"), Some(&json!(0)));
        assert_eq!(params.get("buildingIds"), Some(&json!([])));
        assert_eq!(params.get("searchText"), Some(&json!("")));
        assert!(!params.contains_key("statusIds"));
    }

    #[test]
    fn field_names_are_camel_case() {
        let params = ListBookingsParams {
            web_user_id: 7,
            exclude_override_description_rooms: Some(true),
            ..Default::default()
        }
        .to_params()
        .unwrap();
        assert_eq!(params.get("webUserId"), Some(&json!(7)));
        assert_eq!(params.get("excludeOverrideDescriptionRooms"), Some(&json!(true)));
    }

    #[test]
    fn reservation_extra_fields_are_flattened() {
        let mut extra = Map::new();
        extra.insert("reservationSummary".into(), json!("Board meeting"));
        let params = CreateReservationParams {
            send_confirmation: Some(true),
            event_name: Some("Kickoff".into()),
            extra,
            ..Default::default()
        }
        .to_params()
        .unwrap();
        assert_eq!(params.get("sendConfirmation"), Some(&json!(true)));
        assert_eq!(params.get("eventName"), Some(&json!("Kickoff")));
        assert_eq!(params.get("reservationSummary"), Some(&json!("Board meeting")));
    }
}
