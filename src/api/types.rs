//! TMF632 API types and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{characteristic, organization, time_period};

// ============================================================================
// Request Types
// ============================================================================

/// POST /organization/ and PATCH /organization/{id} request body
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCreate {
    pub href: Option<String>,
    pub is_head_office: Option<bool>,
    pub is_legal_entity: Option<bool>,
    pub name: Option<String>,
    pub name_type: Option<String>,
    pub organization_type: Option<String>,
    pub trading_name: Option<String>,
    pub exists_during: Option<TimePeriod>,
    pub party_characteristic: Option<Vec<Characteristic>>,
    pub status: Option<OrganizationStatus>,
}

/// POST /organization/{id}/authorized-users request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub user_id: String,
}

// ============================================================================
// Response Types
// ============================================================================

/// Lifecycle status of an Organization. One-way: there is no endpoint that
/// resurrects a closed or deleted organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    Initialized,
    Validated,
    Closed,
}

impl OrganizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Initialized => "initialized",
            OrganizationStatus::Validated => "validated",
            OrganizationStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initialized" => Some(OrganizationStatus::Initialized),
            "validated" => Some(OrganizationStatus::Validated),
            "closed" => Some(OrganizationStatus::Closed),
            _ => None,
        }
    }
}

/// TMF632 TimePeriod sub-entity (used in both requests and responses)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
}

impl From<time_period::Model> for TimePeriod {
    fn from(model: time_period::Model) -> Self {
        Self {
            start_date_time: model.start_date_time,
            end_date_time: model.end_date_time,
        }
    }
}

/// TMF632 Characteristic sub-entity (used in both requests and responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristic {
    pub name: String,
    pub value: String,
    pub value_type: Option<String>,
    #[serde(rename = "@baseType", skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(rename = "@schemaLocation", skip_serializing_if = "Option::is_none")]
    pub schema_location: Option<String>,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
}

impl From<characteristic::Model> for Characteristic {
    fn from(model: characteristic::Model) -> Self {
        Self {
            name: model.name,
            value: model.value,
            value_type: model.value_type,
            base_type: model.base_type,
            schema_location: model.schema_location,
            schema_type: model.schema_type,
        }
    }
}

/// TMF632 Organization resource, as returned by the API.
///
/// All top-level keys are always serialized (null when absent) so that the
/// `fields` allow-list filter operates on the full key set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Option<i32>,
    pub href: Option<String>,
    pub is_head_office: Option<bool>,
    pub is_legal_entity: Option<bool>,
    pub name: Option<String>,
    pub name_type: Option<String>,
    pub organization_type: Option<String>,
    pub trading_name: Option<String>,
    pub exists_during: Option<TimePeriod>,
    pub party_characteristic: Vec<Characteristic>,
    pub status: Option<OrganizationStatus>,
    #[serde(rename = "@baseType")]
    pub base_type: Option<String>,
    #[serde(rename = "@schemaLocation")]
    pub schema_location: Option<String>,
    #[serde(rename = "@type")]
    pub schema_type: Option<String>,
}

/// JSON keys of the Organization resource, used to validate the `fields`
/// query parameter.
pub const ORGANIZATION_FIELDS: &[&str] = &[
    "id",
    "href",
    "isHeadOffice",
    "isLegalEntity",
    "name",
    "nameType",
    "organizationType",
    "tradingName",
    "existsDuring",
    "partyCharacteristic",
    "status",
    "@baseType",
    "@schemaLocation",
    "@type",
];

impl Organization {
    /// Assemble the API shape from an organization row and its separately
    /// fetched sub-entities.
    pub fn from_parts(
        org: &organization::Model,
        exists_during: Option<time_period::Model>,
        characteristics: Vec<characteristic::Model>,
    ) -> Self {
        Self {
            id: Some(org.id),
            href: org.href.clone(),
            is_head_office: org.is_head_office,
            is_legal_entity: org.is_legal_entity,
            name: org.name.clone(),
            name_type: org.name_type.clone(),
            organization_type: org.organization_type.clone(),
            trading_name: org.trading_name.clone(),
            exists_during: exists_during.map(TimePeriod::from),
            party_characteristic: characteristics
                .into_iter()
                .map(Characteristic::from)
                .collect(),
            status: org.status.as_deref().and_then(OrganizationStatus::parse),
            base_type: org.base_type.clone(),
            schema_location: org.schema_location.clone(),
            schema_type: org.schema_type.clone(),
        }
    }
}

/// GET /organization/{id}/authorized-users response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationAuthorizedUsers {
    pub organization_id: String,
    pub authorized_users: Vec<AuthorizedUser>,
}

// ============================================================================
// Field Filtering
// ============================================================================

/// Apply a `fields` allow-list to the JSON-encoded organization, removing
/// every top-level key not present in the list.
///
/// Unknown names in the allow-list are tolerated: they simply match nothing.
/// `None` leaves the value untouched.
pub fn filter_organization_fields(
    allowed_fields: Option<&[String]>,
    mut organization: serde_json::Value,
) -> serde_json::Value {
    if let Some(allowed) = allowed_fields {
        if let Some(object) = organization.as_object_mut() {
            object.retain(|key, _| allowed.iter().any(|field| field == key));
        }
    }
    organization
}
