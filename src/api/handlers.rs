//! TMF632 request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;

use super::auth::{self, IdpConfig};
use super::types::{
    filter_organization_fields, AuthorizedUser, Organization, OrganizationAuthorizedUsers,
    OrganizationCreate, OrganizationStatus, ORGANIZATION_FIELDS,
};
use crate::db::entities::organization;
use crate::db::repo;
use crate::error::{Result, ServerError};

/// Shared application state
pub struct AppState {
    pub db: DatabaseConnection,
    pub idp: IdpConfig,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Assemble the API representation of an organization, fetching its time
/// period and characteristics.
async fn organization_response(
    db: &DatabaseConnection,
    org: &organization::Model,
) -> Result<Organization> {
    let exists_during = match org.exists_during {
        Some(id) => repo::get_time_period(db, id).await?,
        None => None,
    };
    let characteristics = repo::get_characteristics_for_organization(db, org.id).await?;
    Ok(Organization::from_parts(org, exists_during, characteristics))
}

/// Parse and validate the `fields` query parameter. Every comma-separated
/// entry must name a known Organization field.
fn parse_fields_param(raw: Option<&str>) -> Result<Option<Vec<String>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let fields: Vec<String> = raw.split(',').map(|f| f.trim().to_string()).collect();
    for field in &fields {
        if !ORGANIZATION_FIELDS.contains(&field.as_str()) {
            return Err(ServerError::Validation(format!(
                "unknown field '{field}' in 'fields' query parameter"
            )));
        }
    }
    Ok(Some(fields))
}

/// Reject status filters outside the lifecycle enum.
fn validate_filters(filters: &HashMap<String, String>) -> Result<()> {
    if let Some(status) = filters.get("status") {
        if OrganizationStatus::parse(status).is_none() {
            return Err(ServerError::Validation(format!(
                "invalid status filter '{status}'"
            )));
        }
    }
    Ok(())
}

/// Deserialize a JSON body into the expected payload shape, reporting
/// mismatches as a 400 validation failure rather than an unhandled fault.
fn parse_payload<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| ServerError::Validation(e.to_string()))
}

async fn authorized_users_response(
    db: &DatabaseConnection,
    organization_id: i32,
) -> Result<OrganizationAuthorizedUsers> {
    let users = repo::get_authorized_users_for_organization(db, organization_id).await?;
    Ok(OrganizationAuthorizedUsers {
        organization_id: organization_id.to_string(),
        authorized_users: users
            .into_iter()
            .map(|u| AuthorizedUser { user_id: u.user_id })
            .collect(),
    })
}

/// Fetch an organization that must exist, or fail with entity-not-found.
async fn require_organization(
    db: &DatabaseConnection,
    organization_id: i32,
) -> Result<organization::Model> {
    repo::get_organization_by_id(db, organization_id)
        .await?
        .ok_or(ServerError::EntityNotFound {
            entity: "Organization",
            reason: "The requested organization doesn't exist.".to_string(),
        })
}

// ============================================================================
// Organization Handlers
// ============================================================================

/// POST /organization/ - Create an organization
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.admin_role)?;
    tracing::info!(
        "User {} is trying to create a new organization",
        claims.username()
    );

    let payload: OrganizationCreate = parse_payload(body)?;
    let org = repo::create_organization(&state.db, &payload).await?;
    let schema = organization_response(&state.db, &org).await?;

    tracing::info!(
        "User {} created organization with id {}",
        claims.username(),
        org.id
    );
    Ok((StatusCode::CREATED, Json(schema)).into_response())
}

/// GET /organization/ - List organizations (with query filters)
/// GET /organization/:id - Get a single organization
///
/// One handler registered on both routes. A request for an unknown id
/// deliberately yields 200 with an empty JSON object, not 404; this mirrors
/// the behavior clients of this API already depend on, non-standard as it is.
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    id: Option<Path<i32>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.testbed_admin_role)?;

    let mut params = params;
    let fields = parse_fields_param(params.remove("fields").as_deref())?;

    if let Some(Path(id)) = id {
        tracing::info!(
            "User {} is requesting organization with id={}",
            claims.username(),
            id
        );

        let Some(org) = repo::get_organization_by_id(&state.db, id).await? else {
            return Ok((StatusCode::OK, Json(serde_json::json!({}))).into_response());
        };

        auth::check_organization_access(&state.db, &state.idp, &claims, org.id).await?;

        let schema = organization_response(&state.db, &org).await?;
        let encoded = filter_organization_fields(fields.as_deref(), serde_json::to_value(schema)?);
        Ok((StatusCode::OK, Json(encoded)).into_response())
    } else {
        tracing::info!(
            "User {} is requesting all organizations",
            claims.username()
        );

        validate_filters(&params)?;
        let organizations = repo::get_all_organizations(&state.db, &params).await?;

        let mut encoded = Vec::with_capacity(organizations.len());
        for org in &organizations {
            let schema = organization_response(&state.db, org).await?;
            encoded.push(filter_organization_fields(
                fields.as_deref(),
                serde_json::to_value(schema)?,
            ));
        }
        Ok((StatusCode::OK, Json(serde_json::Value::Array(encoded))).into_response())
    }
}

/// PATCH /organization/:id - Update an organization
pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.testbed_admin_role)?;
    tracing::info!(
        "User {} is trying to patch organization with id={}",
        claims.username(),
        id
    );

    // The per-organization check only applies when the target exists; a
    // missing id falls through to the entity-not-found failure below.
    if let Some(current) = repo::get_organization_by_id(&state.db, id).await? {
        auth::check_organization_access(&state.db, &state.idp, &claims, current.id).await?;
    }

    let payload: OrganizationCreate = parse_payload(body)?;
    let updated = repo::update_organization(&state.db, id, &payload).await?;
    let schema = organization_response(&state.db, &updated).await?;

    tracing::info!(
        "User {} patched organization with id={}",
        claims.username(),
        id
    );
    Ok((StatusCode::OK, Json(schema)).into_response())
}

/// DELETE /organization/:id - Soft-delete an organization
pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.admin_role)?;
    tracing::info!(
        "User {} is trying to delete organization with id={}",
        claims.username(),
        id
    );

    repo::delete_organization(&state.db, id).await?;

    tracing::info!(
        "User {} deleted organization with id={}",
        claims.username(),
        id
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Authorized User Handlers
// ============================================================================

/// GET /organization/:id/authorized-users - List an organization's
/// authorized users
pub async fn get_organization_authorized_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.testbed_admin_role)?;

    let org = require_organization(&state.db, id).await?;
    auth::check_organization_access(&state.db, &state.idp, &claims, org.id).await?;

    let response = authorized_users_response(&state.db, org.id).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// POST /organization/:id/authorized-users - Grant a user access to an
/// organization
pub async fn create_organization_authorized_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.testbed_admin_role)?;

    let org = require_organization(&state.db, id).await?;
    auth::check_organization_access(&state.db, &state.idp, &claims, org.id).await?;

    let new_user: AuthorizedUser = parse_payload(body)?;
    repo::create_authorized_user(&state.db, &new_user.user_id, org.id).await?;

    tracing::info!(
        "User {} granted {} access to organization with id={}",
        claims.username(),
        new_user.user_id,
        id
    );

    let response = authorized_users_response(&state.db, org.id).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// DELETE /organization/:id/authorized-users/:user_id - Revoke a user's
/// access to an organization
pub async fn delete_organization_authorized_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(i32, String)>,
) -> Result<Response> {
    let claims = auth::require_role(&headers, &state.idp, &state.idp.testbed_admin_role)?;

    let org = require_organization(&state.db, id).await?;
    auth::check_organization_access(&state.db, &state.idp, &claims, org.id).await?;

    repo::delete_authorized_user_for_organization(&state.db, &user_id, org.id).await?;

    tracing::info!(
        "User {} revoked {}'s access to organization with id={}",
        claims.username(),
        user_id,
        id
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}
