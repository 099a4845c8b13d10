//! CRUD operations over the TMF632 tables.
//!
//! Every read applies the active (`deleted = false`) predicate internally;
//! call sites never see soft-deleted rows. Multi-step mutations run inside a
//! transaction and roll back as a unit.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::api::types::{Characteristic, OrganizationCreate, TimePeriod};
use crate::db::entities::{authorized_user, characteristic, organization, time_period};
use crate::error::{Result, ServerError};

fn creation_failure(entity: &'static str, data: impl std::fmt::Debug, err: DbErr) -> ServerError {
    ServerError::CreationFailure {
        entity,
        data: format!("{data:?}"),
        reason: err.to_string(),
    }
}

// ============================================================================
// Time Period Operations
// ============================================================================

/// Fetch an active time period by id.
pub async fn get_time_period(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<time_period::Model>> {
    Ok(time_period::Entity::find()
        .filter(time_period::Column::Id.eq(id))
        .filter(time_period::Column::Deleted.eq(false))
        .one(db)
        .await?)
}

async fn insert_time_period<C: ConnectionTrait>(
    conn: &C,
    period: &TimePeriod,
) -> std::result::Result<time_period::Model, DbErr> {
    time_period::ActiveModel {
        start_date_time: Set(period.start_date_time),
        end_date_time: Set(period.end_date_time),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await
}

async fn soft_delete_time_period<C: ConnectionTrait>(
    conn: &C,
    time_period_id: i32,
) -> std::result::Result<(), DbErr> {
    let period = time_period::Entity::find()
        .filter(time_period::Column::Id.eq(time_period_id))
        .filter(time_period::Column::Deleted.eq(false))
        .one(conn)
        .await?;

    if let Some(period) = period {
        let mut active: time_period::ActiveModel = period.into();
        active.deleted = Set(true);
        active.update(conn).await?;
    }
    Ok(())
}

async fn permanently_delete_time_period<C: ConnectionTrait>(
    conn: &C,
    time_period_id: i32,
) -> std::result::Result<(), DbErr> {
    time_period::Entity::delete_many()
        .filter(time_period::Column::Id.eq(time_period_id))
        .exec(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Characteristic Operations
// ============================================================================

/// Fetch the active characteristics of an organization.
pub async fn get_characteristics_for_organization(
    db: &DatabaseConnection,
    organization_id: i32,
) -> Result<Vec<characteristic::Model>> {
    Ok(characteristic::Entity::find()
        .filter(characteristic::Column::Organization.eq(organization_id))
        .filter(characteristic::Column::Deleted.eq(false))
        .all(db)
        .await?)
}

async fn insert_characteristic<C: ConnectionTrait>(
    conn: &C,
    organization_id: i32,
    ch: &Characteristic,
) -> std::result::Result<characteristic::Model, DbErr> {
    characteristic::ActiveModel {
        name: Set(ch.name.clone()),
        value: Set(ch.value.clone()),
        value_type: Set(ch.value_type.clone()),
        organization: Set(organization_id),
        base_type: Set(None),
        schema_location: Set(None),
        schema_type: Set(None),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await
}

async fn soft_delete_characteristics<C: ConnectionTrait>(
    conn: &C,
    organization_id: i32,
) -> std::result::Result<(), DbErr> {
    let characteristics = characteristic::Entity::find()
        .filter(characteristic::Column::Organization.eq(organization_id))
        .filter(characteristic::Column::Deleted.eq(false))
        .all(conn)
        .await?;

    for ch in characteristics {
        let mut active: characteristic::ActiveModel = ch.into();
        active.deleted = Set(true);
        active.update(conn).await?;
    }
    Ok(())
}

async fn permanently_delete_characteristics<C: ConnectionTrait>(
    conn: &C,
    organization_id: i32,
) -> std::result::Result<(), DbErr> {
    characteristic::Entity::delete_many()
        .filter(characteristic::Column::Organization.eq(organization_id))
        .exec(conn)
        .await?;
    Ok(())
}

// ============================================================================
// Organization Operations
// ============================================================================

/// Fetch an active organization by id. Unknown or deleted ids yield
/// `Ok(None)`; callers translate that to an empty JSON object, not an error.
pub async fn get_organization_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<organization::Model>> {
    Ok(organization::Entity::find()
        .filter(organization::Column::Id.eq(id))
        .filter(organization::Column::Deleted.eq(false))
        .one(db)
        .await?)
}

/// Fetch all active organizations matching an exact-match filter map keyed by
/// TMF632 field name. Unknown filter keys are silently ignored.
pub async fn get_all_organizations(
    db: &DatabaseConnection,
    filters: &HashMap<String, String>,
) -> Result<Vec<organization::Model>> {
    let mut query =
        organization::Entity::find().filter(organization::Column::Deleted.eq(false));

    for (key, value) in filters {
        query = match key.as_str() {
            "href" => query.filter(organization::Column::Href.eq(value.clone())),
            "name" => query.filter(organization::Column::Name.eq(value.clone())),
            "nameType" => query.filter(organization::Column::NameType.eq(value.clone())),
            "organizationType" => {
                query.filter(organization::Column::OrganizationType.eq(value.clone()))
            }
            "tradingName" => query.filter(organization::Column::TradingName.eq(value.clone())),
            "status" => query.filter(organization::Column::Status.eq(value.clone())),
            "isHeadOffice" => match value.parse::<bool>() {
                Ok(flag) => query.filter(organization::Column::IsHeadOffice.eq(flag)),
                Err(_) => query,
            },
            "isLegalEntity" => match value.parse::<bool>() {
                Ok(flag) => query.filter(organization::Column::IsLegalEntity.eq(flag)),
                Err(_) => query,
            },
            "existsDuring" => match value.parse::<i32>() {
                Ok(id) => query.filter(organization::Column::ExistsDuring.eq(id)),
                Err(_) => query,
            },
            _ => query,
        };
    }

    Ok(query.all(db).await?)
}

async fn insert_organization_aggregate<C: ConnectionTrait>(
    conn: &C,
    payload: &OrganizationCreate,
) -> std::result::Result<organization::Model, DbErr> {
    let time_period_id = match &payload.exists_during {
        Some(period) => Some(insert_time_period(conn, period).await?.id),
        None => None,
    };

    let org = organization::ActiveModel {
        href: Set(payload.href.clone()),
        is_head_office: Set(payload.is_head_office),
        is_legal_entity: Set(payload.is_legal_entity),
        name: Set(payload.name.clone()),
        name_type: Set(payload.name_type.clone()),
        organization_type: Set(payload.organization_type.clone()),
        trading_name: Set(payload.trading_name.clone()),
        exists_during: Set(time_period_id),
        status: Set(payload.status.map(|s| s.as_str().to_string())),
        base_type: Set(None),
        schema_location: Set(None),
        schema_type: Set(None),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    // Children need the generated organization id
    if let Some(characteristics) = &payload.party_characteristic {
        for ch in characteristics {
            insert_characteristic(conn, org.id, ch).await?;
        }
    }

    Ok(org)
}

/// Create an organization, its time period and its characteristics in one
/// transaction. Any failure rolls everything back.
pub async fn create_organization(
    db: &DatabaseConnection,
    payload: &OrganizationCreate,
) -> Result<organization::Model> {
    let txn = db
        .begin()
        .await
        .map_err(|e| creation_failure("Organization", payload, e))?;

    match insert_organization_aggregate(&txn, payload).await {
        Ok(org) => {
            txn.commit()
                .await
                .map_err(|e| creation_failure("Organization", payload, e))?;
            tracing::info!("Organization created: {:?}", org);
            Ok(org)
        }
        Err(e) => {
            txn.rollback().await.ok();
            Err(creation_failure("Organization", payload, e))
        }
    }
}

async fn apply_organization_update<C: ConnectionTrait>(
    conn: &C,
    current: organization::Model,
    payload: &OrganizationCreate,
) -> std::result::Result<organization::Model, DbErr> {
    // A new time period replaces the old one wholesale: the previous row is
    // soft-deleted and a fresh row inserted, never mutated in place.
    let mut time_period_id = None;
    if let Some(period) = &payload.exists_during {
        if let Some(previous_id) = current.exists_during {
            soft_delete_time_period(conn, previous_id).await?;
        }
        time_period_id = Some(insert_time_period(conn, period).await?.id);
    }

    // Characteristics are also replaced wholesale rather than diffed.
    if let Some(characteristics) = &payload.party_characteristic {
        soft_delete_characteristics(conn, current.id).await?;
        for ch in characteristics {
            insert_characteristic(conn, current.id, ch).await?;
        }
    }

    let mut active: organization::ActiveModel = current.into();
    active.href = Set(payload.href.clone());
    active.is_head_office = Set(payload.is_head_office);
    active.is_legal_entity = Set(payload.is_legal_entity);
    active.name = Set(payload.name.clone());
    active.name_type = Set(payload.name_type.clone());
    active.organization_type = Set(payload.organization_type.clone());
    active.trading_name = Set(payload.trading_name.clone());
    active.exists_during = Set(time_period_id);
    active.status = Set(payload.status.map(|s| s.as_str().to_string()));
    active.base_type = Set(None);
    active.schema_location = Set(None);
    active.schema_type = Set(None);
    active.update(conn).await
}

/// Update an organization in place, replacing its time period and
/// characteristics when the payload supplies new ones.
pub async fn update_organization(
    db: &DatabaseConnection,
    organization_id: i32,
    payload: &OrganizationCreate,
) -> Result<organization::Model> {
    let current = get_organization_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ServerError::EntityNotFound {
            entity: "Organization",
            reason: format!("Organization with id={organization_id} doesn't exist"),
        })?;

    let txn = db
        .begin()
        .await
        .map_err(|e| creation_failure("Organization", payload, e))?;

    match apply_organization_update(&txn, current, payload).await {
        Ok(org) => {
            txn.commit()
                .await
                .map_err(|e| creation_failure("Organization", payload, e))?;
            tracing::info!("Organization updated: {:?}", org);
            Ok(org)
        }
        Err(e) => {
            txn.rollback().await.ok();
            Err(creation_failure("Organization", payload, e))
        }
    }
}

/// Soft-delete an organization, cascading to its time period and
/// characteristics so no orphan children stay active.
pub async fn delete_organization(db: &DatabaseConnection, organization_id: i32) -> Result<()> {
    let org = get_organization_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ServerError::EntityNotFound {
            entity: "Organization",
            reason: format!("Organization with id={organization_id} doesn't exist"),
        })?;

    let txn = db.begin().await?;

    if let Some(time_period_id) = org.exists_during {
        soft_delete_time_period(&txn, time_period_id).await?;
    }
    soft_delete_characteristics(&txn, org.id).await?;

    let organization_id = org.id;
    let mut active: organization::ActiveModel = org.into();
    active.deleted = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!("Organization deleted: id={}", organization_id);
    Ok(())
}

/// Physically remove an organization and its children.
pub async fn permanently_delete_organization(
    db: &DatabaseConnection,
    organization_id: i32,
) -> Result<()> {
    let org = get_organization_by_id(db, organization_id)
        .await?
        .ok_or_else(|| ServerError::EntityNotFound {
            entity: "Organization",
            reason: format!("Organization with id={organization_id} doesn't exist"),
        })?;

    let txn = db.begin().await?;

    if let Some(time_period_id) = org.exists_during {
        permanently_delete_time_period(&txn, time_period_id).await?;
    }
    permanently_delete_characteristics(&txn, org.id).await?;

    organization::Entity::delete_many()
        .filter(organization::Column::Id.eq(org.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!("Organization permanently deleted: id={}", organization_id);
    Ok(())
}

// ============================================================================
// Authorized User Operations
// ============================================================================

/// Grant an external identity access to an organization.
pub async fn create_authorized_user(
    db: &DatabaseConnection,
    user_id: &str,
    organization_id: i32,
) -> Result<authorized_user::Model> {
    let result = authorized_user::ActiveModel {
        user_id: Set(user_id.to_string()),
        organization: Set(organization_id),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await;

    match result {
        Ok(user) => {
            tracing::info!(
                "Authorized user created for organization (id={}): {:?}",
                organization_id,
                user
            );
            Ok(user)
        }
        Err(e) => Err(creation_failure(
            "AuthorizedUser",
            (user_id, organization_id),
            e,
        )),
    }
}

/// Fetch the active authorized users of an organization.
pub async fn get_authorized_users_for_organization(
    db: &DatabaseConnection,
    organization_id: i32,
) -> Result<Vec<authorized_user::Model>> {
    Ok(authorized_user::Entity::find()
        .filter(authorized_user::Column::Organization.eq(organization_id))
        .filter(authorized_user::Column::Deleted.eq(false))
        .all(db)
        .await?)
}

/// Fetch all active organizations a user is authorized for.
pub async fn get_authorized_organizations_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<organization::Model>> {
    let memberships = authorized_user::Entity::find()
        .filter(authorized_user::Column::UserId.eq(user_id))
        .filter(authorized_user::Column::Deleted.eq(false))
        .all(db)
        .await?;

    let mut organizations = Vec::with_capacity(memberships.len());
    for membership in memberships {
        if let Some(org) = get_organization_by_id(db, membership.organization).await? {
            organizations.push(org);
        }
    }
    Ok(organizations)
}

/// Revoke a user's access to every organization.
pub async fn delete_authorized_user(db: &DatabaseConnection, user_id: &str) -> Result<()> {
    let memberships = authorized_user::Entity::find()
        .filter(authorized_user::Column::UserId.eq(user_id))
        .filter(authorized_user::Column::Deleted.eq(false))
        .all(db)
        .await?;

    for membership in memberships {
        let mut active: authorized_user::ActiveModel = membership.into();
        active.deleted = Set(true);
        active.update(db).await?;
    }
    Ok(())
}

/// Revoke a user's access to a single organization.
pub async fn delete_authorized_user_for_organization(
    db: &DatabaseConnection,
    user_id: &str,
    organization_id: i32,
) -> Result<()> {
    let memberships = authorized_user::Entity::find()
        .filter(authorized_user::Column::UserId.eq(user_id))
        .filter(authorized_user::Column::Organization.eq(organization_id))
        .filter(authorized_user::Column::Deleted.eq(false))
        .all(db)
        .await?;

    for membership in memberships {
        let mut active: authorized_user::ActiveModel = membership.into();
        active.deleted = Set(true);
        active.update(db).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::OrganizationStatus;
    use chrono::{DateTime, Utc};
    use sea_orm::Database;

    async fn test_db() -> DatabaseConnection {
        // A single pooled connection keeps the in-memory database alive and
        // shared across queries.
        let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        crate::db::create_tables(&db).await.unwrap();
        db
    }

    fn testbed_payload(trading_name: &str) -> OrganizationCreate {
        OrganizationCreate {
            trading_name: Some(trading_name.to_string()),
            name: Some(format!("{trading_name}'s Testbed")),
            organization_type: Some("Testbed".to_string()),
            ..Default::default()
        }
    }

    fn period(start: &str, end: &str) -> TimePeriod {
        TimePeriod {
            start_date_time: Some(start.parse::<DateTime<Utc>>().unwrap()),
            end_date_time: Some(end.parse::<DateTime<Utc>>().unwrap()),
        }
    }

    fn characteristic(name: &str, value: &str, value_type: &str) -> Characteristic {
        Characteristic {
            name: name.to_string(),
            value: value.to_string(),
            value_type: Some(value_type.to_string()),
            base_type: None,
            schema_location: None,
            schema_type: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_organization() {
        let db = test_db().await;

        let created = create_organization(&db, &testbed_payload("XXX"))
            .await
            .unwrap();

        let fetched = get_organization_by_id(&db, created.id).await.unwrap();
        let fetched = fetched.unwrap();
        assert_eq!(fetched.trading_name.as_deref(), Some("XXX"));
        assert_eq!(fetched.name.as_deref(), Some("XXX's Testbed"));
        assert_eq!(fetched.organization_type.as_deref(), Some("Testbed"));
        assert!(!fetched.deleted);
    }

    #[tokio::test]
    async fn test_get_unknown_organization_returns_none() {
        let db = test_db().await;
        assert!(get_organization_by_id(&db, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_organization_with_children() {
        let db = test_db().await;

        let mut payload = testbed_payload("XXX");
        payload.exists_during = Some(period(
            "2015-10-22T08:31:52.026Z",
            "2016-10-22T08:31:52.026Z",
        ));
        payload.party_characteristic = Some(vec![
            characteristic("ci_cd_agent_url", "http://192.168.1.200:8080/", "URL"),
            characteristic("ci_cd_agent_username", "admin", "str"),
        ]);

        let created = create_organization(&db, &payload).await.unwrap();

        let stored_period = get_time_period(&db, created.exists_during.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored_period.start_date_time.unwrap().timestamp_micros(),
            payload
                .exists_during
                .as_ref()
                .unwrap()
                .start_date_time
                .unwrap()
                .timestamp_micros()
        );

        let characteristics = get_characteristics_for_organization(&db, created.id)
            .await
            .unwrap();
        assert_eq!(characteristics.len(), 2);
        assert_eq!(characteristics[0].name, "ci_cd_agent_url");
        assert_eq!(characteristics[1].value, "admin");
    }

    #[tokio::test]
    async fn test_filters_match_exactly_and_ignore_unknown_keys() {
        let db = test_db().await;
        create_organization(&db, &testbed_payload("XXX")).await.unwrap();
        create_organization(&db, &testbed_payload("YYY")).await.unwrap();

        let mut filters = HashMap::new();
        filters.insert("tradingName".to_string(), "XXX".to_string());
        // Unknown keys must be ignored rather than rejected
        filters.insert("noSuchColumn".to_string(), "whatever".to_string());

        let matched = get_all_organizations(&db, &filters).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].trading_name.as_deref(), Some("XXX"));

        let all = get_all_organizations(&db, &HashMap::new()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_characteristics_wholesale() {
        let db = test_db().await;

        let mut payload = testbed_payload("XXX");
        payload.party_characteristic = Some(vec![
            characteristic("ci_cd_agent_url", "http://192.168.1.200:8080/", "URL"),
            characteristic("ci_cd_agent_username", "admin", "str"),
        ]);
        let created = create_organization(&db, &payload).await.unwrap();

        let mut update = testbed_payload("XXX");
        update.party_characteristic =
            Some(vec![characteristic("ci_cd_agent_token", "s3cret", "str")]);
        update_organization(&db, created.id, &update).await.unwrap();

        let characteristics = get_characteristics_for_organization(&db, created.id)
            .await
            .unwrap();
        assert_eq!(characteristics.len(), 1);
        assert_eq!(characteristics[0].name, "ci_cd_agent_token");
        assert_eq!(characteristics[0].value, "s3cret");
    }

    #[tokio::test]
    async fn test_update_replaces_time_period() {
        let db = test_db().await;

        let mut payload = testbed_payload("XXX");
        payload.exists_during = Some(period(
            "2015-10-22T08:31:52.026Z",
            "2016-10-22T08:31:52.026Z",
        ));
        let created = create_organization(&db, &payload).await.unwrap();
        let old_period_id = created.exists_during.unwrap();

        let mut update = testbed_payload("XXX");
        update.exists_during = Some(period(
            "2020-01-01T00:00:00.000Z",
            "2021-01-01T00:00:00.000Z",
        ));
        let updated = update_organization(&db, created.id, &update).await.unwrap();

        let new_period_id = updated.exists_during.unwrap();
        assert_ne!(new_period_id, old_period_id);
        // Old row is soft-deleted, not mutated
        assert!(get_time_period(&db, old_period_id).await.unwrap().is_none());
        assert!(get_time_period(&db, new_period_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_organization_fails() {
        let db = test_db().await;
        let err = update_organization(&db, 999, &testbed_payload("XXX"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::EntityNotFound { .. }));
        assert!(err.to_string().contains("id=999"));
    }

    #[tokio::test]
    async fn test_update_preserves_status() {
        let db = test_db().await;
        let created = create_organization(&db, &testbed_payload("XXX"))
            .await
            .unwrap();

        let mut update = testbed_payload("XXX");
        update.status = Some(OrganizationStatus::Validated);
        let updated = update_organization(&db, created.id, &update).await.unwrap();
        assert_eq!(updated.status.as_deref(), Some("validated"));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_spares_siblings() {
        let db = test_db().await;

        let mut payload = testbed_payload("XXX");
        payload.exists_during = Some(period(
            "2015-10-22T08:31:52.026Z",
            "2016-10-22T08:31:52.026Z",
        ));
        payload.party_characteristic =
            Some(vec![characteristic("ci_cd_agent_username", "admin", "str")]);
        let doomed = create_organization(&db, &payload).await.unwrap();
        let sibling = create_organization(&db, &testbed_payload("YYY"))
            .await
            .unwrap();

        delete_organization(&db, doomed.id).await.unwrap();

        assert!(get_organization_by_id(&db, doomed.id)
            .await
            .unwrap()
            .is_none());
        assert!(get_time_period(&db, doomed.exists_during.unwrap())
            .await
            .unwrap()
            .is_none());
        assert!(get_characteristics_for_organization(&db, doomed.id)
            .await
            .unwrap()
            .is_empty());

        // Sibling created in the same session is untouched
        let sibling = get_organization_by_id(&db, sibling.id).await.unwrap();
        assert!(sibling.is_some());
        assert!(!sibling.unwrap().deleted);
    }

    #[tokio::test]
    async fn test_delete_unknown_organization_reports_id() {
        let db = test_db().await;
        let err = delete_organization(&db, 42).await.unwrap_err();
        assert!(matches!(err, ServerError::EntityNotFound { .. }));
        assert!(err.to_string().contains("id=42"));
    }

    #[tokio::test]
    async fn test_permanent_delete_removes_rows() {
        let db = test_db().await;

        let mut payload = testbed_payload("XXX");
        payload.exists_during = Some(period(
            "2015-10-22T08:31:52.026Z",
            "2016-10-22T08:31:52.026Z",
        ));
        payload.party_characteristic =
            Some(vec![characteristic("ci_cd_agent_username", "admin", "str")]);
        let created = create_organization(&db, &payload).await.unwrap();

        permanently_delete_organization(&db, created.id).await.unwrap();

        assert!(get_organization_by_id(&db, created.id)
            .await
            .unwrap()
            .is_none());
        let remaining = characteristic::Entity::find()
            .filter(characteristic::Column::Organization.eq(created.id))
            .all(&db)
            .await
            .unwrap();
        assert!(remaining.is_empty());
        let remaining_periods = time_period::Entity::find()
            .filter(time_period::Column::Id.eq(created.exists_during.unwrap()))
            .all(&db)
            .await
            .unwrap();
        assert!(remaining_periods.is_empty());
    }

    #[tokio::test]
    async fn test_authorized_user_lifecycle() {
        let db = test_db().await;
        let org_a = create_organization(&db, &testbed_payload("XXX"))
            .await
            .unwrap();
        let org_b = create_organization(&db, &testbed_payload("YYY"))
            .await
            .unwrap();

        create_authorized_user(&db, "user-1", org_a.id).await.unwrap();
        create_authorized_user(&db, "user-1", org_b.id).await.unwrap();
        create_authorized_user(&db, "user-2", org_a.id).await.unwrap();

        let members = get_authorized_users_for_organization(&db, org_a.id)
            .await
            .unwrap();
        assert_eq!(members.len(), 2);

        let organizations = get_authorized_organizations_for_user(&db, "user-1")
            .await
            .unwrap();
        assert_eq!(organizations.len(), 2);

        delete_authorized_user_for_organization(&db, "user-1", org_a.id)
            .await
            .unwrap();
        let members = get_authorized_users_for_organization(&db, org_a.id)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "user-2");

        // Removal scoped to all organizations at once
        delete_authorized_user(&db, "user-1").await.unwrap();
        assert!(get_authorized_organizations_for_user(&db, "user-1")
            .await
            .unwrap()
            .is_empty());
    }
}
