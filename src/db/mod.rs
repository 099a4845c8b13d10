//! Database module for SQLite persistence using SeaORM

pub mod entities;
pub mod repo;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;

    create_tables(&db).await?;

    Ok(db)
}

/// Create all tables if they don't exist
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Time periods table. Datetimes are stored as RFC 3339 text so
    // microsecond precision survives the round trip.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS time_periods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_date_time TEXT,
            end_date_time TEXT,
            deleted INTEGER NOT NULL DEFAULT 0
        )
        "#
        .to_string(),
    ))
    .await?;

    // Organizations table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            href TEXT,
            is_head_office INTEGER,
            is_legal_entity INTEGER,
            name TEXT,
            name_type TEXT,
            organization_type TEXT,
            trading_name TEXT,
            exists_during INTEGER,
            status TEXT DEFAULT 'initialized',
            base_type TEXT,
            schema_location TEXT,
            schema_type TEXT,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (exists_during) REFERENCES time_periods(id)
        )
        "#
        .to_string(),
    ))
    .await?;

    // Characteristics table (child collection of organizations)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS characteristics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            value TEXT NOT NULL,
            value_type TEXT,
            organization INTEGER NOT NULL,
            base_type TEXT,
            schema_location TEXT,
            schema_type TEXT,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (organization) REFERENCES organizations(id)
        )
        "#
        .to_string(),
    ))
    .await?;

    // Create index for characteristic lookups
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_characteristics_org ON characteristics(organization)"#
            .to_string(),
    ))
    .await?;

    // Authorized users table (links IdP subjects to organizations)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS authorized_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            organization INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (organization) REFERENCES organizations(id)
        )
        "#
        .to_string(),
    ))
    .await?;

    // Create indexes for authorized user lookups
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_authorized_users_org ON authorized_users(organization)"#
            .to_string(),
    ))
    .await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"CREATE INDEX IF NOT EXISTS idx_authorized_users_user ON authorized_users(user_id)"#
            .to_string(),
    ))
    .await?;

    tracing::info!("Database tables initialized");
    Ok(())
}
