//! Authentication and authorization module.
//!
//! Bearer tokens are issued by an external identity provider; this module
//! only validates them (signature, expiry, issuer) and checks role claims.
//! Fine-grained access is decided against an organization's authorized-user
//! list: global admins pass unconditionally, everyone else must appear in it.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::db::repo;
use crate::error::{Result, ServerError};

/// Identity-provider settings, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Shared secret used to verify HS256 token signatures.
    pub client_secret: String,
    /// Expected `iss` claim; skipped when unset.
    pub issuer: Option<String>,
    /// Role granting unrestricted access to every organization.
    pub admin_role: String,
    /// Role required for read/update endpoints.
    pub testbed_admin_role: String,
}

/// Realm roles as asserted by a Keycloak-style identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims carried in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user's opaque identity string.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: RealmAccess,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.realm_access.roles.iter().any(|r| r == role)
    }

    /// Display name for log lines.
    pub fn username(&self) -> &str {
        self.preferred_username.as_deref().unwrap_or(&self.sub)
    }
}

/// Decode and verify a bearer token against the IdP configuration.
pub fn decode_claims(token: &str, idp: &IdpConfig) -> Result<Claims> {
    let key = DecodingKey::from_secret(idp.client_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = &idp.issuer {
        validation.set_issuer(&[issuer]);
    }

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServerError::InvalidToken("token expired".to_string())
            }
            _ => ServerError::InvalidToken(e.to_string()),
        })
}

/// Extract the bearer token from the Authorization header, validate it, and
/// require the given role.
pub fn require_role(headers: &HeaderMap, idp: &IdpConfig, role: &str) -> Result<Claims> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(ServerError::AuthRequired)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ServerError::AuthRequired)?;

    let claims = decode_claims(token, idp)?;

    if !claims.has_role(role) {
        return Err(ServerError::RoleMissing(role.to_string()));
    }

    Ok(claims)
}

/// Check whether the requester may access a specific organization's data.
///
/// Global admins always pass. Otherwise the token subject must be one of the
/// organization's active authorized users.
pub async fn check_organization_access(
    db: &DatabaseConnection,
    idp: &IdpConfig,
    claims: &Claims,
    organization_id: i32,
) -> Result<()> {
    if claims.has_role(&idp.admin_role) {
        return Ok(());
    }

    let authorized_users = repo::get_authorized_users_for_organization(db, organization_id).await?;
    if authorized_users.iter().any(|u| u.user_id == claims.sub) {
        Ok(())
    } else {
        Err(ServerError::ForbiddenOrganization(organization_id))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    pub const TEST_SECRET: &str = "test-client-secret";

    pub fn test_idp() -> IdpConfig {
        IdpConfig {
            client_secret: TEST_SECRET.to_string(),
            issuer: None,
            admin_role: "admin".to_string(),
            testbed_admin_role: "testbed-admin".to_string(),
        }
    }

    pub fn mint_token(sub: &str, roles: &[&str]) -> String {
        mint_token_with_expiry(sub, roles, chrono::Utc::now().timestamp() + 3600)
    }

    pub fn mint_token_with_expiry(sub: &str, roles: &[&str], exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            preferred_username: Some(sub.to_string()),
            realm_access: RealmAccess {
                roles: roles.iter().map(|r| r.to_string()).collect(),
            },
            iss: None,
            exp,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::http::HeaderValue;

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_require_role_accepts_valid_token() {
        let idp = test_idp();
        let token = mint_token("user-1", &["testbed-admin"]);
        let claims = require_role(&bearer_headers(&token), &idp, "testbed-admin").unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username(), "user-1");
    }

    #[test]
    fn test_require_role_rejects_missing_header() {
        let idp = test_idp();
        let err = require_role(&HeaderMap::new(), &idp, "testbed-admin").unwrap_err();
        assert!(matches!(err, ServerError::AuthRequired));
    }

    #[test]
    fn test_require_role_rejects_missing_role() {
        let idp = test_idp();
        let token = mint_token("user-1", &["some-other-role"]);
        let err = require_role(&bearer_headers(&token), &idp, "testbed-admin").unwrap_err();
        assert!(matches!(err, ServerError::RoleMissing(_)));
    }

    #[test]
    fn test_require_role_rejects_expired_token() {
        let idp = test_idp();
        let token = mint_token_with_expiry(
            "user-1",
            &["testbed-admin"],
            chrono::Utc::now().timestamp() - 3600,
        );
        let err = require_role(&bearer_headers(&token), &idp, "testbed-admin").unwrap_err();
        assert!(matches!(err, ServerError::InvalidToken(_)));
    }

    #[test]
    fn test_require_role_rejects_tampered_token() {
        let idp = test_idp();
        let mut token = mint_token("user-1", &["testbed-admin"]);
        token.push('x');
        let err = require_role(&bearer_headers(&token), &idp, "testbed-admin").unwrap_err();
        assert!(matches!(err, ServerError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_check_organization_access() {
        let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = sea_orm::Database::connect(options).await.unwrap();
        crate::db::create_tables(&db).await.unwrap();
        let idp = test_idp();

        let org = repo::create_organization(&db, &Default::default())
            .await
            .unwrap();

        let admin = decode_claims(&mint_token("root", &["admin"]), &idp).unwrap();
        let outsider = decode_claims(&mint_token("user-1", &["testbed-admin"]), &idp).unwrap();

        // Admin role bypasses the membership check
        check_organization_access(&db, &idp, &admin, org.id)
            .await
            .unwrap();

        // Non-member is rejected with the organization id in the error
        let err = check_organization_access(&db, &idp, &outsider, org.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ForbiddenOrganization(id) if id == org.id));

        // Granting access flips the outcome
        repo::create_authorized_user(&db, "user-1", org.id)
            .await
            .unwrap();
        check_organization_access(&db, &idp, &outsider, org.id)
            .await
            .unwrap();
    }
}
