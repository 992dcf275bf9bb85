use argon2::password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHash};
use chrono::{TimeDelta, Utc};
use diesel::{insert_into, prelude::*, PgConnection};
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::AdminUser;
use crate::{schema, ServiceError};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    exp: usize,
    iat: usize,
    sub: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires: TimeDelta,
}

impl TokenIssuer {
    pub fn new(secret_key: &str, access_token_expires: TimeDelta) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_ref()),
            decoding_key: DecodingKey::from_secret(secret_key.as_ref()),
            access_token_expires,
        }
    }

    pub fn issue(&self, admin_id: Uuid) -> Result<TokenResponse, ServiceError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.access_token_expires)
            .ok_or_else(|| ServiceError::Internal("Token lifetime is out of range".to_string()))?;
        let claims = Claims {
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            sub: admin_id.to_string(),
        };
        let access_token =
            jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
                .map_err(|e| ServiceError::Internal(format!("Cannot issue token: {e}")))?;

        Ok(TokenResponse {
            token_type: "bearer".to_string(),
            access_token,
            expires_in: self.access_token_expires.num_seconds(),
        })
    }

    /// Returns the admin id carried by a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<Uuid, ServiceError> {
        let token = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &jsonwebtoken::Validation::default(),
        )
        .map_err(|_| ServiceError::Unauthorized)?;

        Uuid::parse_str(&token.claims.sub).map_err(|_| ServiceError::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Cannot hash password: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn create_admin(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
) -> Result<AdminUser, ServiceError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ServiceError::invalid("Username is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let admin = AdminUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: hash_password(password)?,
        created_at: Utc::now(),
    };
    insert_into(schema::admin_users::table)
        .values(&admin)
        .execute(conn)?;
    info!(admin_id = %admin.id, username = %admin.username, "admin user created");
    Ok(admin)
}

pub fn authenticate(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
) -> Result<AdminUser, ServiceError> {
    let admin = schema::admin_users::table
        .filter(schema::admin_users::username.eq(username.trim()))
        .select(AdminUser::as_select())
        .first(conn)
        .optional()?;

    match admin {
        Some(admin) if verify_password(password, &admin.password_hash) => Ok(admin),
        _ => {
            warn!(username, "failed admin login");
            Err(ServiceError::Unauthorized)
        }
    }
}

pub fn get_admin(conn: &mut PgConnection, admin_id: Uuid) -> Result<AdminUser, ServiceError> {
    schema::admin_users::table
        .find(admin_id)
        .select(AdminUser::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_token() {
        let issuer = TokenIssuer::new("test-secret", TimeDelta::hours(1));
        let admin_id = Uuid::new_v4();
        let token = issuer.issue(admin_id).unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(issuer.verify(&token.access_token).unwrap(), admin_id);
    }

    #[test]
    fn test_verify_rejects_foreign_secret() {
        let issuer = TokenIssuer::new("test-secret", TimeDelta::hours(1));
        let other = TokenIssuer::new("other-secret", TimeDelta::hours(1));
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(
            issuer.verify(&token.access_token),
            Err(ServiceError::Unauthorized)
        ));
        assert!(issuer.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let issuer = TokenIssuer::new("test-secret", TimeDelta::hours(-2));
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(issuer.verify(&token.access_token).is_err());
    }

    #[test]
    fn test_issue_with_out_of_range_lifetime_fails() {
        let issuer = TokenIssuer::new("test-secret", TimeDelta::MAX);
        assert!(matches!(
            issuer.issue(Uuid::new_v4()),
            Err(ServiceError::Internal(_))
        ));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }
}
