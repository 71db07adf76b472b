use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{PostgrestClient, StorageError};

use crate::models::{AccountError, LoginRequest, PublicUser, RegisterRequest, UserAccount};

pub struct AccountService {
    db: PostgrestClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Create a patient account. Emails are case-folded before the
    /// uniqueness check and before storage.
    pub async fn register(&self, request: RegisterRequest) -> Result<PublicUser, AccountError> {
        if request.name.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(AccountError::ValidationError(
                "Name, email and password are required".to_string(),
            ));
        }

        let email = request.email.trim().to_lowercase();
        debug!("Registering account for {}", email);

        let existing_path = format!("/rest/v1/users?email=eq.{}&select=id", email);
        let existing: Vec<Value> = self
            .db
            .request(Method::GET, &existing_path, None, None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(AccountError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to hash password: {}", e)))?
            .to_string();

        let user_data = json!({
            "name": request.name.trim(),
            "email": email,
            "password_hash": password_hash,
            "role": "user",
        });

        let result: Vec<Value> = self
            .db
            .request_returning(Method::POST, "/rest/v1/users", None, Some(user_data))
            .await
            .map_err(|e| match e {
                // The unique index on email catches the register race.
                StorageError::Conflict(_) => AccountError::EmailTaken,
                other => AccountError::DatabaseError(other.to_string()),
            })?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AccountError::DatabaseError("insert returned no row".to_string()))?;

        let account: UserAccount = serde_json::from_value(row)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e)))?;

        info!("Account {} registered", account.id);
        Ok(account.into())
    }

    /// Verify credentials. The same error covers an unknown email and a bad
    /// password so login probing reveals nothing.
    pub async fn login(&self, request: LoginRequest) -> Result<UserAccount, AccountError> {
        let email = request.email.trim().to_lowercase();
        debug!("Login attempt for {}", email);

        let path = format!("/rest/v1/users?email=eq.{}", email);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let row = match result.into_iter().next() {
            Some(row) => row,
            None => {
                warn!("Login failed for {}: unknown email", email);
                return Err(AccountError::InvalidCredentials);
            }
        };

        let account: UserAccount = serde_json::from_value(row)
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse user: {}", e)))?;

        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|e| AccountError::DatabaseError(format!("Stored hash is invalid: {}", e)))?;

        if Argon2::default()
            .verify_password(request.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            warn!("Login failed for {}: bad password", email);
            return Err(AccountError::InvalidCredentials);
        }

        info!("User {} logged in", account.id);
        Ok(account)
    }

    pub async fn list_users(&self, auth_token: &str) -> Result<Vec<PublicUser>, AccountError> {
        let result: Vec<Value> = self
            .db
            .request(
                Method::GET,
                "/rest/v1/users?select=id,name,email,role&order=name.asc",
                Some(auth_token),
                None,
            )
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<PublicUser>, _>>()
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse users: {}", e)))
    }

    /// Remove a patient account. Admin rows are never deleted through this
    /// path.
    pub async fn delete_user(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AccountError> {
        let lookup = format!("/rest/v1/users?id=eq.{}&select=id,role", user_id);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &lookup, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(AccountError::NotFound)?;

        if row["role"].as_str() == Some("admin") {
            return Err(AccountError::AdminProtected);
        }

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let deleted: Vec<Value> = self
            .db
            .request_returning(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AccountError::NotFound);
        }

        info!("User {} deleted", user_id);
        Ok(())
    }
}
