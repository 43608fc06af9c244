use std::sync::Arc;

use agora_core::{ApiError, Role};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// A registered account. The password hash never leaves this module.
#[derive(Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory account store keyed by email, with a secondary id index.
///
/// Argon2 hashing and verification run on the blocking pool so a burst of
/// logins cannot stall the async runtime.
#[derive(Clone, Default)]
pub struct UserStore {
    by_email: Arc<DashMap<String, UserRecord>>,
    by_id: Arc<DashMap<String, String>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account. Fails if the email is already taken; the
    /// occupied-entry check and the insert happen under one shard lock, so
    /// two concurrent registrations of the same email cannot both succeed.
    pub async fn create(
        &self,
        email: String,
        password: String,
        role: Role,
        full_name: String,
    ) -> Result<UserRecord, ApiError> {
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            role,
            full_name,
            password_hash,
            created_at: Utc::now(),
        };

        match self.by_email.entry(email) {
            Entry::Occupied(_) => Err(ApiError::InvalidRequest(
                "email already registered".to_string(),
            )),
            Entry::Vacant(slot) => {
                self.by_id
                    .insert(record.id.clone(), record.email.clone());
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Check an email/password pair. Unknown email and wrong password produce
    /// the same error so responses do not reveal which accounts exist.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, ApiError> {
        let record = self
            .by_email
            .get(email)
            .map(|r| r.clone())
            .ok_or_else(|| ApiError::Unauthenticated("incorrect email or password".to_string()))?;

        let hash = record.password_hash.clone();
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?;

        if ok {
            Ok(record)
        } else {
            Err(ApiError::Unauthenticated(
                "incorrect email or password".to_string(),
            ))
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        let email = self.by_id.get(id)?;
        self.by_email.get(email.value()).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
