use agora_core::{ApiError, Role};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{Claims, TokenPair};
use crate::revocation::{now_secs, RevocationList};
use crate::settings::Settings;

/// Issues and checks the two token families. Access and refresh tokens are
/// signed with separate secrets, so a refresh token can never pass an access
/// check or vice versa.
#[derive(Clone)]
pub struct TokenService {
    access_enc: EncodingKey,
    access_dec: DecodingKey,
    refresh_enc: EncodingKey,
    refresh_dec: DecodingKey,
    access_ttl: u64,
    refresh_ttl: u64,
    validation: Validation,
    revoked: RevocationList,
}

impl TokenService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            access_enc: EncodingKey::from_secret(settings.access_secret.as_bytes()),
            access_dec: DecodingKey::from_secret(settings.access_secret.as_bytes()),
            refresh_enc: EncodingKey::from_secret(settings.refresh_secret.as_bytes()),
            refresh_dec: DecodingKey::from_secret(settings.refresh_secret.as_bytes()),
            access_ttl: settings.access_ttl_secs,
            refresh_ttl: settings.refresh_ttl_secs,
            validation: Validation::new(Algorithm::HS256),
            revoked: RevocationList::new(),
        }
    }

    /// Mint a fresh access/refresh pair for a subject. Each token carries its
    /// own jti.
    pub fn issue(&self, sub: &str, role: Role) -> Result<TokenPair, ApiError> {
        let now = now_secs();
        let access = self.sign(
            &Claims {
                sub: sub.to_string(),
                role,
                jti: Uuid::new_v4().to_string(),
                iat: now,
                exp: now + self.access_ttl,
            },
            &self.access_enc,
        )?;
        let refresh = self.sign(
            &Claims {
                sub: sub.to_string(),
                role,
                jti: Uuid::new_v4().to_string(),
                iat: now,
                exp: now + self.refresh_ttl,
            },
            &self.refresh_enc,
        )?;
        Ok(TokenPair::bearer(access, refresh))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, ApiError> {
        self.verify(token, &self.access_dec)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, ApiError> {
        self.verify(token, &self.refresh_dec)
    }

    /// Exchange a refresh token for a new pair. The presented token's jti is
    /// revoked first, so each refresh token works exactly once.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let claims = self.verify_refresh(refresh_token)?;
        self.revoked.revoke(claims.jti.clone(), claims.exp);
        self.issue(&claims.sub, claims.role)
    }

    /// Blacklist a token's jti until the token itself expires.
    pub fn revoke(&self, claims: &Claims) {
        self.revoked.revoke(claims.jti.clone(), claims.exp);
    }

    pub fn revocations(&self) -> &RevocationList {
        &self.revoked
    }

    fn sign(&self, claims: &Claims, key: &EncodingKey) -> Result<String, ApiError> {
        encode(&Header::default(), claims, key)
            .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
    }

    fn verify(&self, token: &str, key: &DecodingKey) -> Result<Claims, ApiError> {
        let data =
            decode::<Claims>(token, key, &self.validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::Unauthenticated("token expired".to_string())
                }
                _ => ApiError::Unauthenticated("invalid token".to_string()),
            })?;
        if self.revoked.is_revoked(&data.claims.jti) {
            return Err(ApiError::Unauthenticated("token revoked".to_string()));
        }
        Ok(data.claims)
    }
}
