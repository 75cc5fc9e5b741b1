//! Stateless issuing and validation of HS256-signed JWTs.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use model::entities::user::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::error::{Result, ServiceError};

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates tokens with a fixed secret and lifetimes.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs a short-lived access token.
    pub fn generate_token(&self, user_id: i32, username: &str, role: Role) -> Result<String> {
        self.sign(user_id, username, role, TokenKind::Access, self.access_ttl)
    }

    /// Signs a longer-lived refresh token.
    pub fn generate_refresh_token(
        &self,
        user_id: i32,
        username: &str,
        role: Role,
    ) -> Result<String> {
        self.sign(user_id, username, role, TokenKind::Refresh, self.refresh_ttl)
    }

    fn sign(
        &self,
        user_id: i32,
        username: &str,
        role: Role,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            role,
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, user_id, ?kind, "Failed to sign token");
            ServiceError::TokenIssuance(e.to_string())
        })
    }

    /// Verifies signature and expiry and returns the claims of any token kind.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::ExpiredToken,
                _ => {
                    debug!(error = %e, "Token rejected");
                    ServiceError::InvalidToken
                }
            })
    }

    /// Validates a token that must be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.kind != TokenKind::Access {
            warn!(user_id = claims.user_id, "Refresh token presented as access token");
            return Err(ServiceError::InvalidToken);
        }
        Ok(claims)
    }

    /// Issues a new access token for the identity in a valid refresh token.
    /// The refresh token itself is neither rotated nor revoked.
    #[instrument(skip_all)]
    pub fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.validate_token(refresh_token).map_err(|e| {
            warn!(error = %e, "Refresh token rejected");
            ServiceError::InvalidRefreshToken
        })?;

        if claims.kind != TokenKind::Refresh {
            warn!(user_id = claims.user_id, "Access token presented as refresh token");
            return Err(ServiceError::InvalidRefreshToken);
        }

        self.generate_token(claims.user_id, &claims.username, claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::minutes(15), Duration::hours(24))
    }

    #[test]
    fn test_access_token_claims() {
        let issuer = issuer();
        let token = issuer.generate_token(7, "alice", Role::Admin).unwrap();
        let claims = issuer.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issuer().generate_token(1, "bob", Role::User).unwrap();
        let other = TokenIssuer::new("other-secret", Duration::minutes(15), Duration::hours(24));

        assert!(matches!(
            other.validate_token(&token),
            Err(ServiceError::InvalidToken)
        ));
        assert!(matches!(
            other.validate_token("not.a.jwt"),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let expired = TokenIssuer::new("test-secret", Duration::hours(-2), Duration::hours(-2));
        let token = expired.generate_token(1, "bob", Role::User).unwrap();

        assert!(matches!(
            expired.validate_token(&token),
            Err(ServiceError::ExpiredToken)
        ));
    }

    #[test]
    fn test_refresh_issues_access_token_with_same_identity() {
        let issuer = issuer();
        let refresh = issuer.generate_refresh_token(3, "carol", Role::User).unwrap();

        let access = issuer.refresh(&refresh).unwrap();
        let claims = issuer.validate_access_token(&access).unwrap();
        assert_eq!(claims.user_id, 3);
        assert_eq!(claims.username, "carol");
        assert_eq!(claims.role, Role::User);

        // The refresh token stays usable.
        assert!(issuer.refresh(&refresh).is_ok());
    }

    #[test]
    fn test_refresh_rejects_access_tokens() {
        let issuer = issuer();
        let access = issuer.generate_token(3, "carol", Role::User).unwrap();

        assert!(matches!(
            issuer.refresh(&access),
            Err(ServiceError::InvalidRefreshToken)
        ));
        assert!(matches!(
            issuer.refresh("garbage"),
            Err(ServiceError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_refresh_token_does_not_authenticate() {
        let issuer = issuer();
        let refresh = issuer.generate_refresh_token(3, "carol", Role::User).unwrap();

        assert!(matches!(
            issuer.validate_access_token(&refresh),
            Err(ServiceError::InvalidToken)
        ));
    }
}
