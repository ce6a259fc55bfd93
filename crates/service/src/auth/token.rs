use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AccessError, TokenError};
use crate::domain::{Role, User};

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 bearer tokens over one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Token for a bare role with a fresh subject id.
    ///
    /// # Examples
    /// ```
    /// use service::auth::TokenService;
    /// use service::domain::Role;
    /// let tokens = TokenService::new("secret");
    /// let token = tokens.issue("moderator").unwrap();
    /// assert_eq!(tokens.validate(&token).unwrap().role, Role::Moderator);
    /// assert!(tokens.issue("admin").is_err());
    /// ```
    pub fn issue(&self, role: &str) -> Result<String, TokenError> {
        let role: Role = role.parse().map_err(|_| TokenError::UnknownRole(role.to_string()))?;
        self.sign(Uuid::new_v4().to_string(), role)
    }

    pub fn issue_for_user(&self, user: &User) -> Result<String, TokenError> {
        self.sign(user.id.to_string(), user.role)
    }

    fn sign(&self, sub: String, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims { sub, role, iat: now.timestamp(), exp: (now + self.ttl).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| TokenError::Encode(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::Tampered,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    pub fn check_role(&self, token: Option<&str>, role: Role) -> Result<Claims, AccessError> {
        self.check_role_any(token, &[role])
    }

    /// Unauthorized for a missing or invalid token, Forbidden when the token
    /// is valid but its role is not listed.
    pub fn check_role_any(&self, token: Option<&str>, roles: &[Role]) -> Result<Claims, AccessError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AccessError::Unauthorized("missing token".into()))?;
        let claims = self.validate(token)?;
        if roles.contains(&claims.role) {
            Ok(claims)
        } else {
            Err(AccessError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_validate_roles() {
        let svc = TokenService::new("secret");
        for role in Role::ALL {
            let token = svc.issue(role.as_str()).unwrap();
            let claims = svc.validate(&token).unwrap();
            assert_eq!(claims.role, role);
            assert!(Uuid::parse_str(&claims.sub).is_ok());
            assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_HOURS * 3600);
        }
    }

    #[test]
    fn unknown_role_cannot_be_issued() {
        let svc = TokenService::new("secret");
        assert_eq!(svc.issue("admin").unwrap_err(), TokenError::UnknownRole("admin".into()));
    }

    #[test]
    fn user_token_carries_user_id() {
        let svc = TokenService::new("secret");
        let user = User { id: Uuid::new_v4(), email: "e@x.io".into(), role: Role::Employee };
        let claims = svc.validate(&svc.issue_for_user(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, Role::Employee);
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService::new("secret").with_ttl(Duration::hours(-1));
        let token = svc.issue("employee").unwrap();
        assert_eq!(svc.validate(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn foreign_signature_is_tampered() {
        let token = TokenService::new("one").issue("employee").unwrap();
        assert_eq!(TokenService::new("two").validate(&token).unwrap_err(), TokenError::Tampered);
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = TokenService::new("secret");
        assert!(matches!(svc.validate("not-a-token"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn role_checks() {
        let svc = TokenService::new("secret");
        let employee = svc.issue("employee").unwrap();
        let moderator = svc.issue("moderator").unwrap();

        assert!(svc.check_role(Some(&employee), Role::Employee).is_ok());
        assert_eq!(svc.check_role(Some(&employee), Role::Moderator).unwrap_err(), AccessError::Forbidden);
        assert!(svc.check_role_any(Some(&moderator), &Role::ALL).is_ok());
        assert!(matches!(svc.check_role(None, Role::Employee), Err(AccessError::Unauthorized(_))));
        assert!(matches!(svc.check_role(Some("  "), Role::Employee), Err(AccessError::Unauthorized(_))));
        assert!(matches!(svc.check_role(Some("x.y.z"), Role::Employee), Err(AccessError::Unauthorized(_))));
    }
}
